/// Generic in-memory cache with TTL and LRU eviction
///
/// Thread-safe, generic over key/value types, with hit/miss metrics.
use super::config::CacheConfig;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub inserts: u64,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    /// Front is least recently used
    order: VecDeque<K>,
    metrics: CacheMetrics,
}

impl<K: Eq + Clone, V> CacheState<K, V> {
    fn touch(&mut self, key: &K) {
        self.order.retain(|k| k != key);
        self.order.push_back(key.clone());
    }

    fn forget(&mut self, key: &K) {
        self.order.retain(|k| k != key);
    }
}

pub struct CacheManager<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    config: CacheConfig,
    state: Mutex<CacheState<K, V>>,
}

impl<K, V> CacheManager<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                order: VecDeque::new(),
                metrics: CacheMetrics::default(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<K, V>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Value for `key`, `None` if missing or expired
    pub fn get(&self, key: &K) -> Option<V> {
        let mut state = self.lock();

        let expired = match state.entries.get(key) {
            None => {
                state.metrics.misses += 1;
                return None;
            }
            Some(entry) => entry.inserted_at.elapsed() > self.config.ttl,
        };

        if expired {
            state.entries.remove(key);
            state.forget(key);
            state.metrics.misses += 1;
            state.metrics.expirations += 1;
            return None;
        }

        state.touch(key);
        state.metrics.hits += 1;
        state.entries.get(key).map(|e| e.value.clone())
    }

    /// Insert or replace, evicting the least recently used entry when full
    pub fn insert(&self, key: K, value: V) {
        let mut state = self.lock();

        if state.entries.len() >= self.config.capacity && !state.entries.contains_key(&key) {
            if let Some(lru) = state.order.pop_front() {
                state.entries.remove(&lru);
                state.metrics.evictions += 1;
            }
        }

        state.entries.insert(
            key.clone(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
        state.touch(&key);
        state.metrics.inserts += 1;
    }

    pub fn remove(&self, key: &K) {
        let mut state = self.lock();
        state.entries.remove(key);
        state.forget(key);
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.order.clear();
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.lock().metrics.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_lru_eviction_keeps_recently_used() {
        let cache: CacheManager<String, u32> =
            CacheManager::new(CacheConfig::new(Duration::from_secs(60), 2));
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        assert_eq!(cache.get(&"a".to_string()), Some(1));

        cache.insert("c".to_string(), 3);
        assert_eq!(cache.get(&"b".to_string()), None);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"c".to_string()), Some(3));
        assert_eq!(cache.metrics().evictions, 1);
    }

    #[test]
    fn test_expired_entries_are_misses() {
        let cache: CacheManager<&'static str, u32> =
            CacheManager::new(CacheConfig::new(Duration::from_millis(20), 10));
        cache.insert("k", 7);
        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(cache.get(&"k"), None);
        let metrics = cache.metrics();
        assert_eq!(metrics.expirations, 1);
        assert_eq!(metrics.hits, 0);
        assert!(cache.is_empty());
    }
}
