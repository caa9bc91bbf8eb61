/// Cache sizing per use
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    /// Maximum entries before the least recently used one is evicted
    pub capacity: usize,
}

impl CacheConfig {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
        }
    }
}
