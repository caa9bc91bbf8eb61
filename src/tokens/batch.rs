/// Batch coordinator: enrich many addresses concurrently, store once
///
/// Each address runs under its own timeout with at most `concurrency` in
/// flight. Failures and timeouts are logged and skipped; every success of
/// the batch is handed to the store in a single write.
use crate::config::EnrichmentConfig;
use crate::logger::{self, LogTag};
use crate::tokens::enrichment::TokenEnricher;
use crate::tokens::types::TokenRecord;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Destination of enriched records
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist one batch atomically; returns the number of rows written
    async fn store_enriched(&self, records: Vec<TokenRecord>) -> Result<usize, String>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub enriched: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub stored: usize,
    pub elapsed_ms: u64,
}

enum Outcome {
    Enriched(TokenRecord),
    Failed(String, String),
    TimedOut(String),
}

pub struct BatchCoordinator {
    enricher: Arc<dyn TokenEnricher>,
    store: Arc<dyn TokenStore>,
    concurrency: usize,
    per_token_timeout: Duration,
}

impl BatchCoordinator {
    pub fn new(
        enricher: Arc<dyn TokenEnricher>,
        store: Arc<dyn TokenStore>,
        concurrency: usize,
        per_token_timeout: Duration,
    ) -> Self {
        Self {
            enricher,
            store,
            concurrency: concurrency.max(1),
            per_token_timeout,
        }
    }

    pub fn from_config(
        enricher: Arc<dyn TokenEnricher>,
        store: Arc<dyn TokenStore>,
        config: &EnrichmentConfig,
    ) -> Self {
        Self::new(
            enricher,
            store,
            config.concurrency,
            Duration::from_secs(config.per_token_timeout_secs),
        )
    }

    /// Enrich `addresses` and store the successes; never returns an error
    pub async fn run_batch(&self, addresses: Vec<String>) -> BatchReport {
        let started = Instant::now();
        let mut report = BatchReport {
            attempted: addresses.len(),
            ..BatchReport::default()
        };

        if addresses.is_empty() {
            return report;
        }

        self.enricher.prepare().await;

        let outcomes: Vec<Outcome> = stream::iter(addresses)
            .map(|address| {
                let enricher = self.enricher.clone();
                let limit = self.per_token_timeout;
                async move {
                    match tokio::time::timeout(limit, enricher.enrich(&address)).await {
                        Ok(Ok(record)) => Outcome::Enriched(record),
                        Ok(Err(reason)) => Outcome::Failed(address, reason),
                        Err(_) => Outcome::TimedOut(address),
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut records = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Outcome::Enriched(record) => {
                    logger::log_token_enriched(&record);
                    records.push(record);
                }
                Outcome::Failed(address, reason) => {
                    report.failed += 1;
                    logger::debug(
                        LogTag::Enrichment,
                        &format!("Enrichment failed for {}: {}", address, reason),
                    );
                }
                Outcome::TimedOut(address) => {
                    report.timed_out += 1;
                    logger::warning(
                        LogTag::Enrichment,
                        &format!(
                            "Enrichment timed out for {} after {}s",
                            address,
                            self.per_token_timeout.as_secs_f64()
                        ),
                    );
                }
            }
        }
        report.enriched = records.len();

        if !records.is_empty() {
            match self.store.store_enriched(records).await {
                Ok(written) => report.stored = written,
                Err(e) => logger::error(
                    LogTag::Database,
                    &format!("Batch write of {} records failed: {}", report.enriched, e),
                ),
            }
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        logger::info(
            LogTag::Enrichment,
            &format!(
                "Batch done: {} attempted, {} enriched, {} failed, {} timed out, {} stored in {}ms",
                report.attempted,
                report.enriched,
                report.failed,
                report.timed_out,
                report.stored,
                report.elapsed_ms
            ),
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct MockEnricher {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockEnricher {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TokenEnricher for MockEnricher {
        async fn enrich(&self, address: &str) -> Result<TokenRecord, String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = if address.starts_with("slow") { 500 } else { 20 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if address.starts_with("fail") {
                return Err("no data".to_string());
            }
            let mut record = TokenRecord::discovered(address, None, Utc::now());
            record.updated_at = Some(Utc::now());
            Ok(record)
        }
    }

    #[derive(Default)]
    struct MockStore {
        writes: Mutex<Vec<Vec<TokenRecord>>>,
        fail: bool,
    }

    #[async_trait]
    impl TokenStore for MockStore {
        async fn store_enriched(&self, records: Vec<TokenRecord>) -> Result<usize, String> {
            if self.fail {
                return Err("database is locked".to_string());
            }
            let n = records.len();
            self.writes.lock().await.push(records);
            Ok(n)
        }
    }

    fn addresses(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_all_failures_write_nothing() {
        let store = Arc::new(MockStore::default());
        let coordinator = BatchCoordinator::new(
            Arc::new(MockEnricher::new()),
            store.clone(),
            4,
            Duration::from_secs(1),
        );

        let report = coordinator
            .run_batch(addresses(&["fail1", "fail2", "fail3"]))
            .await;
        assert_eq!(report.failed, 3);
        assert_eq!(report.enriched, 0);
        assert!(store.writes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_successes_stored_in_one_write() {
        let store = Arc::new(MockStore::default());
        let coordinator = BatchCoordinator::new(
            Arc::new(MockEnricher::new()),
            store.clone(),
            4,
            Duration::from_millis(200),
        );

        let report = coordinator
            .run_batch(addresses(&["ok1", "fail1", "slow1", "ok2"]))
            .await;
        assert_eq!(report.attempted, 4);
        assert_eq!(report.enriched, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.timed_out, 1);
        assert_eq!(report.stored, 2);

        let writes = store.writes.lock().await;
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].len(), 2);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let enricher = Arc::new(MockEnricher::new());
        let coordinator = BatchCoordinator::new(
            enricher.clone(),
            Arc::new(MockStore::default()),
            3,
            Duration::from_secs(1),
        );

        let many: Vec<String> = (0..12).map(|i| format!("ok{}", i)).collect();
        let report = coordinator.run_batch(many).await;
        assert_eq!(report.enriched, 12);
        assert!(enricher.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_store_error_does_not_escape() {
        let store = Arc::new(MockStore {
            fail: true,
            ..MockStore::default()
        });
        let coordinator = BatchCoordinator::new(
            Arc::new(MockEnricher::new()),
            store,
            2,
            Duration::from_secs(1),
        );

        let report = coordinator.run_batch(addresses(&["ok1"])).await;
        assert_eq!(report.enriched, 1);
        assert_eq!(report.stored, 0);
    }
}
