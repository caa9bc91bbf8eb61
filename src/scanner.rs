/// Scanner service: discover, record, select, enrich, store
///
/// Everything the pass needs is owned here and built once; there are no
/// global clients.
use crate::apis::{format_stats_summary, ApiManager};
use crate::config::{Config, ScannerConfig, StrategyConfig};
use crate::database::{DatabaseWriter, SelectionOptions, TokenDatabase};
use crate::discovery::DiscoveryService;
use crate::logger::{self, LogTag};
use crate::tokens::batch::{BatchCoordinator, BatchReport};
use crate::tokens::enrichment::ApiEnricher;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize)]
pub struct PassReport {
    pub discovered: usize,
    pub newly_recorded: usize,
    pub selected: usize,
    pub batch: BatchReport,
}

pub struct ScannerService {
    discovery: DiscoveryService,
    coordinator: BatchCoordinator,
    database: TokenDatabase,
    writer: DatabaseWriter,
    scanner: ScannerConfig,
    strategy: StrategyConfig,
    apis: Option<Arc<ApiManager>>,
}

impl ScannerService {
    pub fn new(
        discovery: DiscoveryService,
        coordinator: BatchCoordinator,
        database: TokenDatabase,
        writer: DatabaseWriter,
        scanner: ScannerConfig,
        strategy: StrategyConfig,
    ) -> Self {
        Self {
            discovery,
            coordinator,
            database,
            writer,
            scanner,
            strategy,
            apis: None,
        }
    }

    /// Log per-API request statistics after every pass
    pub fn with_api_stats(mut self, apis: Arc<ApiManager>) -> Self {
        self.apis = Some(apis);
        self
    }

    /// Wire the full pipeline from configuration
    pub fn from_config(config: &Config, database: TokenDatabase) -> Result<Self, String> {
        let apis = Arc::new(ApiManager::new(config)?);
        let writer = database.spawn_writer(config.database.writer_queue_capacity)?;
        let enricher = Arc::new(ApiEnricher::new(
            apis.clone(),
            config.enrichment.clone(),
            config.scoring.clone(),
        ));
        let coordinator =
            BatchCoordinator::from_config(enricher, Arc::new(writer.clone()), &config.enrichment);
        let discovery = DiscoveryService::from_config(apis.clone(), config);

        logger::info(
            LogTag::Scanner,
            &format!(
                "Scanner ready: sources={:?} batch_limit={} early_only={} holders_growth={}",
                discovery.source_names(),
                config.scanner.batch_limit,
                config.strategy.early_only,
                config.strategy.holders_growth
            ),
        );

        Ok(Self::new(
            discovery,
            coordinator,
            database,
            writer,
            config.scanner.clone(),
            config.strategy.clone(),
        )
        .with_api_stats(apis))
    }

    pub fn selection_options(&self) -> SelectionOptions {
        SelectionOptions {
            limit: self.scanner.batch_limit,
            max_age_hours: self
                .strategy
                .early_only
                .then_some(self.strategy.early_max_age_hours),
            holders_growth: self.strategy.holders_growth,
        }
    }

    /// One discover → enrich → store pass
    pub async fn run_pass(&self) -> Result<PassReport, String> {
        let mut report = PassReport::default();

        let found = self.discovery.discover_all().await;
        report.discovered = found.len();
        if !found.is_empty() {
            report.newly_recorded = self.writer.record_discovered(found, Utc::now()).await?;
        }

        let selected = self
            .database
            .select_for_enrichment(self.selection_options(), Utc::now())
            .await?;
        report.selected = selected.len();

        if selected.is_empty() {
            logger::info(LogTag::Scanner, "Nothing to enrich this pass");
            return Ok(report);
        }

        report.batch = self.coordinator.run_batch(selected).await;
        self.log_api_stats().await;

        logger::info(
            LogTag::Scanner,
            &format!(
                "Pass complete: {} discovered ({} new), {} selected, {} stored",
                report.discovered, report.newly_recorded, report.selected, report.batch.stored
            ),
        );
        Ok(report)
    }

    async fn log_api_stats(&self) {
        let Some(apis) = &self.apis else {
            return;
        };
        if let Some(summary) = format_stats_summary(&apis.get_all_stats().await) {
            logger::info(LogTag::Api, &format!("API stats: {}", summary));
        }
    }

    /// Enrich an explicit address list, recording unknown ones first
    pub async fn enrich_addresses(&self, addresses: Vec<String>) -> Result<BatchReport, String> {
        let pairs = addresses
            .iter()
            .map(|a| (a.clone(), "manual".to_string()))
            .collect();
        self.writer.record_discovered(pairs, Utc::now()).await?;
        Ok(self.coordinator.run_batch(addresses).await)
    }

    /// Repeat passes every `interval` until Ctrl-C
    pub async fn run_forever(&self, interval: Duration) {
        logger::info(
            LogTag::Scanner,
            &format!("Scanner loop started, interval {}s", interval.as_secs()),
        );

        loop {
            tokio::select! {
                result = self.run_pass() => {
                    if let Err(e) = result {
                        logger::error(LogTag::Scanner, &format!("Pass failed: {}", e));
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        logger::info(LogTag::Scanner, "Shutdown requested, scanner stopped");
    }
}
