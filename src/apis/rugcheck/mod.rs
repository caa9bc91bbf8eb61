/// RugCheck API client
///
/// Endpoint: `/v1/tokens/{mint}/report`. Reports are reduced to a
/// `SecuritySnapshot` and cached per mint.
pub mod types;

pub use self::types::{RugcheckReport, RugcheckRisk};

use crate::apis::client::{ApiCategory, ApiFetcher};
use crate::apis::errors::ApiError;
use crate::cache::{CacheConfig, CacheManager};
use crate::config::ApisConfig;
use crate::logger::{self, LogTag};
use crate::tokens::types::SecuritySnapshot;
use std::sync::Arc;
use std::time::Duration;

/// Score used when a report carries no usable score at all
pub const NEUTRAL_RUG_SCORE: f64 = 50.0;

pub struct RugcheckClient {
    fetcher: Arc<ApiFetcher>,
    enabled: bool,
    base_url: String,
    cache: CacheManager<String, SecuritySnapshot>,
}

impl RugcheckClient {
    pub fn new(fetcher: Arc<ApiFetcher>, config: &ApisConfig) -> Self {
        let cache_config = CacheConfig::new(
            Duration::from_secs(config.rugcheck_cache_ttl_secs),
            config.rugcheck_cache_capacity,
        );
        Self {
            fetcher,
            enabled: config.rugcheck_enabled,
            base_url: config.rugcheck_base_url.trim_end_matches('/').to_string(),
            cache: CacheManager::new(cache_config),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn get_report(&self, mint: &str) -> Result<RugcheckReport, ApiError> {
        if !self.enabled {
            return Err(ApiError::Disabled);
        }
        let url = format!("{}/v1/tokens/{}/report", self.base_url, mint);
        self.fetcher
            .get_json(ApiCategory::RugCheck, &url, &[])
            .await
    }

    /// Security snapshot, served from the report cache when fresh
    pub async fn security_snapshot(&self, mint: &str) -> Result<SecuritySnapshot, ApiError> {
        let key = mint.to_string();
        if let Some(cached) = self.cache.get(&key) {
            logger::verbose(LogTag::Cache, &format!("RugCheck cache hit for {}", mint));
            return Ok(cached);
        }

        let report = self.get_report(mint).await?;
        let snapshot = snapshot_from_report(&report);
        self.cache.insert(key, snapshot.clone());
        Ok(snapshot)
    }

    pub fn cache_metrics(&self) -> crate::cache::CacheMetrics {
        self.cache.metrics()
    }
}

/// Safety score (0-100, higher is safer) from a report
///
/// Tiers, first match wins:
/// 1. `score_normalised`
/// 2. `100 - sum(risks[].score)` when a risks list is present
/// 3. raw `score`
/// 4. neutral 50
pub fn extract_rug_score(report: &RugcheckReport) -> f64 {
    if let Some(normalised) = report.score_normalised.filter(|s| s.is_finite()) {
        return normalised.clamp(0.0, 100.0);
    }

    if let Some(risks) = &report.risks {
        let total: f64 = risks
            .iter()
            .filter_map(|r| r.score)
            .filter(|s| s.is_finite())
            .sum();
        return (100.0 - total).clamp(0.0, 100.0);
    }

    if let Some(score) = report.score.filter(|s| s.is_finite()) {
        return score.clamp(0.0, 100.0);
    }

    NEUTRAL_RUG_SCORE
}

pub fn snapshot_from_report(report: &RugcheckReport) -> SecuritySnapshot {
    let meta = report.token_meta.as_ref();
    SecuritySnapshot {
        rug_score: extract_rug_score(report),
        total_holders: report
            .total_holders
            .filter(|h| *h >= 0)
            .map(|h| h as u64),
        symbol: meta
            .and_then(|m| m.symbol.clone())
            .filter(|s| !s.trim().is_empty()),
        name: meta
            .and_then(|m| m.name.clone())
            .filter(|s| !s.trim().is_empty()),
        rugged: report.rugged.unwrap_or(false),
        risk_count: report.risks.as_ref().map(|r| r.len()).unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::client::test_support::{fast_fetcher, serve};
    use axum::routing::get;
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn report(value: serde_json::Value) -> RugcheckReport {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalised_score_wins() {
        let r = report(serde_json::json!({
            "score": 9000,
            "score_normalised": 72,
            "risks": [{"name": "Mutable metadata", "score": 80}]
        }));
        assert_eq!(extract_rug_score(&r), 72.0);

        let high = report(serde_json::json!({"score_normalised": 140}));
        assert_eq!(extract_rug_score(&high), 100.0);
    }

    #[test]
    fn test_risks_sum_subtracted_from_100() {
        let r = report(serde_json::json!({"risks": [{"score": 30}, {"score": 10}]}));
        assert_eq!(extract_rug_score(&r), 60.0);

        let heavy = report(serde_json::json!({"risks": [{"score": 90}, {"score": 45}]}));
        assert_eq!(extract_rug_score(&heavy), 0.0);

        let empty = report(serde_json::json!({"risks": [], "score": 12}));
        assert_eq!(extract_rug_score(&empty), 100.0);
    }

    #[test]
    fn test_raw_score_then_neutral() {
        let raw = report(serde_json::json!({"score": 35}));
        assert_eq!(extract_rug_score(&raw), 35.0);

        let none = report(serde_json::json!({"mint": "abc"}));
        assert_eq!(extract_rug_score(&none), NEUTRAL_RUG_SCORE);
    }

    #[test]
    fn test_snapshot_fields() {
        let r = report(serde_json::json!({
            "tokenMeta": {"name": "Bonk", "symbol": "BONK"},
            "totalHolders": 812,
            "rugged": false,
            "risks": [{"score": 5}]
        }));
        let snap = snapshot_from_report(&r);
        assert_eq!(snap.total_holders, Some(812));
        assert_eq!(snap.symbol.as_deref(), Some("BONK"));
        assert_eq!(snap.risk_count, 1);
        assert_eq!(snap.rug_score, 95.0);
    }

    #[tokio::test]
    async fn test_reports_are_cached_per_mint() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/v1/tokens/:mint/report",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(serde_json::json!({"score_normalised": 80}))
                }
            }),
        );
        let config = ApisConfig {
            rugcheck_base_url: serve(router).await,
            ..ApisConfig::default()
        };
        let client = RugcheckClient::new(Arc::new(fast_fetcher(0, Duration::from_secs(5))), &config);

        assert_eq!(client.security_snapshot("MintA").await.unwrap().rug_score, 80.0);
        assert_eq!(client.security_snapshot("MintA").await.unwrap().rug_score, 80.0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        client.security_snapshot("MintB").await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(client.cache_metrics().hits, 1);
    }
}
