use crate::apis::ApiManager;
use crate::discovery::DiscoverySource;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Addresses from the cached Jupiter token list
pub struct JupiterListSource {
    apis: Arc<ApiManager>,
    limit: usize,
    pump_only: bool,
}

impl JupiterListSource {
    pub fn new(apis: Arc<ApiManager>, limit: usize, pump_only: bool) -> Self {
        Self {
            apis,
            limit,
            pump_only,
        }
    }
}

#[async_trait]
impl DiscoverySource for JupiterListSource {
    fn name(&self) -> &'static str {
        "jupiter"
    }

    fn is_enabled(&self) -> bool {
        self.apis.jupiter.is_enabled()
    }

    async fn discover(&self) -> Result<Vec<String>> {
        let list = self.apis.jupiter.token_list().await?;
        Ok(list
            .addresses()
            .iter()
            .filter(|address| !self.pump_only || address.ends_with("pump"))
            .take(self.limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::client::test_support::{fast_fetcher, serve};
    use crate::config::Config;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::time::Duration;

    async fn manager() -> Arc<ApiManager> {
        let router = Router::new().route(
            "/all",
            get(|| async {
                Json(serde_json::json!([
                    {"address": "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAApump", "symbol": "A", "decimals": 6},
                    {"address": "BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB", "symbol": "B", "decimals": 9},
                    {"address": "CCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCpump", "symbol": "C", "decimals": 6}
                ]))
            }),
        );
        let mut config = Config::default();
        config.apis.jupiter_token_list_url = format!("{}/all", serve(router).await);
        Arc::new(ApiManager::with_fetcher(
            Arc::new(fast_fetcher(0, Duration::from_secs(5))),
            &config,
        ))
    }

    #[tokio::test]
    async fn test_limit_applied() {
        let source = JupiterListSource::new(manager().await, 2, false);
        let found = source.discover().await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_pump_only_filter() {
        let source = JupiterListSource::new(manager().await, 10, true);
        let found = source.discover().await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|a| a.ends_with("pump")));
    }
}
