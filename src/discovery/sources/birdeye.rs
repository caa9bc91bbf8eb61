use crate::apis::ApiManager;
use crate::discovery::DiscoverySource;
use crate::logger::{self, LogTag};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Top tokens by 24h volume from Birdeye, paged by offset
pub struct BirdeyeSource {
    apis: Arc<ApiManager>,
    page_size: usize,
    max_pages: usize,
}

impl BirdeyeSource {
    pub fn new(apis: Arc<ApiManager>, page_size: usize, max_pages: usize) -> Self {
        Self {
            apis,
            page_size: page_size.max(1),
            max_pages,
        }
    }
}

#[async_trait]
impl DiscoverySource for BirdeyeSource {
    fn name(&self) -> &'static str {
        "birdeye"
    }

    fn is_enabled(&self) -> bool {
        self.apis.birdeye.is_enabled()
    }

    async fn discover(&self) -> Result<Vec<String>> {
        let mut addresses = Vec::new();

        for page in 0..self.max_pages {
            let offset = page * self.page_size;
            let tokens = match self.apis.birdeye.token_list_page(offset, self.page_size).await {
                Ok(tokens) => tokens,
                // Keep what earlier pages returned
                Err(e) if page > 0 => {
                    logger::warning(
                        LogTag::Discovery,
                        &format!("Birdeye page at offset {} failed: {}", offset, e),
                    );
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            let last_page = tokens.len() < self.page_size;
            addresses.extend(tokens.into_iter().map(|t| t.address));
            if last_page {
                break;
            }
        }

        Ok(addresses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::client::test_support::{fast_fetcher, serve};
    use crate::config::Config;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::time::Duration;

    async fn manager(router: Router) -> Arc<ApiManager> {
        let mut config = Config::default();
        config.apis.birdeye_base_url = serve(router).await;
        config.apis.birdeye_api_key = Some("key".to_string());
        Arc::new(ApiManager::with_fetcher(
            Arc::new(fast_fetcher(0, Duration::from_secs(5))),
            &config,
        ))
    }

    fn page(offset: usize, count: usize) -> serde_json::Value {
        let tokens: Vec<_> = (0..count)
            .map(|i| serde_json::json!({"address": format!("Mint{}", offset + i)}))
            .collect();
        serde_json::json!({"success": true, "data": {"tokens": tokens}})
    }

    #[tokio::test]
    async fn test_paginates_until_short_page() {
        let router = Router::new().route(
            "/defi/tokenlist",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let offset: usize = params.get("offset").and_then(|o| o.parse().ok()).unwrap_or(0);
                let count = if offset == 0 { 2 } else { 1 };
                Json(page(offset, count))
            }),
        );
        let source = BirdeyeSource::new(manager(router).await, 2, 5);
        let found = source.discover().await.unwrap();
        assert_eq!(found, vec!["Mint0", "Mint1", "Mint2"]);
    }

    #[tokio::test]
    async fn test_later_page_failure_keeps_earlier_results() {
        let router = Router::new().route(
            "/defi/tokenlist",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let offset: usize = params.get("offset").and_then(|o| o.parse().ok()).unwrap_or(0);
                if offset == 0 {
                    Json(page(0, 2)).into_response()
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }),
        );
        let source = BirdeyeSource::new(manager(router).await, 2, 3);
        let found = source.discover().await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_first_page_failure_is_an_error() {
        let router = Router::new().route(
            "/defi/tokenlist",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let source = BirdeyeSource::new(manager(router).await, 2, 3);
        assert!(source.discover().await.is_err());
    }
}
