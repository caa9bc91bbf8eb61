/// Solscan public API: holder count for a token
use crate::apis::client::{ApiCategory, ApiFetcher};
use crate::apis::errors::ApiError;
use crate::config::ApisConfig;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct HoldersResponse {
    #[serde(default)]
    total: Option<u64>,
}

pub struct SolscanClient {
    fetcher: Arc<ApiFetcher>,
    enabled: bool,
    base_url: String,
    api_key: Option<String>,
}

impl SolscanClient {
    pub fn new(fetcher: Arc<ApiFetcher>, config: &ApisConfig) -> Self {
        Self {
            fetcher,
            enabled: config.solscan_enabled,
            base_url: config.solscan_base_url.trim_end_matches('/').to_string(),
            api_key: config.solscan_api_key.clone().filter(|k| !k.is_empty()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Total holder count reported by `/token/holders`
    pub async fn holder_count(&self, mint: &str) -> Result<u64, ApiError> {
        if !self.enabled {
            return Err(ApiError::Disabled);
        }

        let url = format!("{}/token/holders", self.base_url);
        let query = [
            ("tokenAddress", mint.to_string()),
            ("offset", "0".to_string()),
            ("limit", "1".to_string()),
        ];
        let headers: Vec<(&str, String)> = self
            .api_key
            .iter()
            .map(|key| ("token", key.clone()))
            .collect();

        let response: HoldersResponse = self
            .fetcher
            .get_json_with_headers(ApiCategory::Solscan, &url, &query, &headers)
            .await?;

        response
            .total
            .ok_or_else(|| ApiError::InvalidResponse("Missing 'total' field".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::client::test_support::{fast_fetcher, serve};
    use axum::extract::Query;
    use axum::http::HeaderMap;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::time::Duration;

    #[tokio::test]
    async fn test_holder_total_and_key_header() {
        let router = Router::new().route(
            "/token/holders",
            get(
                |headers: HeaderMap, Query(params): Query<HashMap<String, String>>| async move {
                    let keyed = headers.get("token").is_some();
                    let total = if params.get("tokenAddress").map(String::as_str) == Some("Mint") && keyed {
                        1234
                    } else {
                        0
                    };
                    Json(serde_json::json!({"data": [], "total": total}))
                },
            ),
        );
        let config = ApisConfig {
            solscan_base_url: serve(router).await,
            solscan_api_key: Some("secret".to_string()),
            ..ApisConfig::default()
        };
        let client = SolscanClient::new(Arc::new(fast_fetcher(0, Duration::from_secs(5))), &config);

        assert_eq!(client.holder_count("Mint").await.unwrap(), 1234);
    }

    #[tokio::test]
    async fn test_missing_total_is_invalid() {
        let router = Router::new().route(
            "/token/holders",
            get(|| async { Json(serde_json::json!({"data": []})) }),
        );
        let config = ApisConfig {
            solscan_base_url: serve(router).await,
            ..ApisConfig::default()
        };
        let client = SolscanClient::new(Arc::new(fast_fetcher(0, Duration::from_secs(5))), &config);

        assert!(matches!(
            client.holder_count("Mint").await,
            Err(ApiError::InvalidResponse(_))
        ));
    }
}
