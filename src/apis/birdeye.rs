/// Birdeye public API: token list sorted by 24h volume
use crate::apis::client::{ApiCategory, ApiFetcher};
use crate::apis::errors::ApiError;
use crate::config::ApisConfig;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct TokenListResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<TokenListData>,
}

#[derive(Debug, Deserialize)]
struct TokenListData {
    #[serde(default)]
    tokens: Vec<BirdeyeToken>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BirdeyeToken {
    pub address: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, rename = "v24hUSD")]
    pub volume_24h_usd: Option<f64>,
    #[serde(default)]
    pub liquidity: Option<f64>,
}

pub struct BirdeyeClient {
    fetcher: Arc<ApiFetcher>,
    base_url: String,
    api_key: Option<String>,
}

impl BirdeyeClient {
    pub fn new(fetcher: Arc<ApiFetcher>, config: &ApisConfig) -> Self {
        Self {
            fetcher,
            base_url: config.birdeye_base_url.trim_end_matches('/').to_string(),
            api_key: config.birdeye_api_key.clone().filter(|k| !k.is_empty()),
        }
    }

    /// Requires an API key
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// One page of `/defi/tokenlist`, highest 24h volume first
    pub async fn token_list_page(&self, offset: usize, limit: usize) -> Result<Vec<BirdeyeToken>, ApiError> {
        let Some(api_key) = self.api_key.as_ref() else {
            return Err(ApiError::Disabled);
        };

        let url = format!("{}/defi/tokenlist", self.base_url);
        let query = [
            ("sort_by", "v24hUSD".to_string()),
            ("sort_type", "desc".to_string()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ];
        let headers = [("X-API-KEY", api_key.clone()), ("x-chain", "solana".to_string())];

        let response: TokenListResponse = self
            .fetcher
            .get_json_with_headers(ApiCategory::Birdeye, &url, &query, &headers)
            .await?;

        if !response.success {
            return Err(ApiError::InvalidResponse("Birdeye reported success=false".to_string()));
        }
        Ok(response.data.map(|d| d.tokens).unwrap_or_default())
    }
}
