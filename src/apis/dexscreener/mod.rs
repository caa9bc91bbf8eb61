/// DexScreener API client
///
/// Endpoint: `/latest/dex/tokens/{address}`, all pairs for one token across chains.
/// One pair is chosen as authoritative for the token's market data.
pub mod types;

pub use self::types::{DexPair, TokenPairsResponse};

use crate::apis::client::{ApiCategory, ApiFetcher};
use crate::apis::errors::ApiError;
use crate::config::ApisConfig;
use crate::tokens::types::MarketSnapshot;
use chrono::{TimeZone, Utc};
use std::sync::Arc;

const SOLANA_CHAIN_ID: &str = "solana";

pub struct DexScreenerClient {
    fetcher: Arc<ApiFetcher>,
    enabled: bool,
    base_url: String,
}

impl DexScreenerClient {
    pub fn new(fetcher: Arc<ApiFetcher>, config: &ApisConfig) -> Self {
        Self {
            fetcher,
            enabled: config.dexscreener_enabled,
            base_url: config.dexscreener_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn get_token_pairs(&self, address: &str) -> Result<Vec<DexPair>, ApiError> {
        if !self.enabled {
            return Err(ApiError::Disabled);
        }
        let url = format!("{}/latest/dex/tokens/{}", self.base_url, address);
        let response: TokenPairsResponse = self
            .fetcher
            .get_json(ApiCategory::DexScreener, &url, &[])
            .await?;
        Ok(response.pairs.unwrap_or_default())
    }

    /// Market snapshot from the chosen pair; `Ok(None)` when no pair qualifies
    pub async fn market_snapshot(&self, address: &str) -> Result<Option<MarketSnapshot>, ApiError> {
        let pairs = self.get_token_pairs(address).await?;
        Ok(select_pair(&pairs, address).map(snapshot_from_pair))
    }
}

/// Pick the authoritative pair for `address`
///
/// Only Solana pairs with the token as base qualify. Highest `liquidity.usd`
/// wins, then highest 24h volume, then the earliest pair in the response.
pub fn select_pair<'a>(pairs: &'a [DexPair], address: &str) -> Option<&'a DexPair> {
    let mut best: Option<&DexPair> = None;

    for pair in pairs
        .iter()
        .filter(|p| p.chain_id == SOLANA_CHAIN_ID && p.base_token.address == address)
    {
        best = match best {
            None => Some(pair),
            Some(current) => {
                let key = (
                    pair.liquidity_usd().unwrap_or(0.0),
                    pair.volume_h24().unwrap_or(0.0),
                );
                let current_key = (
                    current.liquidity_usd().unwrap_or(0.0),
                    current.volume_h24().unwrap_or(0.0),
                );
                if key > current_key {
                    Some(pair)
                } else {
                    Some(current)
                }
            }
        };
    }

    best
}

pub fn snapshot_from_pair(pair: &DexPair) -> MarketSnapshot {
    MarketSnapshot {
        pair_address: pair.pair_address.clone(),
        dex_id: pair.dex_id.clone(),
        price_usd: pair
            .price_usd
            .as_deref()
            .and_then(|p| p.parse::<f64>().ok())
            .filter(|p| p.is_finite()),
        market_cap: pair.market_cap.or(pair.fdv),
        liquidity_usd: pair.liquidity_usd(),
        volume_24h: pair.volume_h24(),
        price_change_24h: pair.price_change.as_ref().and_then(|c| c.h24),
        pair_created_at: pair
            .pair_created_at
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        base_symbol: pair.base_token.symbol.clone(),
        base_name: pair.base_token.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::client::test_support::{fast_fetcher, serve};
    use axum::routing::get;
    use axum::{Json, Router};
    use std::time::Duration;

    const MINT: &str = "7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr";

    fn pair(chain: &str, base: &str, pair_address: &str, liq: Option<f64>, vol: f64) -> DexPair {
        serde_json::from_value(serde_json::json!({
            "chainId": chain,
            "dexId": "raydium",
            "pairAddress": pair_address,
            "baseToken": {"address": base, "symbol": "POPCAT", "name": "Popcat"},
            "priceUsd": "0.5",
            "volume": {"h24": vol},
            "liquidity": liq.map(|usd| serde_json::json!({"usd": usd})),
            "fdv": 1000.0
        }))
        .unwrap()
    }

    #[test]
    fn test_select_highest_liquidity_solana_base_pair() {
        let pairs = vec![
            pair("solana", MINT, "A", Some(10_000.0), 1.0),
            pair("ethereum", MINT, "B", Some(1_000_000.0), 1.0),
            pair("solana", "OtherMint", "C", Some(500_000.0), 1.0),
            pair("solana", MINT, "D", Some(50_000.0), 1.0),
        ];
        assert_eq!(select_pair(&pairs, MINT).unwrap().pair_address, "D");
    }

    #[test]
    fn test_ties_break_by_volume_then_order() {
        let pairs = vec![
            pair("solana", MINT, "A", Some(1_000.0), 5.0),
            pair("solana", MINT, "B", Some(1_000.0), 9.0),
            pair("solana", MINT, "C", Some(1_000.0), 9.0),
        ];
        assert_eq!(select_pair(&pairs, MINT).unwrap().pair_address, "B");

        let no_liquidity = vec![
            pair("solana", MINT, "X", None, 0.0),
            pair("solana", MINT, "Y", None, 0.0),
        ];
        assert_eq!(select_pair(&no_liquidity, MINT).unwrap().pair_address, "X");
    }

    #[test]
    fn test_snapshot_market_cap_falls_back_to_fdv() {
        let snap = snapshot_from_pair(&pair("solana", MINT, "A", Some(1.0), 2.0));
        assert_eq!(snap.market_cap, Some(1000.0));
        assert_eq!(snap.price_usd, Some(0.5));
        assert_eq!(snap.base_symbol.as_deref(), Some("POPCAT"));
    }

    #[tokio::test]
    async fn test_null_pairs_yield_no_snapshot() {
        let router = Router::new().route(
            "/latest/dex/tokens/:address",
            get(|| async { Json(serde_json::json!({"schemaVersion": "1.0.0", "pairs": null})) }),
        );
        let base = serve(router).await;
        let config = ApisConfig {
            dexscreener_base_url: base,
            ..ApisConfig::default()
        };
        let client =
            DexScreenerClient::new(Arc::new(fast_fetcher(0, Duration::from_secs(5))), &config);

        assert_eq!(client.market_snapshot(MINT).await.unwrap(), None);
    }
}
