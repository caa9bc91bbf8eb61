/// API manager - one instance of every client sharing a single fetcher
///
/// Built explicitly from the configuration and passed to the services that
/// need it; nothing here is global.
use std::sync::Arc;

use crate::config::Config;
use crate::logger::{self, LogTag};

use super::birdeye::BirdeyeClient;
use super::client::{ApiCategory, ApiFetcher};
use super::dexscreener::DexScreenerClient;
use super::jupiter::JupiterClient;
use super::rugcheck::RugcheckClient;
use super::solana_rpc::SolanaRpcClient;
use super::solscan::SolscanClient;
use super::stats::ApiStats;

pub struct ApiManager {
    pub fetcher: Arc<ApiFetcher>,
    pub jupiter: JupiterClient,
    pub dexscreener: DexScreenerClient,
    pub rugcheck: RugcheckClient,
    pub solscan: SolscanClient,
    /// JSON-RPC against Helius, or the plain RPC endpoint without a key
    pub helius: SolanaRpcClient,
    pub birdeye: BirdeyeClient,
}

impl ApiManager {
    pub fn new(config: &Config) -> Result<Self, String> {
        let fetcher = Arc::new(ApiFetcher::new(&config.http)?);
        Ok(Self::with_fetcher(fetcher, config))
    }

    pub fn with_fetcher(fetcher: Arc<ApiFetcher>, config: &Config) -> Self {
        let apis = &config.apis;

        let manager = Self {
            jupiter: JupiterClient::new(fetcher.clone(), apis),
            dexscreener: DexScreenerClient::new(fetcher.clone(), apis),
            rugcheck: RugcheckClient::new(fetcher.clone(), apis),
            solscan: SolscanClient::new(fetcher.clone(), apis),
            helius: SolanaRpcClient::new(
                fetcher.clone(),
                apis.helius_rpc_url(),
                ApiCategory::Helius,
                apis.helius_enabled,
            ),
            birdeye: BirdeyeClient::new(fetcher.clone(), apis),
            fetcher,
        };

        logger::info(
            LogTag::Api,
            &format!(
                "API clients ready: jupiter={} dexscreener={} rugcheck={} solscan={} helius={} birdeye={}",
                manager.jupiter.is_enabled(),
                manager.dexscreener.is_enabled(),
                manager.rugcheck.is_enabled(),
                manager.solscan.is_enabled(),
                manager.helius.is_enabled(),
                manager.birdeye.is_enabled(),
            ),
        );
        manager
    }

    /// Request statistics per API, keyed by category name
    pub async fn get_all_stats(&self) -> Vec<(String, ApiStats)> {
        self.fetcher
            .all_stats()
            .await
            .into_iter()
            .map(|(category, stats)| (category.name().to_string(), stats))
            .collect()
    }
}
