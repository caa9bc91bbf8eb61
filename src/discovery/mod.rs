//! Token discovery: candidate mint addresses from every enabled source

pub mod sources;

use crate::apis::ApiManager;
use crate::config::Config;
use crate::logger::{self, LogTag};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

pub use sources::{BirdeyeSource, JupiterListSource, RpcLogSource};

#[async_trait]
pub trait DiscoverySource: Send + Sync {
    /// Stored as `discovery_source` on first sight
    fn name(&self) -> &'static str;

    fn is_enabled(&self) -> bool {
        true
    }

    async fn discover(&self) -> Result<Vec<String>>;
}

/// Base58 with a plausible public key length
pub fn is_plausible_mint(address: &str) -> bool {
    (32..=44).contains(&address.len())
        && address
            .chars()
            .all(|c| c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l'))
}

pub struct DiscoveryService {
    sources: Vec<Arc<dyn DiscoverySource>>,
}

impl DiscoveryService {
    pub fn new(sources: Vec<Arc<dyn DiscoverySource>>) -> Self {
        Self { sources }
    }

    /// Build the sources enabled in `config`
    ///
    /// Starts the log subscription task when `rpc_logs_enabled` is set, so
    /// this must run inside a tokio runtime.
    pub fn from_config(apis: Arc<ApiManager>, config: &Config) -> Self {
        let discovery = &config.discovery;
        let mut sources: Vec<Arc<dyn DiscoverySource>> = Vec::new();

        if discovery.jupiter_list_enabled {
            sources.push(Arc::new(JupiterListSource::new(
                apis.clone(),
                discovery.jupiter_list_limit,
                config.strategy.early_only,
            )));
        }
        if discovery.birdeye_enabled {
            sources.push(Arc::new(BirdeyeSource::new(
                apis.clone(),
                discovery.birdeye_page_size,
                discovery.birdeye_max_pages,
            )));
        }
        if discovery.rpc_logs_enabled {
            sources.push(Arc::new(RpcLogSource::spawn(
                config.apis.rpc_ws_url.clone(),
                apis,
                discovery.rpc_buffer_capacity,
                discovery.rpc_reconnect_max_secs,
            )));
        }

        Self::new(sources)
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Run every enabled source and return unique `(address, source)` pairs
    ///
    /// Source failures are logged and skipped. An address reported by several
    /// sources keeps the first source in registration order.
    pub async fn discover_all(&self) -> Vec<(String, String)> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut found = Vec::new();

        for source in &self.sources {
            if !source.is_enabled() {
                logger::debug(
                    LogTag::Discovery,
                    &format!("Source {} disabled, skipping", source.name()),
                );
                continue;
            }

            match source.discover().await {
                Ok(addresses) => {
                    let before = found.len();
                    for address in addresses {
                        if !is_plausible_mint(&address) {
                            logger::debug(
                                LogTag::Discovery,
                                &format!("Ignoring malformed address '{}' from {}", address, source.name()),
                            );
                            continue;
                        }
                        if seen.insert(address.clone()) {
                            found.push((address, source.name().to_string()));
                        }
                    }
                    logger::info(
                        LogTag::Discovery,
                        &format!("{}: {} new candidates", source.name(), found.len() - before),
                    );
                }
                Err(e) => logger::warning(
                    LogTag::Discovery,
                    &format!("Source {} failed: {}", source.name(), e),
                ),
            }
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINT_A: &str = "7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr";
    const MINT_B: &str = "EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm";

    struct StaticSource {
        name: &'static str,
        addresses: Vec<&'static str>,
        enabled: bool,
        fail: bool,
    }

    #[async_trait]
    impl DiscoverySource for StaticSource {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        async fn discover(&self) -> Result<Vec<String>> {
            if self.fail {
                anyhow::bail!("upstream unavailable");
            }
            Ok(self.addresses.iter().map(|s| s.to_string()).collect())
        }
    }

    fn source(name: &'static str, addresses: Vec<&'static str>) -> Arc<dyn DiscoverySource> {
        Arc::new(StaticSource {
            name,
            addresses,
            enabled: true,
            fail: false,
        })
    }

    #[test]
    fn test_plausible_mint() {
        assert!(is_plausible_mint(MINT_A));
        assert!(is_plausible_mint("So11111111111111111111111111111111111111112"));
        assert!(!is_plausible_mint("short"));
        assert!(!is_plausible_mint("0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl"));
    }

    #[tokio::test]
    async fn test_dedupes_first_source_wins() {
        let service = DiscoveryService::new(vec![
            source("jupiter", vec![MINT_A, MINT_A]),
            source("birdeye", vec![MINT_B, MINT_A, "not-a-mint"]),
        ]);

        let found = service.discover_all().await;
        assert_eq!(
            found,
            vec![
                (MINT_A.to_string(), "jupiter".to_string()),
                (MINT_B.to_string(), "birdeye".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_and_disabled_sources_are_skipped() {
        let service = DiscoveryService::new(vec![
            Arc::new(StaticSource {
                name: "broken",
                addresses: vec![MINT_A],
                enabled: true,
                fail: true,
            }),
            Arc::new(StaticSource {
                name: "off",
                addresses: vec![MINT_A],
                enabled: false,
                fail: false,
            }),
            source("ok", vec![MINT_B]),
        ]);

        let found = service.discover_all().await;
        assert_eq!(found, vec![(MINT_B.to_string(), "ok".to_string())]);
        assert_eq!(service.source_names(), vec!["broken", "off", "ok"]);
    }
}
