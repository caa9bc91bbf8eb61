/// Per-token enrichment: fan out to every source, then merge into one record
///
/// Fetching and merging are split so the merge stays a pure function of
/// `(address, snapshots, as_of)`.
use crate::apis::ApiManager;
use crate::config::{EnrichmentConfig, ScoringConfig};
use crate::logger::{self, LogTag};
use crate::tokens::holders::{parse_holder_sources, resolve_holder_count};
use crate::tokens::scoring::calculate_invest_score;
use crate::tokens::types::{
    BondingCurveStatus, EnrichmentSnapshots, HolderSnapshot, HolderSource, TokenRecord,
    UNKNOWN_SYMBOL,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// pump.fun launches end their mint address with this suffix
const PUMP_SUFFIX: &str = "pump";
const PUMPFUN_DEX_ID: &str = "pumpfun";

#[async_trait]
pub trait TokenEnricher: Send + Sync {
    /// Shared lookups for a whole batch, run once before any per-token timeout starts
    async fn prepare(&self) {}

    /// Enriched record, or an error message when no source had data
    async fn enrich(&self, address: &str) -> Result<TokenRecord, String>;
}

pub struct ApiEnricher {
    apis: Arc<ApiManager>,
    config: EnrichmentConfig,
    scoring: ScoringConfig,
    holder_order: Vec<HolderSource>,
}

impl ApiEnricher {
    pub fn new(apis: Arc<ApiManager>, config: EnrichmentConfig, scoring: ScoringConfig) -> Self {
        let holder_order = parse_holder_sources(&config.holder_sources)
            .into_iter()
            .filter(|s| *s != HolderSource::RugCheck)
            .collect();
        Self {
            apis,
            config,
            scoring,
            holder_order,
        }
    }

    /// Raw snapshots for one address, every failure mapped to `None`
    pub async fn fetch_snapshots(&self, address: &str) -> EnrichmentSnapshots {
        let metadata = self.apis.jupiter.metadata(address).await;
        let decimals = metadata
            .as_ref()
            .map(|m| m.decimals)
            .unwrap_or(self.config.default_decimals);

        let (market, quote, security, holders) = tokio::join!(
            self.apis.dexscreener.market_snapshot(address),
            self.apis
                .jupiter
                .quote_to_usdc(address, decimals, self.config.quote_notional_tokens),
            self.apis.rugcheck.security_snapshot(address),
            resolve_holder_count(&self.apis, &self.holder_order, address),
        );

        let market = match market {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log_source_error("dexscreener", address, &e.to_string());
                None
            }
        };
        let quote = quote
            .map_err(|e| log_source_error("jupiter_quote", address, &e.to_string()))
            .ok();
        let security = security
            .map_err(|e| log_source_error("rugcheck", address, &e.to_string()))
            .ok();

        EnrichmentSnapshots {
            metadata,
            market,
            quote,
            security,
            holders,
        }
    }
}

fn log_source_error(source: &str, address: &str, error: &str) {
    logger::debug(
        LogTag::Enrichment,
        &format!("{} returned no data for {}: {}", source, address, error),
    );
}

#[async_trait]
impl TokenEnricher for ApiEnricher {
    /// Load the Jupiter token list; per-token lookups only read the cache
    async fn prepare(&self) {
        if !self.apis.jupiter.is_enabled() {
            return;
        }
        if let Err(e) = self.apis.jupiter.token_list().await {
            logger::debug(
                LogTag::Enrichment,
                &format!("Enriching without Jupiter list metadata: {}", e),
            );
        }
    }

    async fn enrich(&self, address: &str) -> Result<TokenRecord, String> {
        let snapshots = self.fetch_snapshots(address).await;
        if !snapshots.has_network_data() {
            return Err(format!("No source returned data for {}", address));
        }
        Ok(merge_snapshots(address, &snapshots, Utc::now(), &self.scoring))
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Bonding curve status from the chosen pair's venue
///
/// `completed` is never derived here; it only comes from stored data.
pub fn derive_bonding_status(address: &str, dex_id: Option<&str>) -> Option<BondingCurveStatus> {
    match dex_id {
        Some(PUMPFUN_DEX_ID) => Some(BondingCurveStatus::Active),
        Some(_) if address.ends_with(PUMP_SUFFIX) => Some(BondingCurveStatus::Migrated),
        _ => None,
    }
}

/// Merge per-source snapshots into a scored record
///
/// `first_discovered_at` is set to `as_of`; storage keeps the original value
/// for rows that already exist.
pub fn merge_snapshots(
    address: &str,
    snapshots: &EnrichmentSnapshots,
    as_of: DateTime<Utc>,
    scoring: &ScoringConfig,
) -> TokenRecord {
    let metadata = snapshots.metadata.as_ref();
    let market = snapshots.market.as_ref();
    let quote = snapshots.quote.as_ref();
    let security = snapshots.security.as_ref();

    let symbol = non_empty(metadata.map(|m| m.symbol.as_str()))
        .or_else(|| non_empty(market.and_then(|m| m.base_symbol.as_deref())))
        .or_else(|| non_empty(security.and_then(|s| s.symbol.as_deref())))
        .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string());

    let name = non_empty(metadata.map(|m| m.name.as_str()))
        .or_else(|| non_empty(market.and_then(|m| m.base_name.as_deref())))
        .or_else(|| non_empty(security.and_then(|s| s.name.as_deref())));

    let holders = snapshots.holders.clone().or_else(|| {
        security
            .and_then(|s| s.total_holders)
            .map(|holders| HolderSnapshot {
                holders,
                source: HolderSource::RugCheck,
            })
    });

    let age_hours = market.and_then(|m| m.pair_created_at).map(|created| {
        let seconds = (as_of - created).num_seconds().max(0);
        seconds as f64 / 3600.0
    });

    let dex_id = market.map(|m| m.dex_id.clone());

    let mut record = TokenRecord {
        address: address.to_string(),
        symbol,
        name,
        decimals: metadata.map(|m| m.decimals),
        price_usdc: quote
            .and_then(|q| q.price_usdc())
            .or_else(|| market.and_then(|m| m.price_usd)),
        market_cap: market.and_then(|m| m.market_cap),
        liquidity_usd: market.and_then(|m| m.liquidity_usd),
        volume_24h: market.and_then(|m| m.volume_24h),
        price_change_24h: market.and_then(|m| m.price_change_24h),
        age_hours,
        rug_score: security.map(|s| s.rug_score),
        holders: holders.map(|h| h.holders),
        is_tradeable: quote.map(|q| q.is_tradeable()).unwrap_or(false),
        invest_score: None,
        bonding_curve_status: derive_bonding_status(address, dex_id.as_deref()),
        pair_address: market.map(|m| m.pair_address.clone()),
        dex_id,
        discovery_source: None,
        first_discovered_at: as_of,
        updated_at: Some(as_of),
    };

    record.invest_score = Some(calculate_invest_score(&record, scoring));
    record
}
