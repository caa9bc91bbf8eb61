/// Core token types: the canonical record and the per-source snapshots merged into it
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Symbol stored for addresses that have been discovered but not enriched
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

/// USDC mint (quote currency for tradability checks)
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

/// Wrapped SOL mint
pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

pub const USDC_DECIMALS: u8 = 6;

// ============================================================================
// BONDING CURVE STATUS
// ============================================================================

/// Where a launchpad token sits relative to its bonding curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BondingCurveStatus {
    /// Still trading on the pump.fun curve
    Active,
    /// Curve filled, not yet seen on an AMM
    Completed,
    /// Trading on an AMM after leaving the curve
    Migrated,
}

impl BondingCurveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BondingCurveStatus::Active => "active",
            BondingCurveStatus::Completed => "completed",
            BondingCurveStatus::Migrated => "migrated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Some(BondingCurveStatus::Active),
            "completed" => Some(BondingCurveStatus::Completed),
            "migrated" => Some(BondingCurveStatus::Migrated),
            _ => None,
        }
    }
}

// ============================================================================
// TOKEN RECORD - canonical row of the tokens table
// ============================================================================

/// One token as stored and served
///
/// A row exists as soon as the address is discovered; market fields stay
/// `None` and `symbol` stays `UNKNOWN` until the first enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub address: String,
    pub symbol: String,
    pub name: Option<String>,
    pub decimals: Option<u8>,

    pub price_usdc: Option<f64>,
    pub market_cap: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub volume_24h: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub age_hours: Option<f64>,

    /// 0-100, higher is safer
    pub rug_score: Option<f64>,
    pub holders: Option<u64>,
    pub is_tradeable: bool,
    pub invest_score: Option<f64>,
    pub bonding_curve_status: Option<BondingCurveStatus>,

    pub pair_address: Option<String>,
    pub dex_id: Option<String>,
    pub discovery_source: Option<String>,

    pub first_discovered_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TokenRecord {
    /// Freshly discovered, not yet enriched
    pub fn discovered(address: &str, source: Option<&str>, at: DateTime<Utc>) -> Self {
        Self {
            address: address.to_string(),
            symbol: UNKNOWN_SYMBOL.to_string(),
            name: None,
            decimals: None,
            price_usdc: None,
            market_cap: None,
            liquidity_usd: None,
            volume_24h: None,
            price_change_24h: None,
            age_hours: None,
            rug_score: None,
            holders: None,
            is_tradeable: false,
            invest_score: None,
            bonding_curve_status: None,
            pair_address: None,
            dex_id: None,
            discovery_source: source.map(|s| s.to_string()),
            first_discovered_at: at,
            updated_at: None,
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.updated_at.is_some()
    }
}

// ============================================================================
// PER-SOURCE SNAPSHOTS
// ============================================================================

/// Jupiter token list entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub tags: Vec<String>,
}

/// Market data from the chosen DexScreener pair
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub pair_address: String,
    pub dex_id: String,
    pub price_usd: Option<f64>,
    pub market_cap: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub volume_24h: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub pair_created_at: Option<DateTime<Utc>>,
    pub base_symbol: Option<String>,
    pub base_name: Option<String>,
}

/// Result of quoting the token into USDC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub in_amount: u64,
    pub out_amount: u64,
    pub notional_tokens: f64,
    pub price_impact_pct: Option<f64>,
}

impl QuoteSnapshot {
    pub fn is_tradeable(&self) -> bool {
        self.out_amount > 0
    }

    /// USDC received per whole token
    pub fn price_usdc(&self) -> Option<f64> {
        if !self.is_tradeable() || self.notional_tokens <= 0.0 {
            return None;
        }
        let usdc = self.out_amount as f64 / 10f64.powi(USDC_DECIMALS as i32);
        Some(usdc / self.notional_tokens)
    }
}

/// RugCheck report summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecuritySnapshot {
    /// 0-100, higher is safer
    pub rug_score: f64,
    pub total_holders: Option<u64>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub rugged: bool,
    pub risk_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HolderSource {
    Solscan,
    Helius,
    RugCheck,
}

impl HolderSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            HolderSource::Solscan => "solscan",
            HolderSource::Helius => "helius",
            HolderSource::RugCheck => "rugcheck",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solscan" => Some(HolderSource::Solscan),
            "helius" => Some(HolderSource::Helius),
            "rugcheck" => Some(HolderSource::RugCheck),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderSnapshot {
    pub holders: u64,
    pub source: HolderSource,
}

/// Everything gathered for one address during a pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentSnapshots {
    pub metadata: Option<TokenMetadata>,
    pub market: Option<MarketSnapshot>,
    pub quote: Option<QuoteSnapshot>,
    pub security: Option<SecuritySnapshot>,
    pub holders: Option<HolderSnapshot>,
}

impl EnrichmentSnapshots {
    /// At least one per-token network source answered
    ///
    /// The list metadata comes from a shared cache and does not count.
    pub fn has_network_data(&self) -> bool {
        self.market.is_some()
            || self.quote.is_some()
            || self.security.is_some()
            || self.holders.is_some()
    }
}
