/// Configuration schemas - every section defined once with its defaults
///
/// Each section is declared with `config_struct!`, so a partial TOML file
/// falls back to the defaults below for anything it omits.
use crate::config_struct;

// ============================================================================
// DATABASE
// ============================================================================

config_struct! {
    /// SQLite storage settings
    pub struct DatabaseConfig {
        path: String = "data/tokens.db".to_string(),
        busy_timeout_ms: u64 = 5_000,
        /// Pending batches the writer task will queue before senders wait
        writer_queue_capacity: usize = 64,
    }
}

// ============================================================================
// HTTP / RATE LIMITING
// ============================================================================

config_struct! {
    /// Shared fetch helper settings
    pub struct HttpConfig {
        /// Global cap on in-flight requests across every API
        max_concurrent_requests: usize = 20,
        request_timeout_secs: u64 = 10,
        max_retries: u32 = 2,
        backoff_base_ms: u64 = 2_000,
        backoff_jitter_ms: u64 = 3_000,
        user_agent: String = "tokenscout/0.1".to_string(),

        // Minimum delay between request starts, per API
        jupiter_delay_ms: u64 = 200,
        jupiter_quote_delay_ms: u64 = 200,
        dexscreener_delay_ms: u64 = 500,
        rugcheck_delay_ms: u64 = 800,
        solscan_delay_ms: u64 = 500,
        helius_delay_ms: u64 = 100,
        birdeye_delay_ms: u64 = 1_000,
    }
}

// ============================================================================
// EXTERNAL APIS
// ============================================================================

config_struct! {
    /// Endpoints, keys and per-API switches
    pub struct ApisConfig {
        jupiter_enabled: bool = true,
        jupiter_token_list_url: String = "https://token.jup.ag/all".to_string(),
        jupiter_quote_url: String = "https://quote-api.jup.ag/v6/quote".to_string(),
        token_list_ttl_secs: u64 = 3_600,
        quote_slippage_bps: u32 = 50,

        dexscreener_enabled: bool = true,
        dexscreener_base_url: String = "https://api.dexscreener.com".to_string(),

        rugcheck_enabled: bool = true,
        rugcheck_base_url: String = "https://api.rugcheck.xyz".to_string(),
        rugcheck_cache_ttl_secs: u64 = 1_800,
        rugcheck_cache_capacity: usize = 5_000,

        solscan_enabled: bool = true,
        solscan_base_url: String = "https://public-api.solscan.io".to_string(),
        solscan_api_key: Option<String> = None,

        helius_enabled: bool = true,
        helius_api_key: Option<String> = None,

        birdeye_base_url: String = "https://public-api.birdeye.so".to_string(),
        birdeye_api_key: Option<String> = None,

        rpc_url: String = "https://api.mainnet-beta.solana.com".to_string(),
        rpc_ws_url: String = "wss://api.mainnet-beta.solana.com".to_string(),
    }
}

impl ApisConfig {
    /// JSON-RPC endpoint used for Helius calls
    ///
    /// With a key the Helius mainnet endpoint is used, otherwise `rpc_url`.
    pub fn helius_rpc_url(&self) -> String {
        match self.helius_api_key.as_deref() {
            Some(key) if !key.is_empty() => {
                format!("https://mainnet.helius-rpc.com/?api-key={}", key)
            }
            _ => self.rpc_url.clone(),
        }
    }
}

// ============================================================================
// DISCOVERY
// ============================================================================

config_struct! {
    /// Candidate address sources
    pub struct DiscoveryConfig {
        jupiter_list_enabled: bool = true,
        jupiter_list_limit: usize = 200,
        birdeye_enabled: bool = true,
        birdeye_page_size: usize = 50,
        birdeye_max_pages: usize = 2,
        rpc_logs_enabled: bool = false,
        /// Mints buffered by the log subscription between passes
        rpc_buffer_capacity: usize = 1_000,
        rpc_reconnect_max_secs: u64 = 60,
    }
}

// ============================================================================
// ENRICHMENT
// ============================================================================

config_struct! {
    /// Per-token enrichment and batch coordination
    pub struct EnrichmentConfig {
        concurrency: usize = 10,
        per_token_timeout_secs: u64 = 12,
        /// Whole tokens quoted into USDC to probe tradability
        quote_notional_tokens: f64 = 1.0,
        default_decimals: u8 = 6,
        holder_sources: Vec<String> = vec!["solscan".to_string(), "helius".to_string()],
    }
}

// ============================================================================
// SCORING
// ============================================================================

config_struct! {
    /// Invest score weights and reference scales
    pub struct ScoringConfig {
        risk_weight: f64 = 0.35,
        momentum_weight: f64 = 0.25,
        liquidity_weight: f64 = 0.15,
        holders_weight: f64 = 0.15,
        volume_reference_usd: f64 = 50_000.0,
        liquidity_reference_usd: f64 = 100_000.0,
        holders_reference: f64 = 1_000.0,
        neutral_rug_score: f64 = 50.0,
    }
}

// ============================================================================
// STRATEGY
// ============================================================================

config_struct! {
    /// Selection toggles applied by the scanner
    pub struct StrategyConfig {
        /// Only pump.fun mints from the list and no re-enrichment past the age limit
        early_only: bool = false,
        early_max_age_hours: f64 = 24.0,
        /// Re-enrich fastest-growing holder counts first
        holders_growth: bool = false,
    }
}

// ============================================================================
// SCANNER
// ============================================================================

config_struct! {
    pub struct ScannerConfig {
        interval_secs: u64 = 300,
        batch_limit: usize = 50,
    }
}

// ============================================================================
// WEBSERVER
// ============================================================================

config_struct! {
    /// Read-only JSON API
    pub struct WebserverConfig {
        host: String = "127.0.0.1".to_string(),
        port: u16 = 8080,
        default_limit: usize = 50,
        max_limit: usize = 500,
    }
}

// ============================================================================
// ROOT
// ============================================================================

config_struct! {
    /// Root configuration, one field per `[section]` of config.toml
    pub struct Config {
        database: DatabaseConfig = DatabaseConfig::default(),
        http: HttpConfig = HttpConfig::default(),
        apis: ApisConfig = ApisConfig::default(),
        discovery: DiscoveryConfig = DiscoveryConfig::default(),
        enrichment: EnrichmentConfig = EnrichmentConfig::default(),
        scoring: ScoringConfig = ScoringConfig::default(),
        strategy: StrategyConfig = StrategyConfig::default(),
        scanner: ScannerConfig = ScannerConfig::default(),
        webserver: WebserverConfig = WebserverConfig::default(),
    }
}
