// Schema for the token store. Timestamps are Unix seconds.

pub const SCHEMA_STATEMENTS: &[&str] = &[
    // One row per discovered address, overwritten in place by enrichment
    r#"
    CREATE TABLE IF NOT EXISTS tokens (
        address TEXT PRIMARY KEY,
        symbol TEXT NOT NULL DEFAULT 'UNKNOWN',
        name TEXT,
        decimals INTEGER,
        price_usdc REAL,
        market_cap REAL,
        liquidity_usd REAL,
        volume_24h REAL,
        price_change_24h REAL,
        age_hours REAL,
        rug_score REAL,
        holders INTEGER,
        is_tradeable INTEGER NOT NULL DEFAULT 0,
        invest_score REAL,
        bonding_curve_status TEXT,
        pair_address TEXT,
        dex_id TEXT,
        discovery_source TEXT,
        first_discovered_at INTEGER NOT NULL,
        updated_at INTEGER
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_tokens_invest_score ON tokens(invest_score)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_tokens_updated_at ON tokens(updated_at)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_tokens_first_discovered ON tokens(first_discovered_at)
    "#,
    // Append-only snapshot per successful enrichment
    r#"
    CREATE TABLE IF NOT EXISTS token_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        address TEXT NOT NULL,
        price_usdc REAL,
        liquidity_usd REAL,
        volume_24h REAL,
        holders INTEGER,
        rug_score REAL,
        invest_score REAL,
        recorded_at INTEGER NOT NULL,
        FOREIGN KEY (address) REFERENCES tokens(address)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_history_address_time ON token_history(address, recorded_at)
    "#,
];
