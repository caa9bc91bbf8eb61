// Token store CRUD and read queries. All functions take a connection so the
// writer task and the readers share the same code.

use crate::tokens::types::{BondingCurveStatus, TokenRecord, UNKNOWN_SYMBOL};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use serde::Serialize;

/// Score at or above which a token counts as high-scoring in stats
pub const HIGH_SCORE_THRESHOLD: f64 = 60.0;

const TOKEN_COLUMNS: &str = "address, symbol, name, decimals, price_usdc, market_cap, \
    liquidity_usd, volume_24h, price_change_24h, age_hours, rug_score, holders, \
    is_tradeable, invest_score, bonding_curve_status, pair_address, dex_id, \
    discovery_source, first_discovered_at, updated_at";

fn ts(at: DateTime<Utc>) -> i64 {
    at.timestamp()
}

fn from_ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}

fn row_to_record(row: &Row) -> rusqlite::Result<TokenRecord> {
    let status: Option<String> = row.get(14)?;
    let holders: Option<i64> = row.get(11)?;
    let decimals: Option<i64> = row.get(3)?;
    let updated_at: Option<i64> = row.get(19)?;

    Ok(TokenRecord {
        address: row.get(0)?,
        symbol: row
            .get::<_, Option<String>>(1)?
            .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string()),
        name: row.get(2)?,
        decimals: decimals.and_then(|d| u8::try_from(d).ok()),
        price_usdc: row.get(4)?,
        market_cap: row.get(5)?,
        liquidity_usd: row.get(6)?,
        volume_24h: row.get(7)?,
        price_change_24h: row.get(8)?,
        age_hours: row.get(9)?,
        rug_score: row.get(10)?,
        holders: holders.and_then(|h| u64::try_from(h).ok()),
        is_tradeable: row.get::<_, i64>(12)? != 0,
        invest_score: row.get(13)?,
        bonding_curve_status: status.as_deref().and_then(BondingCurveStatus::parse),
        pair_address: row.get(15)?,
        dex_id: row.get(16)?,
        discovery_source: row.get(17)?,
        first_discovered_at: from_ts(row.get(18)?),
        updated_at: updated_at.map(from_ts),
    })
}

// ============================================================================
// WRITES
// ============================================================================

/// Record newly discovered addresses; existing rows are left untouched
///
/// Returns how many addresses were new.
pub fn insert_discovered(
    conn: &mut Connection,
    tokens: &[(String, String)],
    at: DateTime<Utc>,
) -> Result<usize, String> {
    let tx = conn
        .transaction()
        .map_err(|e| format!("Failed to begin transaction: {}", e))?;
    let mut inserted = 0;
    {
        let mut stmt = tx
            .prepare(
                "INSERT OR IGNORE INTO tokens (address, symbol, discovery_source, first_discovered_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(|e| format!("Failed to prepare discovery insert: {}", e))?;
        for (address, source) in tokens {
            inserted += stmt
                .execute(params![address, UNKNOWN_SYMBOL, source, ts(at)])
                .map_err(|e| format!("Failed to insert discovered token {}: {}", address, e))?;
        }
    }
    tx.commit()
        .map_err(|e| format!("Failed to commit discovery insert: {}", e))?;
    Ok(inserted)
}

/// Upsert enriched records and append their history rows, all in one transaction
///
/// `first_discovered_at` and `discovery_source` of existing rows are kept.
pub fn upsert_enriched(conn: &mut Connection, records: &[TokenRecord]) -> Result<usize, String> {
    let tx = conn
        .transaction()
        .map_err(|e| format!("Failed to begin transaction: {}", e))?;
    {
        let mut upsert = tx
            .prepare(
                r#"
                INSERT INTO tokens (
                    address, symbol, name, decimals, price_usdc, market_cap,
                    liquidity_usd, volume_24h, price_change_24h, age_hours, rug_score,
                    holders, is_tradeable, invest_score, bonding_curve_status,
                    pair_address, dex_id, discovery_source, first_discovered_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
                ON CONFLICT(address) DO UPDATE SET
                    symbol = excluded.symbol,
                    name = excluded.name,
                    decimals = excluded.decimals,
                    price_usdc = excluded.price_usdc,
                    market_cap = excluded.market_cap,
                    liquidity_usd = excluded.liquidity_usd,
                    volume_24h = excluded.volume_24h,
                    price_change_24h = excluded.price_change_24h,
                    age_hours = excluded.age_hours,
                    rug_score = excluded.rug_score,
                    holders = excluded.holders,
                    is_tradeable = excluded.is_tradeable,
                    invest_score = excluded.invest_score,
                    bonding_curve_status = excluded.bonding_curve_status,
                    pair_address = excluded.pair_address,
                    dex_id = excluded.dex_id,
                    discovery_source = COALESCE(tokens.discovery_source, excluded.discovery_source),
                    updated_at = excluded.updated_at
                "#,
            )
            .map_err(|e| format!("Failed to prepare token upsert: {}", e))?;

        let mut history = tx
            .prepare(
                "INSERT INTO token_history (address, price_usdc, liquidity_usd, volume_24h,
                    holders, rug_score, invest_score, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .map_err(|e| format!("Failed to prepare history insert: {}", e))?;

        for record in records {
            let updated_at = record.updated_at.unwrap_or_else(Utc::now);
            let holders = record.holders.map(|h| i64::try_from(h).unwrap_or(i64::MAX));

            upsert
                .execute(params![
                    record.address,
                    record.symbol,
                    record.name,
                    record.decimals,
                    record.price_usdc,
                    record.market_cap,
                    record.liquidity_usd,
                    record.volume_24h,
                    record.price_change_24h,
                    record.age_hours,
                    record.rug_score,
                    holders,
                    record.is_tradeable,
                    record.invest_score,
                    record.bonding_curve_status.map(|s| s.as_str()),
                    record.pair_address,
                    record.dex_id,
                    record.discovery_source,
                    ts(record.first_discovered_at),
                    ts(updated_at),
                ])
                .map_err(|e| format!("Failed to upsert token {}: {}", record.address, e))?;

            history
                .execute(params![
                    record.address,
                    record.price_usdc,
                    record.liquidity_usd,
                    record.volume_24h,
                    holders,
                    record.rug_score,
                    record.invest_score,
                    ts(updated_at),
                ])
                .map_err(|e| format!("Failed to record history for {}: {}", record.address, e))?;
        }
    }
    tx.commit()
        .map_err(|e| format!("Failed to commit enrichment batch: {}", e))?;
    Ok(records.len())
}

// ============================================================================
// SELECTION FOR ENRICHMENT
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct SelectionOptions {
    pub limit: usize,
    /// Skip re-enrichment of tokens whose current age exceeds this many hours
    pub max_age_hours: Option<f64>,
    /// Order stale tokens by recent holder growth instead of staleness
    pub holders_growth: bool,
}

/// Addresses due for enrichment: never-enriched first (newest discoveries
/// first), then already-enriched ones
pub fn select_for_enrichment(
    conn: &Connection,
    options: &SelectionOptions,
    now: DateTime<Utc>,
) -> Result<Vec<String>, String> {
    if options.limit == 0 {
        return Ok(Vec::new());
    }

    let mut addresses: Vec<String> = {
        let mut stmt = conn
            .prepare(
                "SELECT address FROM tokens WHERE updated_at IS NULL
                 ORDER BY first_discovered_at DESC, address ASC LIMIT ?1",
            )
            .map_err(|e| format!("Failed to prepare selection: {}", e))?;
        let rows = stmt
            .query_map(params![options.limit as i64], |row| row.get(0))
            .map_err(|e| format!("Failed to select unenriched tokens: {}", e))?;
        rows.collect::<Result<_, _>>()
            .map_err(|e| format!("Failed to read unenriched tokens: {}", e))?
    };

    let remaining = options.limit.saturating_sub(addresses.len());
    if remaining == 0 {
        return Ok(addresses);
    }

    let now_secs = ts(now);
    let growth_since = now_secs - 24 * 3600;
    let limit = remaining as i64;
    let mut bindings: Vec<(&str, &dyn ToSql)> = vec![(":limit", &limit)];

    let mut sql = String::from("SELECT t.address FROM tokens t WHERE t.updated_at IS NOT NULL");
    if let Some(max_age) = options.max_age_hours.as_ref() {
        // Current age = age at last enrichment + hours since then
        sql.push_str(
            " AND (t.age_hours IS NULL OR t.age_hours + (:now - t.updated_at) / 3600.0 <= :max_age)",
        );
        bindings.push((":now", &now_secs));
        bindings.push((":max_age", max_age));
    }

    if options.holders_growth {
        sql.push_str(
            r#" ORDER BY COALESCE((
                  SELECT h.holders FROM token_history h
                  WHERE h.address = t.address AND h.holders IS NOT NULL
                  ORDER BY h.recorded_at DESC, h.id DESC LIMIT 1
               ) - (
                  SELECT h.holders FROM token_history h
                  WHERE h.address = t.address AND h.holders IS NOT NULL AND h.recorded_at >= :since
                  ORDER BY h.recorded_at ASC, h.id ASC LIMIT 1
               ), 0) DESC, t.updated_at ASC, t.address ASC"#,
        );
        bindings.push((":since", &growth_since));
    } else {
        sql.push_str(" ORDER BY t.updated_at ASC, t.address ASC");
    }
    sql.push_str(" LIMIT :limit");

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| format!("Failed to prepare stale selection: {}", e))?;
    let rows = stmt
        .query_map(bindings.as_slice(), |row| row.get::<_, String>(0))
        .map_err(|e| format!("Failed to select stale tokens: {}", e))?;
    for row in rows {
        addresses.push(row.map_err(|e| format!("Failed to read stale token: {}", e))?);
    }

    Ok(addresses)
}

// ============================================================================
// READ QUERIES
// ============================================================================

pub fn get_token(conn: &Connection, address: &str) -> Result<Option<TokenRecord>, String> {
    conn.query_row(
        &format!("SELECT {} FROM tokens WHERE address = ?1", TOKEN_COLUMNS),
        params![address],
        row_to_record,
    )
    .optional()
    .map_err(|e| format!("Failed to load token {}: {}", address, e))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrder {
    Score,
    Newest,
    Volume,
    Liquidity,
    Updated,
}

impl TokenOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "score" | "invest_score" => Some(TokenOrder::Score),
            "newest" | "new" | "first_discovered_at" => Some(TokenOrder::Newest),
            "volume" | "volume_24h" => Some(TokenOrder::Volume),
            "liquidity" | "liquidity_usd" => Some(TokenOrder::Liquidity),
            "updated" | "updated_at" => Some(TokenOrder::Updated),
            _ => None,
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            TokenOrder::Score => "invest_score IS NULL, invest_score DESC",
            TokenOrder::Newest => "first_discovered_at DESC",
            TokenOrder::Volume => "volume_24h IS NULL, volume_24h DESC",
            TokenOrder::Liquidity => "liquidity_usd IS NULL, liquidity_usd DESC",
            TokenOrder::Updated => "updated_at IS NULL, updated_at DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenQuery {
    pub limit: usize,
    pub min_score: Option<f64>,
    pub tradeable_only: bool,
    pub order: TokenOrder,
}

impl Default for TokenQuery {
    fn default() -> Self {
        Self {
            limit: 50,
            min_score: None,
            tradeable_only: false,
            order: TokenOrder::Score,
        }
    }
}

pub fn list_tokens(conn: &Connection, query: &TokenQuery) -> Result<Vec<TokenRecord>, String> {
    let sql = format!(
        "SELECT {} FROM tokens
         WHERE (?1 IS NULL OR invest_score >= ?1)
           AND (?2 = 0 OR is_tradeable = 1)
         ORDER BY {}, address ASC
         LIMIT ?3",
        TOKEN_COLUMNS,
        query.order.sql()
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| format!("Failed to prepare token list: {}", e))?;
    let rows = stmt
        .query_map(
            params![query.min_score, query.tradeable_only, query.limit as i64],
            row_to_record,
        )
        .map_err(|e| format!("Failed to list tokens: {}", e))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("Failed to read token row: {}", e))
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DatabaseStats {
    pub total_tokens: u64,
    pub enriched_tokens: u64,
    pub tradeable_tokens: u64,
    pub high_score_tokens: u64,
    pub average_invest_score: Option<f64>,
    pub average_rug_score: Option<f64>,
    pub history_rows: u64,
    pub last_updated_at: Option<DateTime<Utc>>,
}

pub fn get_stats(conn: &Connection) -> Result<DatabaseStats, String> {
    let mut stats = conn
        .query_row(
            "SELECT COUNT(*),
                    COUNT(updated_at),
                    COALESCE(SUM(is_tradeable), 0),
                    COALESCE(SUM(CASE WHEN invest_score >= ?1 THEN 1 ELSE 0 END), 0),
                    AVG(invest_score),
                    AVG(rug_score),
                    MAX(updated_at)
             FROM tokens",
            params![HIGH_SCORE_THRESHOLD],
            |row| {
                Ok(DatabaseStats {
                    total_tokens: row.get::<_, i64>(0)? as u64,
                    enriched_tokens: row.get::<_, i64>(1)? as u64,
                    tradeable_tokens: row.get::<_, i64>(2)? as u64,
                    high_score_tokens: row.get::<_, i64>(3)? as u64,
                    average_invest_score: row.get(4)?,
                    average_rug_score: row.get(5)?,
                    history_rows: 0,
                    last_updated_at: row.get::<_, Option<i64>>(6)?.map(from_ts),
                })
            },
        )
        .map_err(|e| format!("Failed to compute stats: {}", e))?;

    stats.history_rows = conn
        .query_row("SELECT COUNT(*) FROM token_history", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(|e| format!("Failed to count history: {}", e))? as u64;

    Ok(stats)
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub stats: DatabaseStats,
    pub top_tokens: Vec<TokenRecord>,
    pub newest_tokens: Vec<TokenRecord>,
    pub bonding_curve: Vec<StatusCount>,
}

pub fn dashboard_data(conn: &Connection, top_n: usize) -> Result<DashboardData, String> {
    let stats = get_stats(conn)?;
    let top_tokens = list_tokens(
        conn,
        &TokenQuery {
            limit: top_n,
            order: TokenOrder::Score,
            ..TokenQuery::default()
        },
    )?;
    let newest_tokens = list_tokens(
        conn,
        &TokenQuery {
            limit: top_n,
            order: TokenOrder::Newest,
            ..TokenQuery::default()
        },
    )?;

    let mut stmt = conn
        .prepare(
            "SELECT COALESCE(bonding_curve_status, 'unknown'), COUNT(*) FROM tokens
             GROUP BY 1 ORDER BY 2 DESC, 1 ASC",
        )
        .map_err(|e| format!("Failed to prepare status counts: {}", e))?;
    let bonding_curve = stmt
        .query_map([], |row| {
            Ok(StatusCount {
                status: row.get(0)?,
                count: row.get::<_, i64>(1)? as u64,
            })
        })
        .map_err(|e| format!("Failed to count statuses: {}", e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("Failed to read status count: {}", e))?;

    Ok(DashboardData {
        stats,
        top_tokens,
        newest_tokens,
        bonding_curve,
    })
}

/// Change of one token between its first and last snapshot in a window
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceEntry {
    pub address: String,
    pub symbol: String,
    pub snapshots: u64,
    pub first_price_usdc: Option<f64>,
    pub last_price_usdc: Option<f64>,
    pub price_change_pct: Option<f64>,
    pub first_invest_score: Option<f64>,
    pub last_invest_score: Option<f64>,
    pub holders_change: Option<i64>,
}

pub fn performance(
    conn: &Connection,
    since: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<PerformanceEntry>, String> {
    let mut stmt = conn
        .prepare(
            r#"
            WITH windowed AS (
                SELECT * FROM token_history WHERE recorded_at >= ?1
            ),
            bounds AS (
                SELECT address, MIN(id) AS first_id, MAX(id) AS last_id, COUNT(*) AS n
                FROM windowed GROUP BY address
            )
            SELECT b.address, COALESCE(t.symbol, 'UNKNOWN'), b.n,
                   f.price_usdc, l.price_usdc,
                   f.invest_score, l.invest_score,
                   f.holders, l.holders
            FROM bounds b
            JOIN windowed f ON f.id = b.first_id
            JOIN windowed l ON l.id = b.last_id
            LEFT JOIN tokens t ON t.address = b.address
            "#,
        )
        .map_err(|e| format!("Failed to prepare performance query: {}", e))?;

    let mut entries = stmt
        .query_map(params![ts(since)], |row| {
            let first_price: Option<f64> = row.get(3)?;
            let last_price: Option<f64> = row.get(4)?;
            let first_holders: Option<i64> = row.get(7)?;
            let last_holders: Option<i64> = row.get(8)?;
            Ok(PerformanceEntry {
                address: row.get(0)?,
                symbol: row.get(1)?,
                snapshots: row.get::<_, i64>(2)? as u64,
                first_price_usdc: first_price,
                last_price_usdc: last_price,
                price_change_pct: match (first_price, last_price) {
                    (Some(f), Some(l)) if f > 0.0 => Some((l - f) / f * 100.0),
                    _ => None,
                },
                first_invest_score: row.get(5)?,
                last_invest_score: row.get(6)?,
                holders_change: match (first_holders, last_holders) {
                    (Some(f), Some(l)) => Some(l - f),
                    _ => None,
                },
            })
        })
        .map_err(|e| format!("Failed to run performance query: {}", e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("Failed to read performance row: {}", e))?;

    entries.sort_by(|a, b| {
        let a_key = a.price_change_pct.unwrap_or(f64::NEG_INFINITY);
        let b_key = b.price_change_pct.unwrap_or(f64::NEG_INFINITY);
        b_key
            .partial_cmp(&a_key)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.address.cmp(&b.address))
    });
    entries.truncate(limit);
    Ok(entries)
}
