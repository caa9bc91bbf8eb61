//! SQLite token store
//!
//! Readers share one connection behind a mutex. Writes go through the
//! [`DatabaseWriter`] task, which owns its own connection, so WAL lets the
//! API keep reading while a batch commits.

pub mod operations;
pub mod schema;
pub mod writer;

pub use operations::{
    DashboardData, DatabaseStats, PerformanceEntry, SelectionOptions, StatusCount, TokenOrder,
    TokenQuery,
};
pub use writer::DatabaseWriter;

use crate::config::DatabaseConfig;
use crate::logger::{self, LogTag};
use crate::tokens::types::TokenRecord;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

fn configure_connection(connection: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    connection.pragma_update(None, "journal_mode", "WAL")?;
    connection.pragma_update(None, "synchronous", "NORMAL")?;
    connection.pragma_update(None, "temp_store", "memory")?;
    connection.busy_timeout(busy_timeout)?;
    Ok(())
}

/// Open a configured connection and make sure the schema exists
pub fn open_connection(path: &Path, busy_timeout: Duration) -> Result<Connection, String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                format!("Failed to create database directory {}: {}", parent.display(), e)
            })?;
        }
    }

    let connection = Connection::open(path)
        .map_err(|e| format!("Failed to open database {}: {}", path.display(), e))?;
    configure_connection(&connection, busy_timeout)
        .map_err(|e| format!("Failed to configure database: {}", e))?;

    for statement in schema::SCHEMA_STATEMENTS {
        connection
            .execute(statement, [])
            .map_err(|e| format!("Failed to initialize schema: {}", e))?;
    }
    Ok(connection)
}

/// Read side of the token store
#[derive(Clone)]
pub struct TokenDatabase {
    path: PathBuf,
    busy_timeout: Duration,
    connection: Arc<Mutex<Connection>>,
}

impl TokenDatabase {
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self, String> {
        let path = path.as_ref().to_path_buf();
        let connection = open_connection(&path, busy_timeout)?;
        logger::debug(
            LogTag::Database,
            &format!("Opened token database at {}", path.display()),
        );
        Ok(Self {
            path,
            busy_timeout,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    pub fn from_config(config: &DatabaseConfig) -> Result<Self, String> {
        Self::open(&config.path, Duration::from_millis(config.busy_timeout_ms))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start the writer task on a second connection to the same file
    pub fn spawn_writer(&self, queue_capacity: usize) -> Result<DatabaseWriter, String> {
        let connection = open_connection(&self.path, self.busy_timeout)?;
        Ok(DatabaseWriter::spawn(connection, queue_capacity))
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run a read closure on the blocking pool
    async fn read<F, R>(&self, f: F) -> Result<R, String>
    where
        F: FnOnce(&Connection) -> Result<R, String> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.lock();
            f(&conn)
        })
        .await
        .map_err(|e| format!("Database task failed: {}", e))?
    }

    pub async fn get_token(&self, address: &str) -> Result<Option<TokenRecord>, String> {
        let address = address.to_string();
        self.read(move |conn| operations::get_token(conn, &address))
            .await
    }

    pub async fn list_tokens(&self, query: TokenQuery) -> Result<Vec<TokenRecord>, String> {
        self.read(move |conn| operations::list_tokens(conn, &query))
            .await
    }

    pub async fn select_for_enrichment(
        &self,
        options: SelectionOptions,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, String> {
        self.read(move |conn| operations::select_for_enrichment(conn, &options, now))
            .await
    }

    pub async fn get_stats(&self) -> Result<DatabaseStats, String> {
        self.read(operations::get_stats).await
    }

    pub async fn dashboard_data(&self, top_n: usize) -> Result<DashboardData, String> {
        self.read(move |conn| operations::dashboard_data(conn, top_n))
            .await
    }

    pub async fn performance(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<PerformanceEntry>, String> {
        self.read(move |conn| operations::performance(conn, since, limit))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::types::BondingCurveStatus;
    use chrono::Duration as ChronoDuration;
    use tempfile::TempDir;

    fn temp_db() -> (TempDir, TokenDatabase) {
        let dir = TempDir::new().unwrap();
        let db = TokenDatabase::open(dir.path().join("tokens.db"), Duration::from_secs(5)).unwrap();
        (dir, db)
    }

    fn enriched(address: &str, score: f64, holders: u64, at: DateTime<Utc>) -> TokenRecord {
        let mut record = TokenRecord::discovered(address, Some("enrich"), at);
        record.symbol = format!("SYM{}", address);
        record.price_usdc = Some(score / 100.0);
        record.liquidity_usd = Some(score * 1000.0);
        record.volume_24h = Some(score * 500.0);
        record.holders = Some(holders);
        record.rug_score = Some(70.0);
        record.invest_score = Some(score);
        record.is_tradeable = score > 30.0;
        record.age_hours = Some(2.0);
        record.bonding_curve_status = Some(BondingCurveStatus::Active);
        record.updated_at = Some(at);
        record
    }

    fn pairs(list: &[&str], source: &str) -> Vec<(String, String)> {
        list.iter()
            .map(|a| (a.to_string(), source.to_string()))
            .collect()
    }

    #[test]
    fn test_discovery_insert_is_idempotent() {
        let (_dir, db) = temp_db();
        let mut conn = db.lock();
        let now = Utc::now();

        let first = operations::insert_discovered(&mut conn, &pairs(&["A", "B"], "jupiter"), now).unwrap();
        let second =
            operations::insert_discovered(&mut conn, &pairs(&["A", "B", "C"], "birdeye"), now).unwrap();
        assert_eq!(first, 2);
        assert_eq!(second, 1);

        let a = operations::get_token(&conn, "A").unwrap().unwrap();
        assert_eq!(a.discovery_source.as_deref(), Some("jupiter"));
        assert_eq!(a.symbol, "UNKNOWN");
        assert!(!a.is_enriched());
    }

    #[test]
    fn test_upsert_preserves_discovery_fields() {
        let (_dir, db) = temp_db();
        let mut conn = db.lock();
        let discovered_at = Utc::now() - ChronoDuration::hours(3);
        operations::insert_discovered(&mut conn, &pairs(&["A"], "rpc_logs"), discovered_at).unwrap();

        let record = enriched("A", 55.0, 120, Utc::now());
        operations::upsert_enriched(&mut conn, &[record.clone()]).unwrap();
        operations::upsert_enriched(&mut conn, &[record]).unwrap();

        let stored = operations::get_token(&conn, "A").unwrap().unwrap();
        assert_eq!(stored.first_discovered_at.timestamp(), discovered_at.timestamp());
        assert_eq!(stored.discovery_source.as_deref(), Some("rpc_logs"));
        assert_eq!(stored.invest_score, Some(55.0));
        assert_eq!(stored.holders, Some(120));
        assert_eq!(stored.bonding_curve_status, Some(BondingCurveStatus::Active));

        let history: i64 = conn
            .query_row("SELECT COUNT(*) FROM token_history WHERE address = 'A'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(history, 2);
    }

    #[test]
    fn test_selection_prefers_unenriched_newest_first() {
        let (_dir, db) = temp_db();
        let mut conn = db.lock();
        let now = Utc::now();

        operations::insert_discovered(&mut conn, &pairs(&["old"], "x"), now - ChronoDuration::hours(5)).unwrap();
        operations::insert_discovered(&mut conn, &pairs(&["new"], "x"), now - ChronoDuration::hours(1)).unwrap();
        operations::upsert_enriched(
            &mut conn,
            &[enriched("done", 40.0, 10, now - ChronoDuration::hours(2))],
        )
        .unwrap();

        let options = SelectionOptions {
            limit: 3,
            ..SelectionOptions::default()
        };
        let selected = operations::select_for_enrichment(&conn, &options, now).unwrap();
        assert_eq!(selected, vec!["new", "old", "done"]);

        let options = SelectionOptions {
            limit: 1,
            ..SelectionOptions::default()
        };
        let selected = operations::select_for_enrichment(&conn, &options, now).unwrap();
        assert_eq!(selected, vec!["new"]);
    }

    #[test]
    fn test_selection_age_filter_and_growth_order() {
        let (_dir, db) = temp_db();
        let mut conn = db.lock();
        let now = Utc::now();
        let earlier = now - ChronoDuration::hours(2);

        let mut aged = enriched("aged", 40.0, 10, earlier);
        aged.age_hours = Some(100.0);
        operations::upsert_enriched(
            &mut conn,
            &[enriched("flat", 40.0, 100, earlier), enriched("grow", 40.0, 100, earlier), aged],
        )
        .unwrap();
        let later = now - ChronoDuration::hours(1);
        operations::upsert_enriched(
            &mut conn,
            &[enriched("flat", 40.0, 101, later), enriched("grow", 40.0, 500, later)],
        )
        .unwrap();

        let options = SelectionOptions {
            limit: 10,
            max_age_hours: Some(24.0),
            holders_growth: true,
        };
        let selected = operations::select_for_enrichment(&conn, &options, now).unwrap();
        assert_eq!(selected, vec!["grow", "flat"]);
    }

    #[test]
    fn test_list_and_stats() {
        let (_dir, db) = temp_db();
        let mut conn = db.lock();
        let now = Utc::now();
        operations::upsert_enriched(
            &mut conn,
            &[
                enriched("low", 20.0, 5, now),
                enriched("mid", 50.0, 50, now),
                enriched("top", 80.0, 500, now),
            ],
        )
        .unwrap();
        operations::insert_discovered(&mut conn, &pairs(&["fresh"], "x"), now).unwrap();

        let query = TokenQuery {
            limit: 10,
            min_score: Some(40.0),
            tradeable_only: true,
            order: TokenOrder::Score,
        };
        let tokens = operations::list_tokens(&conn, &query).unwrap();
        let addresses: Vec<_> = tokens.iter().map(|t| t.address.as_str()).collect();
        assert_eq!(addresses, vec!["top", "mid"]);

        let stats = operations::get_stats(&conn).unwrap();
        assert_eq!(stats.total_tokens, 4);
        assert_eq!(stats.enriched_tokens, 3);
        assert_eq!(stats.tradeable_tokens, 2);
        assert_eq!(stats.high_score_tokens, 1);
        assert_eq!(stats.history_rows, 3);
        assert!((stats.average_invest_score.unwrap() - 50.0).abs() < 1e-9);

        let dashboard = operations::dashboard_data(&conn, 2).unwrap();
        assert_eq!(dashboard.top_tokens.len(), 2);
        assert_eq!(dashboard.newest_tokens.len(), 2);
        assert!(dashboard
            .bonding_curve
            .iter()
            .any(|c| c.status == "active" && c.count == 3));
    }

    #[test]
    fn test_performance_window() {
        let (_dir, db) = temp_db();
        let mut conn = db.lock();
        let now = Utc::now();
        operations::upsert_enriched(&mut conn, &[enriched("A", 50.0, 100, now - ChronoDuration::hours(3))]).unwrap();
        operations::upsert_enriched(&mut conn, &[enriched("A", 75.0, 150, now)]).unwrap();

        let entries = operations::performance(&conn, now - ChronoDuration::hours(24), 10).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.snapshots, 2);
        assert_eq!(entry.holders_change, Some(50));
        assert!((entry.price_change_pct.unwrap() - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_async_readers() {
        let (_dir, db) = temp_db();
        {
            let mut conn = db.lock();
            operations::upsert_enriched(&mut conn, &[enriched("A", 60.0, 10, Utc::now())]).unwrap();
        }
        assert!(db.get_token("A").await.unwrap().is_some());
        assert!(db.get_token("missing").await.unwrap().is_none());
        assert_eq!(db.get_stats().await.unwrap().total_tokens, 1);
    }
}
