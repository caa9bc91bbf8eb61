/// Single writer task for the token store
///
/// All mutations funnel through one bounded queue into one blocking task
/// that owns the write connection, so SQLite never sees two writers from
/// this process. Each command carries a oneshot for its result.
use crate::database::operations;
use crate::logger::{self, LogTag};
use crate::tokens::batch::TokenStore;
use crate::tokens::types::TokenRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tokio::sync::{mpsc, oneshot};

enum WriteCommand {
    Discovered {
        tokens: Vec<(String, String)>,
        at: DateTime<Utc>,
        reply: oneshot::Sender<Result<usize, String>>,
    },
    Enriched {
        records: Vec<TokenRecord>,
        reply: oneshot::Sender<Result<usize, String>>,
    },
}

#[derive(Clone)]
pub struct DatabaseWriter {
    tx: mpsc::Sender<WriteCommand>,
}

impl DatabaseWriter {
    /// Move `connection` into a blocking task and return its handle
    ///
    /// The task exits once every handle has been dropped.
    pub fn spawn(mut connection: Connection, queue_capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<WriteCommand>(queue_capacity.max(1));

        tokio::task::spawn_blocking(move || {
            while let Some(command) = rx.blocking_recv() {
                match command {
                    WriteCommand::Discovered { tokens, at, reply } => {
                        let result = operations::insert_discovered(&mut connection, &tokens, at);
                        if let Err(e) = &result {
                            logger::error(LogTag::Database, &format!("Discovery write failed: {}", e));
                        }
                        let _ = reply.send(result);
                    }
                    WriteCommand::Enriched { records, reply } => {
                        let result = operations::upsert_enriched(&mut connection, &records);
                        match &result {
                            Ok(n) => logger::debug(
                                LogTag::Database,
                                &format!("Committed {} enriched tokens", n),
                            ),
                            Err(e) => logger::error(
                                LogTag::Database,
                                &format!("Enrichment write failed: {}", e),
                            ),
                        }
                        let _ = reply.send(result);
                    }
                }
            }
            logger::debug(LogTag::Database, "Database writer stopped");
        });

        Self { tx }
    }

    async fn submit(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<usize, String>>) -> WriteCommand,
    ) -> Result<usize, String> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| "Database writer is not running".to_string())?;
        rx.await
            .map_err(|_| "Database writer dropped the request".to_string())?
    }

    /// Insert `(address, source)` pairs not yet known; returns how many were new
    pub async fn record_discovered(
        &self,
        tokens: Vec<(String, String)>,
        at: DateTime<Utc>,
    ) -> Result<usize, String> {
        if tokens.is_empty() {
            return Ok(0);
        }
        self.submit(|reply| WriteCommand::Discovered { tokens, at, reply })
            .await
    }
}

#[async_trait]
impl TokenStore for DatabaseWriter {
    async fn store_enriched(&self, records: Vec<TokenRecord>) -> Result<usize, String> {
        if records.is_empty() {
            return Ok(0);
        }
        self.submit(|reply| WriteCommand::Enriched { records, reply })
            .await
    }
}
