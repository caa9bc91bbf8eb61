/// Shared application state for the webserver
use crate::config::WebserverConfig;
use crate::database::TokenDatabase;
use std::sync::Arc;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WebserverConfig>,
    /// Read connection; the API never writes
    pub database: TokenDatabase,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: WebserverConfig, database: TokenDatabase) -> Self {
        Self {
            config: Arc::new(config),
            database,
            startup_time: chrono::Utc::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        (chrono::Utc::now() - self.startup_time)
            .num_seconds()
            .max(0) as u64
    }

    /// Requested page size, defaulted and capped by config
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.config.default_limit)
            .clamp(1, self.config.max_limit.max(1))
    }
}
