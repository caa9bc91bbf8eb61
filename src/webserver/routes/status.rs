use axum::{extract::State, http::StatusCode, response::Response, routing::get, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::{
    arguments::is_debug_webserver_enabled,
    database::DatabaseStats,
    logger::{self, LogTag},
    webserver::{
        state::AppState,
        utils::{error_response, success_response},
    },
};

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: DatabaseStats,
    pub database_path: String,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(database_stats))
}

/// GET /api/health
async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    if is_debug_webserver_enabled() {
        logger::debug(LogTag::Webserver, "Health check endpoint called");
    }

    success_response(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// GET /api/stats
async fn database_stats(State(state): State<Arc<AppState>>) -> Response {
    match state.database.get_stats().await {
        Ok(stats) => success_response(StatsResponse {
            stats,
            database_path: state.database.path().display().to_string(),
        }),
        Err(e) => {
            logger::error(LogTag::Webserver, &format!("Stats query failed: {}", e));
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "stats_failed",
                &format!("Failed to load stats: {}", e),
                None,
            )
        }
    }
}
