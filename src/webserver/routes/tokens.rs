use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    arguments::is_debug_webserver_enabled,
    database::{TokenOrder, TokenQuery},
    logger::{self, LogTag},
    tokens::types::TokenRecord,
    webserver::{
        state::AppState,
        utils::{error_response, success_response},
    },
};

const DEFAULT_DASHBOARD_TOP: usize = 10;
const DEFAULT_PERFORMANCE_HOURS: i64 = 24;
const MAX_PERFORMANCE_HOURS: i64 = 24 * 30;

#[derive(Debug, Deserialize)]
pub struct TokensDetailParams {
    pub limit: Option<usize>,
    pub min_score: Option<f64>,
    pub tradeable_only: Option<bool>,
    pub order: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokensDetailResponse {
    pub count: usize,
    pub order: String,
    pub tokens: Vec<TokenRecord>,
}

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    pub top: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PerformanceParams {
    pub hours: Option<i64>,
    pub limit: Option<usize>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tokens-detail", get(tokens_detail))
        .route("/dashboard-data", get(dashboard_data))
        .route("/performance", get(performance))
        .route("/tokens/:address", get(token_by_address))
}

fn query_failed(what: &str, e: String) -> Response {
    logger::error(LogTag::Webserver, &format!("{} query failed: {}", what, e));
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "query_failed",
        &format!("Failed to load {}: {}", what, e),
        None,
    )
}

fn invalid_query(rejection: QueryRejection) -> Response {
    error_response(
        StatusCode::BAD_REQUEST,
        "invalid_query",
        &rejection.body_text(),
        None,
    )
}

/// GET /api/tokens-detail
async fn tokens_detail(
    State(state): State<Arc<AppState>>,
    params: Result<Query<TokensDetailParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return invalid_query(rejection),
    };
    let order_name = params.order.unwrap_or_else(|| "score".to_string());
    let Some(order) = TokenOrder::parse(&order_name) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_order",
            &format!("Unknown order '{}'", order_name),
            Some("Use one of: score, newest, volume, liquidity, updated"),
        );
    };

    let query = TokenQuery {
        limit: state.clamp_limit(params.limit),
        min_score: params.min_score,
        tradeable_only: params.tradeable_only.unwrap_or(false),
        order,
    };
    if is_debug_webserver_enabled() {
        logger::debug(LogTag::Webserver, &format!("tokens-detail {:?}", query));
    }

    match state.database.list_tokens(query).await {
        Ok(tokens) => success_response(TokensDetailResponse {
            count: tokens.len(),
            order: order_name,
            tokens,
        }),
        Err(e) => query_failed("tokens", e),
    }
}

/// GET /api/dashboard-data
async fn dashboard_data(
    State(state): State<Arc<AppState>>,
    params: Result<Query<DashboardParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return invalid_query(rejection),
    };
    let top = state.clamp_limit(Some(params.top.unwrap_or(DEFAULT_DASHBOARD_TOP)));
    match state.database.dashboard_data(top).await {
        Ok(data) => success_response(data),
        Err(e) => query_failed("dashboard data", e),
    }
}

/// GET /api/performance
async fn performance(
    State(state): State<Arc<AppState>>,
    params: Result<Query<PerformanceParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return invalid_query(rejection),
    };
    let hours = params
        .hours
        .unwrap_or(DEFAULT_PERFORMANCE_HOURS)
        .clamp(1, MAX_PERFORMANCE_HOURS);
    let since = Utc::now() - Duration::hours(hours);
    let limit = state.clamp_limit(params.limit);

    match state.database.performance(since, limit).await {
        Ok(entries) => success_response(serde_json::json!({
            "hours": hours,
            "count": entries.len(),
            "tokens": entries,
        })),
        Err(e) => query_failed("performance", e),
    }
}

/// GET /api/tokens/:address
async fn token_by_address(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Response {
    match state.database.get_token(&address).await {
        Ok(Some(token)) => success_response(token),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "token_not_found",
            &format!("Token {} not found", address),
            None,
        ),
        Err(e) => query_failed("token", e),
    }
}

#[cfg(test)]
mod tests {
    use crate::apis::client::test_support::serve;
    use crate::config::WebserverConfig;
    use crate::database::{operations, TokenDatabase};
    use crate::tokens::types::TokenRecord;
    use crate::webserver::{build_app, AppState};
    use chrono::Utc;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn record(address: &str, score: f64, tradeable: bool) -> TokenRecord {
        let mut record = TokenRecord::discovered(address, Some("jupiter"), Utc::now());
        record.symbol = address.to_uppercase();
        record.invest_score = Some(score);
        record.is_tradeable = tradeable;
        record.price_usdc = Some(1.0);
        record.updated_at = Some(Utc::now());
        record
    }

    async fn api() -> (TempDir, String) {
        let dir = TempDir::new().unwrap();
        let database =
            TokenDatabase::open(dir.path().join("tokens.db"), Duration::from_secs(5)).unwrap();
        {
            let mut conn = rusqlite::Connection::open(database.path()).unwrap();
            operations::upsert_enriched(
                &mut conn,
                &[record("aaa", 80.0, true), record("bbb", 40.0, false), record("ccc", 10.0, true)],
            )
            .unwrap();
        }
        let state = Arc::new(AppState::new(WebserverConfig::default(), database));
        let base = serve(build_app(state)).await;
        (dir, base)
    }

    async fn get(url: String) -> (u16, Value) {
        let response = reqwest::get(url).await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_health_and_stats() {
        let (_dir, base) = api().await;

        let (status, body) = get(format!("{}/api/health", base)).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");

        let (_, body) = get(format!("{}/api/stats", base)).await;
        assert_eq!(body["data"]["total_tokens"], 3);
        assert_eq!(body["data"]["tradeable_tokens"], 2);
    }

    #[tokio::test]
    async fn test_tokens_detail_filters() {
        let (_dir, base) = api().await;

        let (_, body) = get(format!("{}/api/tokens-detail?min_score=30&limit=10", base)).await;
        let tokens = body["data"]["tokens"].as_array().unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0]["address"], "aaa");

        let (_, body) = get(format!("{}/api/tokens-detail?tradeable_only=true", base)).await;
        assert_eq!(body["data"]["count"], 2);

        let (status, body) = get(format!("{}/api/tokens-detail?order=random", base)).await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("random"));
    }

    #[tokio::test]
    async fn test_malformed_query_keeps_json_envelope() {
        let (_dir, base) = api().await;

        let (status, body) = get(format!("{}/api/tokens-detail?min_score=abc", base)).await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "invalid_query");
        assert!(body["error"].as_str().unwrap().contains("query string"));

        let (status, body) = get(format!("{}/api/performance?hours=soon", base)).await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_token_lookup_and_dashboard() {
        let (_dir, base) = api().await;

        let (status, body) = get(format!("{}/api/tokens/bbb", base)).await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["symbol"], "BBB");

        let (status, body) = get(format!("{}/api/tokens/missing", base)).await;
        assert_eq!(status, 404);
        assert_eq!(body["success"], false);

        let (_, body) = get(format!("{}/api/dashboard-data?top=2", base)).await;
        assert_eq!(body["data"]["top_tokens"].as_array().unwrap().len(), 2);

        let (_, body) = get(format!("{}/api/performance", base)).await;
        assert_eq!(body["data"]["count"], 3);
    }
}
