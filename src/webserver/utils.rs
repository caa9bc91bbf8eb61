/// Response envelope helpers shared by all routes
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// `{"success": true, "data": ...}` with 200
pub fn success_response<T: Serialize>(data: T) -> Response {
    Json(serde_json::json!({
        "success": true,
        "data": data,
    }))
    .into_response()
}

/// `{"success": false, "error": ...}` with the given status
pub fn error_response(status: StatusCode, code: &str, message: &str, details: Option<&str>) -> Response {
    let mut body = serde_json::json!({
        "success": false,
        "error": message,
        "code": code,
    });
    if let Some(details) = details {
        body["details"] = serde_json::Value::String(details.to_string());
    }
    (status, Json(body)).into_response()
}
