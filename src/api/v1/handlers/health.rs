/*
 * Responsibility
 * - GET /health (liveness; mounted outside /api/v1, never needs a token)
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
