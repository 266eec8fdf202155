/*
 * Responsibility
 * - GET /health (疎通用)
 * - store にはアクセスしない (DB 停止中でも ok を返す)
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({"status": "ok", "mode": state.authorizer.mode()})),
    )
}
