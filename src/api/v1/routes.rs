/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /authorize (POST: gateway event, GET: forward-auth)
 */
use axum::{Router, extract::DefaultBodyLimit, routing::get};

use crate::state::AppState;

use crate::api::v1::handlers::{
    authorize::{EVENT_BODY_LIMIT_BYTES, authorize_event, authorize_forward},
    health::health,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/authorize",
            get(authorize_forward)
                .post(authorize_event)
                .layer(DefaultBodyLimit::max(EVENT_BODY_LIMIT_BYTES)),
        )
}
