/*
 * Responsibility
 * - POST /authorize: gateway の event JSON をそのまま受け取り Decision を返す
 * - GET /authorize: forward-auth 用。リクエスト自身の Authorization ヘッダを使う
 * - どの入力でも Decision を返す (body 不正・panic も拒否理由に畳み込む)
 */
use std::future::Future;

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, StatusCode, header},
};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::AuthorizeError;
use crate::services::auth::{Decision, TokenCandidate};
use crate::state::AppState;

/// Gateway events are small; anything larger is not an authorizer event.
pub const EVENT_BODY_LIMIT_BYTES: usize = 64 * 1024;

pub async fn authorize_event(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Json<Decision> {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, "authorizer event body could not be read");
            return Json(Decision::from(AuthorizeError::MalformedRequest));
        }
    };

    let event = parse_event(&body);
    let authorizer = state.authorizer.clone();

    let decision = guarded(async move { authorizer.authorize(&event).await }).await;

    Json(decision)
}

pub async fn authorize_forward(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<Decision>) {
    let candidate = candidate_from_headers(&headers);
    let authorizer = state.authorizer.clone();

    let decision = guarded(async move { authorizer.authorize_candidate(candidate).await }).await;

    let status = if decision.is_authorized {
        StatusCode::OK
    } else {
        debug!(reason = ?decision.reason(), "forward-auth request denied");
        StatusCode::FORBIDDEN
    };
    (status, Json(decision))
}

// Empty or unparseable bodies are treated like a `null` event.
fn parse_event(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Null;
    }

    serde_json::from_slice(body).unwrap_or_else(|err| {
        warn!(error = %err, "authorizer event is not valid JSON");
        Value::Null
    })
}

fn candidate_from_headers(headers: &HeaderMap) -> TokenCandidate {
    match headers.get(header::AUTHORIZATION).map(|v| v.to_str()) {
        None => TokenCandidate::Absent,
        Some(Err(_)) => TokenCandidate::NotAString,
        Some(Ok("")) => TokenCandidate::Empty,
        Some(Ok(token)) => TokenCandidate::Present(token.to_string()),
    }
}

/// Run one authorization on its own task so a panic becomes a denial instead of a dropped request.
async fn guarded<F>(authorization: F) -> Decision
where
    F: Future<Output = Decision> + Send + 'static,
{
    match tokio::spawn(authorization).await {
        Ok(decision) => decision,
        Err(err) => {
            error!(error = %err, "authorization task failed");
            Decision::from(AuthorizeError::Internal(err.to_string()))
        }
    }
}
