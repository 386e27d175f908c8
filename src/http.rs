//! HTTP shell
//!
//! Translates requests into [`handle_assumption`] calls and nothing more.

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, DefaultBodyLimit, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::warn;

use crate::auth::address;
use crate::commands::{get_metrics, handle_assumption};
use crate::SharedState;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Header carrying the caller's credential
pub const API_KEY_HEADER: &str = "x-api-key";

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/assumption", post(assumption))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Reports whether the row store answers a ping.
async fn healthz(State(state): State<SharedState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            warn!(error = %e, "health check: row store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}

async fn metrics(State(state): State<SharedState>) -> impl IntoResponse {
    Json(get_metrics(&state))
}

async fn assumption(
    State(state): State<SharedState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let address = address::normalize(peer.ip()).to_string();
    let credential = extract_credential(&headers);

    let response = handle_assumption(&state, &address, credential, &body).await;
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body))
}

/// `X-Api-Key: <key>` or `Authorization: Bearer <key>`
fn extract_credential(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers.get(API_KEY_HEADER) {
        return value.to_str().ok().map(str::trim);
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(str::trim)
}
