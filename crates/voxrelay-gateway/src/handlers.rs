// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain HTTP handlers: index, health and the incoming-call webhook.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::server::AppState;
use crate::twiml;

const FALLBACK_MESSAGE: &str = "Voxrelay media stream server is running";

/// Response body for `GET /`.
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub message: String,
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Calls currently bridged.
    pub active_calls: usize,
    pub tenants: usize,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET / - the default tenant's intro.
pub async fn index(State(state): State<AppState>) -> Json<IndexResponse> {
    let message = state
        .tenants
        .default_tenant()
        .map(|tenant| tenant.intro.clone())
        .filter(|intro| !intro.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
    Json(IndexResponse { message })
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        active_calls: state.calls.len(),
        tenants: state.tenants.len(),
    })
}

/// GET|POST /incoming-call/{tenant}
///
/// Answers the phone network's webhook with markup that connects the call
/// to this tenant's media stream.
pub async fn incoming_call(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Some(profile) = state.tenants.get(&tenant) else {
        warn!(tenant = tenant.as_str(), "incoming call for unknown tenant");
        return not_found(&tenant);
    };

    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    let stream_url = twiml::media_stream_url(state.public_url.as_deref(), host, &profile.key);
    info!(tenant = profile.key.as_str(), stream_url = stream_url.as_str(), "answering incoming call");

    (
        [(header::CONTENT_TYPE, twiml::CONTENT_TYPE)],
        twiml::connect_stream(&profile.intro, &stream_url),
    )
        .into_response()
}

pub(crate) fn not_found(tenant: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("unknown tenant `{tenant}`"),
        }),
    )
        .into_response()
}
