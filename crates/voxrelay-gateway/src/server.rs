// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP server built on axum.
//!
//! Sets up routes, request tracing and the shared state every handler sees.

use std::sync::Arc;
use std::time::Instant;

use axum::{routing::get, Router};
use dashmap::DashMap;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use uuid::Uuid;
use voxrelay_core::{RelayError, TransportKind};
use voxrelay_relay::RelaySettings;

use crate::handlers;
use crate::realtime::GatewayConnector;
use crate::tenants::TenantRegistry;
use crate::ws;

/// A call currently bridged to the AI gateway.
#[derive(Debug, Clone)]
pub struct ActiveCall {
    pub tenant: String,
    pub started_at: Instant,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub tenants: Arc<TenantRegistry>,
    /// Opens one AI gateway connection per call.
    pub connector: Arc<dyn GatewayConnector>,
    pub settings: Arc<RelaySettings>,
    /// Externally reachable base URL, overriding the request `Host`.
    pub public_url: Option<String>,
    pub calls: Arc<DashMap<Uuid, ActiveCall>>,
    pub started_at: Instant,
    /// Cancelled when the server begins shutting down. Live calls end too.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        tenants: TenantRegistry,
        connector: Arc<dyn GatewayConnector>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            tenants: Arc::new(tenants),
            connector,
            settings: Arc::new(settings),
            public_url: None,
            calls: Arc::new(DashMap::new()),
            started_at: Instant::now(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_public_url(mut self, public_url: Option<String>) -> Self {
        self.public_url = public_url;
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tenants", &self.tenants.keys())
            .field("public_url", &self.public_url)
            .field("active_calls", &self.calls.len())
            .finish_non_exhaustive()
    }
}

/// Listener address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Builds the router:
/// - GET / (default tenant intro)
/// - GET /health
/// - GET|POST /incoming-call/{tenant}
/// - GET /media-stream/{tenant} (websocket)
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route(
            "/incoming-call/{tenant}",
            get(handlers::incoming_call).post(handlers::incoming_call),
        )
        .route("/media-stream/{tenant}", get(ws::media_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `host:port` and serves until the state's shutdown token fires.
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<(), RelayError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| RelayError::Transport {
            transport: TransportKind::Telephony,
            message: format!("failed to bind {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;
    tracing::info!(tenants = ?state.tenants.keys(), "listening on {addr}");
    serve(listener, state).await
}

/// Serves on an already bound listener with graceful shutdown.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), RelayError> {
    let shutdown = state.shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled_owned().await })
        .await
        .map_err(|e| RelayError::Transport {
            transport: TransportKind::Telephony,
            message: format!("server error: {e}"),
            source: Some(Box::new(e)),
        })?;
    tracing::info!("server stopped");
    Ok(())
}
