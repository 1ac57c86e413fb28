// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telephony media-stream websocket.
//!
//! The phone network opens `GET /media-stream/{tenant}` once the call is
//! answered. Each connection gets its own AI gateway connection and runs one
//! [`CallSession`] until either side hangs up.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::{IntoResponse, Response},
};
use futures::stream::BoxStream;
use futures::{future, Stream, StreamExt};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;
use voxrelay_core::TransportKind;
use voxrelay_relay::{CallSession, Link};

use crate::handlers::not_found;
use crate::server::{ActiveCall, AppState};
use crate::tenants::TenantProfile;

/// GET /media-stream/{tenant}
pub async fn media_stream(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Some(profile) = state.tenants.get(&tenant) else {
        warn!(tenant = tenant.as_str(), "media stream for unknown tenant");
        return not_found(&tenant);
    };
    match upgrade {
        Ok(upgrade) => upgrade.on_upgrade(move |socket| handle_call(socket, profile, state)),
        Err(rejection) => rejection.into_response(),
    }
}

async fn handle_call(socket: WebSocket, tenant: Arc<TenantProfile>, state: AppState) {
    let call_id = Uuid::new_v4();
    let span = info_span!("call", %call_id, tenant = tenant.key.as_str());
    bridge_call(socket, tenant, state, call_id)
        .instrument(span)
        .await;
}

async fn bridge_call(socket: WebSocket, tenant: Arc<TenantProfile>, state: AppState, call_id: Uuid) {
    info!("telephony stream connected");

    let gateway = match state.connector.connect().await {
        Ok(gateway) => gateway,
        Err(e) => {
            // Dropping the socket hangs up the media stream.
            error!(error = %e, "could not reach AI gateway, dropping call");
            return;
        }
    };

    let (sink, source) = socket.split();
    let (telephony, outbox) = Link::new(TransportKind::Telephony);
    let writer = tokio::spawn(
        outbox
            .drain_into(sink, |frame| Message::Text(frame.into()))
            .in_current_span(),
    );

    state.calls.insert(
        call_id,
        ActiveCall {
            tenant: tenant.key.clone(),
            started_at: Instant::now(),
        },
    );

    let shutdown_watch = {
        let shutdown = state.shutdown.clone();
        let telephony = telephony.clone();
        let gateway = gateway.link.clone();
        tokio::spawn(
            async move {
                shutdown.cancelled().await;
                info!("server shutting down, ending call");
                telephony.close();
                gateway.close();
            }
            .in_current_span(),
        )
    };

    let session = CallSession::new(
        Arc::clone(&tenant.session),
        Arc::clone(&tenant.tools),
        Arc::clone(&state.settings),
    );
    if let Err(e) = session
        .run(text_frames(source), telephony, gateway.events, gateway.link)
        .await
    {
        warn!(error = %e, "call session failed");
    }

    shutdown_watch.abort();
    if let Err(e) = writer.await {
        debug!(error = %e, "telephony writer ended abnormally");
    }
    if let Some((_, call)) = state.calls.remove(&call_id) {
        info!(
            duration_ms = call.started_at.elapsed().as_millis() as u64,
            "call ended"
        );
    }
}

/// Text frames from the telephony socket, ending at the first close or error.
fn text_frames<S>(source: S) -> BoxStream<'static, String>
where
    S: Stream<Item = Result<Message, axum::Error>> + Send + 'static,
{
    source
        .take_while(|message| {
            future::ready(match message {
                Ok(Message::Close(_)) => false,
                Ok(_) => true,
                Err(e) => {
                    debug!(error = %e, "telephony read failed");
                    false
                }
            })
        })
        .filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(text.as_str().to_owned()),
                _ => None,
            })
        })
        .boxed()
}
