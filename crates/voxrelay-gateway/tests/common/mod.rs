// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures for gateway integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use voxrelay_core::{RelayError, SessionProfile, TransportKind};
use voxrelay_gateway::{AppState, GatewayConnection, GatewayConnector, TenantProfile, TenantRegistry};
use voxrelay_relay::{Link, Outbox, RelaySettings};

pub const TIMEOUT: Duration = Duration::from_secs(10);

/// The far end of one scripted gateway connection.
pub struct GatewayPeer {
    /// Frames the session sent to the gateway.
    pub outbox: Outbox,
    /// Push gateway events into the session.
    pub events: UnboundedSender<String>,
}

impl GatewayPeer {
    pub async fn next_json(&mut self) -> Option<Value> {
        let frame = tokio::time::timeout(TIMEOUT, self.outbox.recv())
            .await
            .ok()
            .flatten()?;
        serde_json::from_str(&frame).ok()
    }

    pub fn send(&self, event: Value) {
        let _ = self.events.unbounded_send(event.to_string());
    }
}

/// In-memory gateway connector. Each connection is handed to the test.
pub struct ScriptedGateway {
    peers: Option<mpsc::UnboundedSender<GatewayPeer>>,
}

impl ScriptedGateway {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<GatewayPeer>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { peers: Some(tx) }), rx)
    }

    /// A connector whose every connection attempt fails.
    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self { peers: None })
    }
}

#[async_trait]
impl GatewayConnector for ScriptedGateway {
    async fn connect(&self) -> Result<GatewayConnection, RelayError> {
        let Some(peers) = &self.peers else {
            return Err(RelayError::Transport {
                transport: TransportKind::Gateway,
                message: "connection refused".into(),
                source: None,
            });
        };
        let (link, outbox) = Link::new(TransportKind::Gateway);
        let (events, rx) = unbounded();
        let _ = peers.send(GatewayPeer { outbox, events });
        Ok(GatewayConnection {
            link,
            events: rx.boxed(),
        })
    }
}

/// Two tenants: `acme` (default, with intro) and `globex` (silent intro).
pub fn tenants() -> TenantRegistry {
    let mut registry = TenantRegistry::new();
    registry
        .insert(TenantProfile::new(
            "acme",
            "Thanks for calling Acme Motors.",
            SessionProfile {
                voice: "alloy".into(),
                instructions: "You sell cars.".into(),
                ..SessionProfile::default()
            },
        ))
        .unwrap();
    registry
        .insert(TenantProfile::new(
            "globex",
            "",
            SessionProfile {
                voice: "verse".into(),
                instructions: "You book flights.".into(),
                ..SessionProfile::default()
            },
        ))
        .unwrap();
    registry.set_default("acme").unwrap();
    registry
}

pub fn state(connector: Arc<dyn GatewayConnector>) -> AppState {
    AppState::new(tenants(), connector, RelaySettings::default())
}
