// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call acceptance for voxrelay.
//!
//! Answers the phone network's incoming-call webhook with markup that opens
//! a media stream back to us, accepts that stream as a websocket and bridges
//! it to a fresh AI gateway connection through a relay [`CallSession`].
//!
//! [`CallSession`]: voxrelay_relay::CallSession

pub mod handlers;
pub mod realtime;
pub mod server;
pub mod tenants;
pub mod twiml;
pub mod ws;

pub use realtime::{GatewayConnection, GatewayConnector, RealtimeConnector};
pub use server::{router, serve, start_server, ActiveCall, AppState, ServerConfig};
pub use tenants::{TenantProfile, TenantRegistry};
