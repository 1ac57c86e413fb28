// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-call relay between a telephony media stream and a realtime AI voice
//! gateway.
//!
//! A [`CallSession`] owns the call's [`StreamState`] and [`ResponseLedger`]
//! and runs two loops: caller audio to the gateway ([`AudioFrameRelay`]) and
//! gateway events back to the caller ([`ResponseRelay`],
//! [`InterruptionController`], [`ToolOrchestrator`]). Transports are plain
//! text-frame streams plus a [`Link`] per side, so the session is agnostic of
//! the websocket implementation on either leg.

pub mod bootstrap;
pub mod conversation;
pub mod inbound;
pub mod interruption;
pub mod ledger;
pub mod link;
pub mod orchestrator;
pub mod outbound;
pub mod protocol;
pub mod session;
pub mod settings;
pub mod state;

pub use bootstrap::{bootstrap, session_config};
pub use conversation::Conversation;
pub use inbound::AudioFrameRelay;
pub use interruption::InterruptionController;
pub use ledger::{LedgerHandle, ResponseLedger, ResponseRecord};
pub use link::{Link, Outbox};
pub use orchestrator::{ToolCall, ToolOrchestrator};
pub use outbound::ResponseRelay;
pub use session::CallSession;
pub use settings::RelaySettings;
pub use state::{InterruptionPlan, StateHandle, StreamState};
