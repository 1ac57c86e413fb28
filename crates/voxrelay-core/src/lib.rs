// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the voxrelay telephony bridge.
//!
//! Holds the error type and the per-call session types shared by the relay
//! core, the tool registry and the call-acceptance layer.

pub mod error;
pub mod types;

pub use error::RelayError;
pub use types::{SessionProfile, SessionSettings, TransportKind};
