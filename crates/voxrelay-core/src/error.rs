// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the voxrelay bridge.

use thiserror::Error;

use crate::types::TransportKind;

/// The primary error type shared by the relay, gateway and tool crates.
///
/// Every variant is scoped to a single call session. None of them is fatal
/// to the process; the binary only exits on configuration errors at startup.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Configuration errors (missing credential, bad tenant definition).
    #[error("configuration error: {0}")]
    Config(String),

    /// A transport failed to connect or to deliver a frame.
    #[error("{transport} transport error: {message}")]
    Transport {
        transport: TransportKind,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The transport has already been closed. Expected during teardown.
    #[error("{0} transport is closed")]
    Closed(TransportKind),

    /// An inbound frame could not be parsed.
    #[error("malformed {transport} frame: {message}")]
    Protocol {
        transport: TransportKind,
        message: String,
    },

    /// A tool invocation failed.
    #[error("tool `{name}` failed: {message}")]
    Tool {
        name: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No tool is registered under the requested name.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns true for errors that only signal an orderly disconnect.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, RelayError::Closed(_))
    }
}
