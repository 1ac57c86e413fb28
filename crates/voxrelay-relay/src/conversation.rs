// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synthetic user turns injected into the AI conversation.

use tracing::debug;
use voxrelay_core::RelayError;

use crate::ledger::LedgerHandle;
use crate::link::Link;
use crate::protocol::ClientEvent;

/// Writes user-role prompts to the gateway, gated on the response ledger.
#[derive(Debug, Clone)]
pub struct Conversation {
    gateway: Link,
    ledger: LedgerHandle,
}

impl Conversation {
    pub fn new(gateway: Link, ledger: LedgerHandle) -> Self {
        Self { gateway, ledger }
    }

    /// Injects `text` and requests a response, unless a response is in progress.
    ///
    /// Returns whether the prompt was sent.
    pub async fn inject(&self, text: &str) -> Result<bool, RelayError> {
        if self.ledger.is_latest_in_progress() {
            debug!(text, "response in progress, skipping injected prompt");
            return Ok(false);
        }
        self.inject_unconditionally(text).await?;
        Ok(true)
    }

    /// Injects `text` and requests a response regardless of the ledger.
    pub async fn inject_unconditionally(&self, text: &str) -> Result<(), RelayError> {
        self.gateway.send_json(&ClientEvent::user_text(text)).await?;
        self.gateway.send_json(&ClientEvent::create_response()).await
    }

    pub fn gateway(&self) -> &Link {
        &self.gateway
    }

    pub fn ledger(&self) -> &LedgerHandle {
        &self.ledger
    }
}
