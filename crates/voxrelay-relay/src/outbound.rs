// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway audio -> telephony direction, with flow-control marks.

use tracing::{debug, trace};
use voxrelay_core::RelayError;

use crate::link::Link;
use crate::protocol::TelephonyCommand;
use crate::state::StateHandle;

/// Plays AI audio deltas to the caller, one mark per delta.
#[derive(Debug, Clone)]
pub struct ResponseRelay {
    state: StateHandle,
    telephony: Link,
    mark_name: String,
}

impl ResponseRelay {
    pub fn new(state: StateHandle, telephony: Link, mark_name: impl Into<String>) -> Self {
        Self {
            state,
            telephony,
            mark_name: mark_name.into(),
        }
    }

    /// Forwards one audio delta as a media frame followed by a mark.
    ///
    /// Deltas that arrive before the stream has started have nowhere to go
    /// and are dropped.
    pub async fn forward_delta(&self, delta: String, item_id: Option<&str>) -> Result<(), RelayError> {
        let stream_sid = {
            let mut state = self.state.lock();
            let Some(sid) = state.stream_sid.clone() else {
                debug!("audio delta before stream start, dropping");
                return Ok(());
            };
            state.begin_playback(item_id);
            sid
        };

        self.telephony
            .send_json(&TelephonyCommand::media(stream_sid, delta))
            .await?;
        self.send_mark().await
    }

    /// Records a pending mark, then sends it. Skipped before the stream has
    /// started.
    pub async fn send_mark(&self) -> Result<(), RelayError> {
        let Some(stream_sid) = self.state.lock().push_mark(&self.mark_name) else {
            return Ok(());
        };
        trace!(stream_sid = stream_sid.as_str(), "sending mark");
        self.telephony
            .send_json(&TelephonyCommand::mark(stream_sid, self.mark_name.as_str()))
            .await
    }
}
