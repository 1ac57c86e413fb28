// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Barge-in: the caller talks over the assistant.
//!
//! On `input_audio_buffer.speech_started` while AI audio is still queued on
//! the phone, the in-flight item is truncated at the point the caller had
//! actually heard, the bridge's playback buffer is cleared, and the response
//! bookkeeping is reset.

use tracing::{debug, info};
use voxrelay_core::RelayError;

use crate::link::Link;
use crate::protocol::{ClientEvent, TelephonyCommand};
use crate::state::{InterruptionPlan, StateHandle};

#[derive(Debug, Clone)]
pub struct InterruptionController {
    state: StateHandle,
    gateway: Link,
    telephony: Link,
    show_timing_math: bool,
}

impl InterruptionController {
    pub fn new(state: StateHandle, gateway: Link, telephony: Link, show_timing_math: bool) -> Self {
        Self {
            state,
            gateway,
            telephony,
            show_timing_math,
        }
    }

    /// Handles speech onset. Returns the plan that was executed, or `None`
    /// when no AI audio was playing.
    pub async fn on_speech_started(&self) -> Result<Option<InterruptionPlan>, RelayError> {
        let Some(plan) = self.state.lock().interruption_plan() else {
            debug!("speech started with nothing to interrupt");
            return Ok(None);
        };

        if self.show_timing_math {
            debug!(
                latest_media_timestamp_ms = plan.latest_media_timestamp_ms,
                response_start_timestamp_ms = plan.response_start_timestamp_ms,
                elapsed_ms = plan.audio_end_ms,
                "truncation math: {} - {} = {}ms",
                plan.latest_media_timestamp_ms,
                plan.response_start_timestamp_ms,
                plan.audio_end_ms,
            );
        }

        let sent = self.send(&plan).await;
        self.state.lock().reset_response();
        sent.map(|()| Some(plan))
    }

    /// Sends the truncate and the clear. The clear is attempted even when
    /// the truncate fails; the first error is returned.
    async fn send(&self, plan: &InterruptionPlan) -> Result<(), RelayError> {
        let truncated = match &plan.item_id {
            Some(item_id) => {
                info!(
                    item_id = item_id.as_str(),
                    elapsed_ms = plan.audio_end_ms,
                    "interrupting response"
                );
                self.gateway
                    .send_json(&ClientEvent::truncate(item_id.as_str(), plan.audio_end_ms))
                    .await
            }
            None => Ok(()),
        };
        let cleared = match &plan.stream_sid {
            Some(stream_sid) => {
                self.telephony
                    .send_json(&TelephonyCommand::clear(stream_sid.as_str()))
                    .await
            }
            None => Ok(()),
        };
        truncated.and(cleared)
    }
}
