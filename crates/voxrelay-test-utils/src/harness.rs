// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call harness for end-to-end relay testing.
//!
//! `CallHarness` starts a real [`CallSession`] wired to in-memory transports.
//! Tests push telephony and gateway frames in, and read what the session
//! wrote to each side back out as JSON values.

use std::sync::Arc;
use std::time::Duration;

use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::FutureExt;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use voxrelay_core::{RelayError, SessionProfile, TransportKind};
use voxrelay_relay::{CallSession, LedgerHandle, Link, Outbox, RelaySettings, StateHandle};
use voxrelay_tools::{Tool, ToolRegistry};

/// How long `next_*` waits for a frame before giving up.
const RECV_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for a [`CallHarness`].
pub struct CallHarnessBuilder {
    profile: SessionProfile,
    tools: Vec<Arc<dyn Tool>>,
    settings: RelaySettings,
}

impl CallHarnessBuilder {
    fn new() -> Self {
        Self {
            profile: SessionProfile {
                voice: "alloy".to_string(),
                instructions: "You are a test assistant.".to_string(),
                ..SessionProfile::default()
            },
            tools: Vec::new(),
            settings: RelaySettings::default(),
        }
    }

    /// Replace the session profile.
    pub fn with_profile(mut self, profile: SessionProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Let the AI speak first with `greeting`.
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.profile.greeting = Some(greeting.into());
        self
    }

    /// Register a tool the model may call.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Replace the relay settings.
    pub fn with_settings(mut self, settings: RelaySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Start the session. Must be called inside a tokio runtime.
    pub fn start(self) -> Result<CallHarness, RelayError> {
        let mut registry = ToolRegistry::new();
        for tool in self.tools {
            registry.register(tool)?;
        }
        let mut profile = self.profile;
        if profile.tools_schema.is_empty() {
            profile.tools_schema = registry.function_schemas();
        }

        let session = CallSession::new(Arc::new(profile), Arc::new(registry), Arc::new(self.settings));
        let state = session.state();
        let ledger = session.ledger();

        let (telephony_in, telephony_frames) = unbounded::<String>();
        let (gateway_in, gateway_events) = unbounded::<String>();
        let (telephony, telephony_out) = Link::new(TransportKind::Telephony);
        let (gateway, gateway_out) = Link::new(TransportKind::Gateway);

        let task = tokio::spawn(session.run(
            telephony_frames,
            telephony.clone(),
            gateway_events,
            gateway.clone(),
        ));

        Ok(CallHarness {
            telephony_in,
            gateway_in,
            telephony_out,
            gateway_out,
            telephony,
            gateway,
            state,
            ledger,
            task,
        })
    }
}

/// A live call session with scriptable in-memory transports.
pub struct CallHarness {
    telephony_in: UnboundedSender<String>,
    gateway_in: UnboundedSender<String>,
    telephony_out: Outbox,
    gateway_out: Outbox,
    /// Telephony link, as seen by the session.
    pub telephony: Link,
    /// Gateway link, as seen by the session.
    pub gateway: Link,
    /// The session's stream state.
    pub state: StateHandle,
    /// The session's response ledger.
    pub ledger: LedgerHandle,
    task: JoinHandle<Result<(), RelayError>>,
}

impl CallHarness {
    /// Create a new builder for configuring the harness.
    pub fn builder() -> CallHarnessBuilder {
        CallHarnessBuilder::new()
    }

    /// Push a raw telephony frame into the session.
    pub fn send_telephony_raw(&self, frame: impl Into<String>) {
        // A closed channel means the session already ended; tests assert on
        // that through the outboxes.
        let _ = self.telephony_in.unbounded_send(frame.into());
    }

    /// Push a raw gateway frame into the session.
    pub fn send_gateway_raw(&self, frame: impl Into<String>) {
        let _ = self.gateway_in.unbounded_send(frame.into());
    }

    pub fn send_telephony(&self, event: Value) {
        self.send_telephony_raw(event.to_string());
    }

    pub fn send_gateway(&self, event: Value) {
        self.send_gateway_raw(event.to_string());
    }

    /// Telephony `start` for `stream_sid`.
    pub fn start_stream(&self, stream_sid: &str) {
        self.send_telephony(json!({
            "event": "start",
            "start": { "streamSid": stream_sid }
        }));
    }

    /// Caller audio at `timestamp_ms`, sent as the bridge does (string timestamp).
    pub fn caller_media(&self, timestamp_ms: u64, payload: &str) {
        self.send_telephony(json!({
            "event": "media",
            "media": { "timestamp": timestamp_ms.to_string(), "payload": payload }
        }));
    }

    /// Telephony acknowledging one mark.
    pub fn ack_mark(&self) {
        self.send_telephony(json!({ "event": "mark", "mark": { "name": "responsePart" } }));
    }

    pub fn audio_delta(&self, item_id: &str, delta: &str) {
        self.send_gateway(json!({
            "type": "response.audio.delta",
            "item_id": item_id,
            "delta": delta
        }));
    }

    pub fn speech_started(&self) {
        self.send_gateway(json!({ "type": "input_audio_buffer.speech_started" }));
    }

    pub fn response_status(&self, created: bool, response_id: &str, status: &str) {
        let kind = if created { "response.created" } else { "response.done" };
        self.send_gateway(json!({
            "type": kind,
            "response": { "id": response_id, "status": status }
        }));
    }

    pub fn function_call(&self, call_id: &str, name: &str, arguments: Value) {
        self.send_gateway(json!({
            "type": "response.function_call_arguments.done",
            "call_id": call_id,
            "name": name,
            "arguments": arguments.to_string()
        }));
    }

    /// Next frame the session wrote to the gateway.
    pub async fn next_gateway(&mut self) -> Option<Value> {
        next_frame(&mut self.gateway_out).await
    }

    /// Next frame the session wrote to telephony.
    pub async fn next_telephony(&mut self) -> Option<Value> {
        next_frame(&mut self.telephony_out).await
    }

    /// Everything already written to the gateway.
    pub fn drain_gateway(&mut self) -> Vec<Value> {
        drain(&mut self.gateway_out)
    }

    /// Everything already written to telephony.
    pub fn drain_telephony(&mut self) -> Vec<Value> {
        drain(&mut self.telephony_out)
    }

    /// Lets the session work through everything queued so far.
    ///
    /// Exact under `start_paused`, where the clock only advances once every
    /// task is idle.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    /// The caller hangs up: the telephony stream ends.
    pub fn hang_up(&self) {
        self.telephony_in.close_channel();
    }

    /// The gateway drops the connection.
    pub fn drop_gateway(&self) {
        self.gateway_in.close_channel();
    }

    /// Waits for the session to end and returns its result.
    pub async fn join(self) -> Result<(), RelayError> {
        tokio::time::timeout(RECV_TIMEOUT, self.task)
            .await
            .map_err(|_| RelayError::Timeout {
                duration: RECV_TIMEOUT,
            })?
            .map_err(|e| RelayError::Internal(format!("session task failed: {e}")))?
    }
}

async fn next_frame(outbox: &mut Outbox) -> Option<Value> {
    let frame = tokio::time::timeout(RECV_TIMEOUT, outbox.recv())
        .await
        .ok()
        .flatten()?;
    serde_json::from_str(&frame).ok()
}

fn drain(outbox: &mut Outbox) -> Vec<Value> {
    let mut frames = Vec::new();
    while let Some(frame) = outbox.recv().now_or_never().flatten() {
        if let Ok(value) = serde_json::from_str(&frame) {
            frames.push(value);
        }
    }
    frames
}
