// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Events exchanged with the realtime AI voice gateway.

use serde::{Deserialize, Serialize};
use voxrelay_core::{RelayError, TransportKind};

/// Gateway event types worth a debug line when they arrive.
pub const LOGGED_EVENT_TYPES: &[&str] = &[
    "error",
    "response.content.done",
    "rate_limits.updated",
    "response.done",
    "input_audio_buffer.committed",
    "input_audio_buffer.speech_stopped",
    "input_audio_buffer.speech_started",
    "session.created",
    "response.function_call_arguments.done",
    "conversation.item.created",
    "response.audio_transcript.done",
    "response.output_item.added",
    "response.content_part.done",
    "response.content_part.added",
];

/// Event sent to the AI gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionConfig },

    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend { audio: String },

    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate { item: ConversationItem },

    #[serde(rename = "response.create")]
    ResponseCreate {
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<ResponseOptions>,
    },

    #[serde(rename = "conversation.item.truncate")]
    ConversationItemTruncate {
        item_id: String,
        content_index: u32,
        audio_end_ms: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionConfig {
    pub turn_detection: serde_json::Value,
    pub input_audio_format: String,
    pub output_audio_format: String,
    pub voice: String,
    pub instructions: String,
    pub modalities: Vec<String>,
    pub temperature: f64,
    pub tools: Vec<serde_json::Value>,
    pub tool_choice: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationItem {
    Message {
        role: String,
        content: Vec<ContentPart>,
    },
    FunctionCallOutput {
        call_id: String,
        output: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    InputText { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseOptions {
    pub modalities: Vec<String>,
    pub instructions: String,
}

impl ClientEvent {
    pub fn append_audio(audio: impl Into<String>) -> Self {
        Self::InputAudioBufferAppend {
            audio: audio.into(),
        }
    }

    /// A user-role text message.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::ConversationItemCreate {
            item: ConversationItem::Message {
                role: "user".to_string(),
                content: vec![ContentPart::InputText { text: text.into() }],
            },
        }
    }

    pub fn function_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self::ConversationItemCreate {
            item: ConversationItem::FunctionCallOutput {
                call_id: call_id.into(),
                output: output.into(),
            },
        }
    }

    /// `response.create` with no overrides.
    pub fn create_response() -> Self {
        Self::ResponseCreate { response: None }
    }

    pub fn truncate(item_id: impl Into<String>, audio_end_ms: u64) -> Self {
        Self::ConversationItemTruncate {
            item_id: item_id.into(),
            content_index: 0,
            audio_end_ms,
        }
    }
}

/// Event received from the AI gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "session.created")]
    SessionCreated,

    #[serde(rename = "response.created")]
    ResponseCreated { response: ResponseRef },

    #[serde(rename = "response.done")]
    ResponseDone { response: ResponseRef },

    #[serde(rename = "response.audio.delta")]
    AudioDelta {
        delta: String,
        #[serde(default)]
        item_id: Option<String>,
    },

    #[serde(rename = "response.function_call_arguments.done")]
    FunctionCallArgumentsDone {
        call_id: String,
        name: String,
        #[serde(default)]
        arguments: String,
    },

    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted,

    #[serde(rename = "error")]
    Error { error: GatewayErrorDetail },

    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResponseRef {
    pub id: String,
    pub status: ResponseStatus,
}

/// Lifecycle status of a gateway response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    InProgress,
    Completed,
    Cancelled,
    Failed,
    Incomplete,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Parses a gateway frame, returning its raw `type` alongside the event.
pub fn parse_server_event(frame: &str) -> Result<(String, ServerEvent), RelayError> {
    let value: serde_json::Value = serde_json::from_str(frame).map_err(|e| protocol_error(&e))?;
    let event_type = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();
    let event = serde_json::from_value(value).map_err(|e| protocol_error(&e))?;
    Ok((event_type, event))
}

fn protocol_error(e: &serde_json::Error) -> RelayError {
    RelayError::Protocol {
        transport: TransportKind::Gateway,
        message: e.to_string(),
    }
}
