// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the relay core and the call-acceptance layer.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Default audio format on both legs: 8 kHz G.711 mu-law, what the phone
/// network bridge streams.
pub const DEFAULT_AUDIO_FORMAT: &str = "g711_ulaw";

/// Default sampling temperature for the voice model.
pub const DEFAULT_TEMPERATURE: f64 = 0.8;

/// Identifies which side of a call a frame or error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TransportKind {
    /// The phone-network media stream.
    Telephony,
    /// The conversational AI voice endpoint.
    Gateway,
}

/// Advanced session settings. Every field falls back to a default when unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSettings {
    /// Turn detection object, e.g. `{"type": "server_vad"}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl SessionSettings {
    pub fn turn_detection_or_default(&self) -> serde_json::Value {
        self.turn_detection
            .clone()
            .unwrap_or_else(|| serde_json::json!({ "type": "server_vad" }))
    }

    pub fn input_audio_format_or_default(&self) -> String {
        self.input_audio_format
            .clone()
            .unwrap_or_else(|| DEFAULT_AUDIO_FORMAT.to_string())
    }

    pub fn output_audio_format_or_default(&self) -> String {
        self.output_audio_format
            .clone()
            .unwrap_or_else(|| DEFAULT_AUDIO_FORMAT.to_string())
    }

    pub fn modalities_or_default(&self) -> Vec<String> {
        self.modalities
            .clone()
            .unwrap_or_else(|| vec!["text".to_string(), "audio".to_string()])
    }

    pub fn temperature_or_default(&self) -> f64 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }
}

/// Everything the relay needs to configure the AI side of one call.
///
/// Resolved once per call from the tenant registry and never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionProfile {
    /// Voice identity used by the AI gateway.
    pub voice: String,
    /// System instructions for the voice model.
    pub instructions: String,
    /// Optional AI-speaks-first prompt.
    pub greeting: Option<String>,
    /// Advanced session settings.
    pub settings: SessionSettings,
    /// Tool schema advertised to the model.
    pub tools_schema: Vec<serde_json::Value>,
}
