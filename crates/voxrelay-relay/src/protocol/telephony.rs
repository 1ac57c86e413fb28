// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media-stream frames exchanged with the phone-network bridge.
//!
//! Inbound:
//! ```json
//! {"event": "start", "start": {"streamSid": "MZ..."}}
//! {"event": "media", "media": {"timestamp": "1280", "payload": "<base64 mu-law>"}}
//! {"event": "mark", "mark": {"name": "responsePart"}}
//! ```
//!
//! Outbound:
//! ```json
//! {"event": "media", "streamSid": "MZ...", "media": {"payload": "..."}}
//! {"event": "mark", "streamSid": "MZ...", "mark": {"name": "responsePart"}}
//! {"event": "clear", "streamSid": "MZ..."}
//! ```

use serde::{Deserialize, Deserializer, Serialize};

/// Event received from the telephony transport.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyEvent {
    Connected,
    Start { start: StreamStart },
    Media { media: InboundMedia },
    Mark {
        #[serde(default)]
        mark: Option<MarkLabel>,
    },
    Stop,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStart {
    pub stream_sid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InboundMedia {
    /// Milliseconds since the stream started. Sent as a string by the bridge.
    #[serde(deserialize_with = "timestamp_ms")]
    pub timestamp: u64,
    /// Base64 audio, passed through untouched.
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkLabel {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMedia {
    pub payload: String,
}

/// Frame sent to the telephony transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyCommand {
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: OutboundMedia,
    },
    Mark {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        mark: MarkLabel,
    },
    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

impl TelephonyCommand {
    pub fn media(stream_sid: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::Media {
            stream_sid: stream_sid.into(),
            media: OutboundMedia {
                payload: payload.into(),
            },
        }
    }

    pub fn mark(stream_sid: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Mark {
            stream_sid: stream_sid.into(),
            mark: MarkLabel { name: name.into() },
        }
    }

    pub fn clear(stream_sid: impl Into<String>) -> Self {
        Self::Clear {
            stream_sid: stream_sid.into(),
        }
    }
}

fn timestamp_ms<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp `{s}`: {e}"))),
    }
}
