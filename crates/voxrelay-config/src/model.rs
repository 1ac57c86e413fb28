// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the voxrelay bridge.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use voxrelay_core::SessionSettings;

/// Top-level voxrelay configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VoxrelayConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// AI gateway connection settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Relay behavior shared by every call.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Tenants keyed by the path segment used in `/incoming-call/{tenant}`.
    #[serde(default)]
    pub tenants: BTreeMap<String, TenantConfig>,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Public base URL the phone network reaches us on, e.g.
    /// `https://voice.example.com`. When unset the request `Host` header is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,

    /// Tenant whose intro the index page reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_tenant: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
            default_tenant: None,
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// AI gateway (realtime voice endpoint) configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RealtimeConfig {
    /// Websocket URL of the realtime endpoint, including the model query.
    #[serde(default = "default_realtime_url")]
    pub url: String,

    /// Bearer credential. Required; never written back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Value of the `OpenAI-Beta` header. Empty disables the header.
    #[serde(default = "default_beta_header")]
    pub beta_header: String,

    /// Seconds to wait for the gateway handshake.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: default_realtime_url(),
            api_key: None,
            beta_header: default_beta_header(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for RealtimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("beta_header", &self.beta_header)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

fn default_realtime_url() -> String {
    "wss://api.openai.com/v1/realtime?model=gpt-4o-realtime-preview-2024-12-17".to_string()
}

fn default_beta_header() -> String {
    "realtime=v1".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Per-call relay behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Interval between stalling utterances while a tool runs.
    #[serde(default = "default_stall_interval_ms")]
    pub stall_interval_ms: u64,

    /// Filler phrases, spoken in rotation while a tool runs.
    #[serde(default = "default_stall_messages")]
    pub stall_messages: Vec<String>,

    /// Name carried by every flow-control mark sent to telephony.
    #[serde(default = "default_mark_name")]
    pub mark_name: String,

    /// Instructions for the answer that follows a tool result.
    /// `{context}` is replaced with the tool output.
    #[serde(default = "default_answer_template")]
    pub answer_template: String,

    /// Log the barge-in truncation arithmetic at debug level.
    #[serde(default)]
    pub show_timing_math: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            stall_interval_ms: default_stall_interval_ms(),
            stall_messages: default_stall_messages(),
            mark_name: default_mark_name(),
            answer_template: default_answer_template(),
            show_timing_math: false,
        }
    }
}

fn default_stall_interval_ms() -> u64 {
    2000
}

fn default_stall_messages() -> Vec<String> {
    [
        "I'm processing your request, this will just take a moment...",
        "Working on getting that information for you...",
        "Almost there, retrieving the data you need...",
        "Just a few more seconds while I gather the details...",
        "Processing your request, thank you for your patience...",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_mark_name() -> String {
    "responsePart".to_string()
}

fn default_answer_template() -> String {
    "Formulate an answer strictly based on the provided context without adding external \
     knowledge or assumptions. Context: {context}. Be concise and friendly."
        .to_string()
}

/// One tenant: a voice persona plus the tools it may call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TenantConfig {
    /// Text spoken by the phone network before the AI joins. Empty skips it.
    #[serde(default)]
    pub intro: String,

    /// Voice identity (alloy, ash, ballad, coral, echo, sage, shimmer, verse).
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Inline system instructions. Overridden by `instructions_file` if both set.
    #[serde(default)]
    pub instructions: String,

    /// Path to a file containing the system instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions_file: Option<String>,

    /// Prompt that makes the AI speak first. Unset means the caller speaks first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,

    /// Advanced session settings.
    #[serde(default)]
    pub session: SessionSettings,

    /// Tools the model may call during this tenant's calls.
    #[serde(default)]
    pub tools: Vec<ToolConfig>,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            intro: String::new(),
            voice: default_voice(),
            instructions: String::new(),
            instructions_file: None,
            greeting: None,
            session: SessionSettings::default(),
            tools: Vec::new(),
        }
    }
}

fn default_voice() -> String {
    "alloy".to_string()
}

impl TenantConfig {
    /// Returns the system instructions, reading `instructions_file` when set.
    pub fn resolve_instructions(&self) -> std::io::Result<String> {
        match &self.instructions_file {
            Some(path) => std::fs::read_to_string(path),
            None => Ok(self.instructions.clone()),
        }
    }
}

/// An HTTP-backed tool declaration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    /// Function name the model calls.
    pub name: String,

    /// What the tool does, shown to the model.
    #[serde(default)]
    pub description: String,

    /// JSON Schema for the arguments object.
    #[serde(default = "default_tool_parameters")]
    pub parameters: serde_json::Value,

    /// Endpoint the arguments are sent to.
    pub endpoint: String,

    /// HTTP method.
    #[serde(default = "default_tool_method")]
    pub method: String,

    /// Request timeout in seconds.
    #[serde(default = "default_tool_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_tool_parameters() -> serde_json::Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

fn default_tool_method() -> String {
    "POST".to_string()
}

fn default_tool_timeout_secs() -> u64 {
    30
}
