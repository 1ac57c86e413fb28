// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `voxrelay config` command implementation.
//!
//! Configuration has already been loaded and validated by the time this
//! runs; it prints the effective settings with the credential redacted.

use voxrelay_config::VoxrelayConfig;

/// Renders the effective configuration as TOML.
///
/// `realtime.api_key` is never serialized, so a redaction marker is appended
/// in its place.
pub fn summary(config: &VoxrelayConfig) -> String {
    let mut out = String::from("# effective voxrelay configuration (validated)\n");
    match toml::to_string_pretty(config) {
        Ok(rendered) => out.push_str(&rendered),
        Err(e) => out.push_str(&format!("# failed to render configuration: {e}\n")),
    }
    let key_state = match &config.realtime.api_key {
        Some(_) => "[redacted]",
        None => "[missing]",
    };
    out.push_str(&format!("\n# realtime.api_key = {key_state}\n"));
    out
}
