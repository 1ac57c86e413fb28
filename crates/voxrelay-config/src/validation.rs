// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as URL schemes, non-zero intervals, and cross-references between tables.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::VoxrelayConfig;

/// Accepted range for the sampling temperature.
const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = 0.6..=1.2;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &VoxrelayConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(validation("server.host must not be empty"));
    }

    if config.server.port == 0 {
        errors.push(validation("server.port must not be 0"));
    }

    if let Some(public_url) = &config.server.public_url
        && !has_scheme(public_url, &["http", "https"])
    {
        errors.push(validation(format!(
            "server.public_url `{public_url}` must start with http:// or https://"
        )));
    }

    if let Some(default_tenant) = &config.server.default_tenant
        && !config.tenants.contains_key(default_tenant)
    {
        errors.push(validation(format!(
            "server.default_tenant `{default_tenant}` does not name a [tenants.*] table"
        )));
    }

    match config.realtime.api_key.as_deref().map(str::trim) {
        None | Some("") => errors.push(ConfigError::MissingKey {
            key: "realtime.api_key".to_string(),
        }),
        Some(_) => {}
    }

    if !has_scheme(&config.realtime.url, &["ws", "wss"]) {
        errors.push(validation(format!(
            "realtime.url `{}` must start with ws:// or wss://",
            config.realtime.url
        )));
    }

    if config.realtime.connect_timeout_secs == 0 {
        errors.push(validation("realtime.connect_timeout_secs must be greater than 0"));
    }

    if config.relay.stall_interval_ms == 0 {
        errors.push(validation("relay.stall_interval_ms must be greater than 0"));
    }

    if config.relay.stall_messages.iter().all(|m| m.trim().is_empty()) {
        errors.push(validation("relay.stall_messages must contain at least one message"));
    }

    if config.relay.mark_name.trim().is_empty() {
        errors.push(validation("relay.mark_name must not be empty"));
    }

    if !config.relay.answer_template.contains("{context}") {
        errors.push(validation(
            "relay.answer_template must contain the `{context}` placeholder",
        ));
    }

    for (key, tenant) in &config.tenants {
        if let Some(temperature) = tenant.session.temperature
            && !TEMPERATURE_RANGE.contains(&temperature)
        {
            errors.push(validation(format!(
                "tenants.{key}.session.temperature must be between 0.6 and 1.2, got {temperature}"
            )));
        }

        if let Some(path) = &tenant.instructions_file
            && path.trim().is_empty()
        {
            errors.push(validation(format!(
                "tenants.{key}.instructions_file must not be empty"
            )));
        }

        let mut seen = HashSet::new();
        for tool in &tenant.tools {
            let name = tool.name.trim();
            if name.is_empty() {
                errors.push(validation(format!(
                    "tenants.{key}.tools contains a tool with an empty name"
                )));
                continue;
            }
            if !seen.insert(name) {
                errors.push(validation(format!(
                    "tenants.{key}.tools declares `{name}` more than once"
                )));
            }
            if !has_scheme(&tool.endpoint, &["http", "https"]) {
                errors.push(validation(format!(
                    "tenants.{key}.tools `{name}` endpoint `{}` must start with http:// or https://",
                    tool.endpoint
                )));
            }
            if tool.timeout_secs == 0 {
                errors.push(validation(format!(
                    "tenants.{key}.tools `{name}` timeout_secs must be greater than 0"
                )));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    url.split_once("://")
        .is_some_and(|(scheme, rest)| !rest.is_empty() && schemes.contains(&scheme))
}
