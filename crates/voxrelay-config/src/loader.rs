// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./voxrelay.toml` > `~/.config/voxrelay/voxrelay.toml` > `/etc/voxrelay/voxrelay.toml`
//! with environment variable overrides via `VOXRELAY_` prefix. The bare
//! `OPENAI_API_KEY` and `PORT` variables are honored below the prefixed ones.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use tracing::debug;

use crate::model::VoxrelayConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/voxrelay/voxrelay.toml` (system-wide)
/// 3. `~/.config/voxrelay/voxrelay.toml` (user XDG config)
/// 4. `./voxrelay.toml` (local directory)
/// 5. `OPENAI_API_KEY` / `PORT`
/// 6. `VOXRELAY_*` environment variables
pub fn load_config() -> Result<VoxrelayConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<VoxrelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VoxrelayConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VoxrelayConfig, figment::Error> {
    debug!(path = %path.display(), "loading configuration file");
    Figment::new()
        .merge(Serialized::defaults(VoxrelayConfig::default()))
        .merge(Toml::file(path))
        .merge(legacy_env_provider())
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(VoxrelayConfig::default()));
    for path in config_paths() {
        if path.is_file() {
            debug!(path = %path.display(), "loading configuration file");
        }
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(legacy_env_provider()).merge(env_provider())
}

/// Config file layers, lowest precedence first.
fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/voxrelay/voxrelay.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("voxrelay/voxrelay.toml"));
    }
    paths.push(PathBuf::from("voxrelay.toml"));
    paths
}

/// Maps the unprefixed variables older deployments set.
fn legacy_env_provider() -> Env {
    Env::raw()
        .only(&["OPENAI_API_KEY", "PORT"])
        .map(|key| {
            if key.as_str().eq_ignore_ascii_case("openai_api_key") {
                "realtime.api_key".into()
            } else {
                "server.port".into()
            }
        })
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` because key names contain
/// underscores: `VOXRELAY_REALTIME_API_KEY` must map to `realtime.api_key`,
/// not `realtime.api.key`.
fn env_provider() -> Env {
    Env::prefixed("VOXRELAY_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("server_", "server.", 1)
            .replacen("realtime_", "realtime.", 1)
            .replacen("relay_", "relay.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tracing_test::traced_test;

    #[test]
    fn layers_are_ordered_system_user_local() {
        let paths = config_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from("/etc/voxrelay/voxrelay.toml")));
        assert_eq!(paths.last(), Some(&PathBuf::from("voxrelay.toml")));
    }

    #[test]
    #[traced_test]
    fn explicit_file_is_logged_when_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[relay]\nmark_name = \"chunk\"").unwrap();

        let config = load_config_from_path(file.path()).unwrap();
        assert_eq!(config.relay.mark_name, "chunk");
        assert!(logs_contain("loading configuration file"));
    }
}
