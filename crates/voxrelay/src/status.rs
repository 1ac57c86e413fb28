// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `voxrelay status` command implementation.
//!
//! Asks a running server's `/health` endpoint how many calls it is bridging.
//! An unreachable server is reported, not treated as an error.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use voxrelay_config::VoxrelayConfig;
use voxrelay_core::RelayError;

/// Body of `GET /health`.
#[derive(Debug, Deserialize)]
struct HealthBody {
    status: String,
    version: String,
    uptime_secs: u64,
    active_calls: usize,
    tenants: usize,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize, PartialEq)]
pub struct StatusReport {
    pub running: bool,
    pub endpoint: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
    pub active_calls: usize,
    pub tenants: usize,
}

impl StatusReport {
    fn offline(endpoint: String) -> Self {
        Self {
            running: false,
            endpoint,
            status: "not running".to_string(),
            version: None,
            uptime: None,
            active_calls: 0,
            tenants: 0,
        }
    }
}

/// Run the `voxrelay status` command.
pub async fn run_status(config: &VoxrelayConfig, json: bool) -> Result<(), RelayError> {
    let report = fetch_status(&health_url(config)).await?;
    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| RelayError::Internal(format!("failed to render status: {e}")))?;
        println!("{rendered}");
    } else {
        print!("{}", render(&report));
    }
    Ok(())
}

/// Health URL of the locally configured server. A wildcard bind address is
/// queried over loopback.
fn health_url(config: &VoxrelayConfig) -> String {
    let host = match config.server.host.as_str() {
        "0.0.0.0" | "::" | "[::]" => "127.0.0.1",
        host => host,
    };
    format!("http://{host}:{}/health", config.server.port)
}

async fn fetch_status(url: &str) -> Result<StatusReport, RelayError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .map_err(|e| RelayError::Internal(format!("failed to create HTTP client: {e}")))?;

    let response = match client.get(url).send().await {
        Ok(response) if response.status().is_success() => response,
        _ => return Ok(StatusReport::offline(url.to_string())),
    };
    let health: HealthBody = response
        .json()
        .await
        .map_err(|e| RelayError::Internal(format!("failed to parse health response: {e}")))?;

    Ok(StatusReport {
        running: true,
        endpoint: url.to_string(),
        status: health.status,
        version: Some(health.version),
        uptime: Some(format_uptime(health.uptime_secs)),
        active_calls: health.active_calls,
        tenants: health.tenants,
    })
}

fn render(report: &StatusReport) -> String {
    let mut out = format!("\n  voxrelay status\n  {}\n", "-".repeat(35));
    if report.running {
        out.push_str(&format!(
            "    State:    [OK] {} (uptime: {})\n",
            report.status,
            report.uptime.as_deref().unwrap_or("?")
        ));
        out.push_str(&format!(
            "    Calls:    {} active across {} tenants\n",
            report.active_calls, report.tenants
        ));
    } else {
        out.push_str("    State:    [FAIL] not running\n");
        out.push_str(&format!("    Endpoint: {}\n", report.endpoint));
        out.push_str("\n  Start with: voxrelay serve\n");
    }
    out.push('\n');
    out
}

/// Format seconds into a human-readable duration string.
fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
