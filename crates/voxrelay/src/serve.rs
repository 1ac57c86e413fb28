// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `voxrelay serve` command implementation.
//!
//! Turns the validated configuration into tenant profiles, relay settings
//! and a gateway connector, then serves until SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tracing::{info, warn};
use voxrelay_config::{RealtimeConfig, RelayConfig, TenantConfig, VoxrelayConfig};
use voxrelay_core::{RelayError, SessionProfile};
use voxrelay_gateway::{
    start_server, AppState, RealtimeConnector, ServerConfig, TenantProfile, TenantRegistry,
};
use voxrelay_relay::RelaySettings;
use voxrelay_tools::builtin::{HttpTool, HttpToolSpec};
use voxrelay_tools::ToolRegistry;

use crate::shutdown;

/// Runs the relay server until a shutdown signal arrives.
pub async fn run_serve(config: VoxrelayConfig) -> Result<(), RelayError> {
    init_tracing(&config.server.log_level);
    info!(version = env!("CARGO_PKG_VERSION"), "voxrelay starting");

    let tenants = build_tenants(&config)?;
    if tenants.is_empty() {
        warn!("no tenants configured, every incoming call will be refused");
    }
    let connector = build_connector(&config.realtime)?;
    let cancel = shutdown::install_signal_handler();

    let state = AppState::new(tenants, Arc::new(connector), relay_settings(&config.relay))
        .with_public_url(config.server.public_url.clone())
        .with_shutdown(cancel);
    let server = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    start_server(&server, state).await?;

    info!("voxrelay serve shutdown complete");
    Ok(())
}

/// Builds the gateway connector. The credential must be present.
pub fn build_connector(realtime: &RealtimeConfig) -> Result<RealtimeConnector, RelayError> {
    let api_key = realtime
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| RelayError::Config("realtime.api_key is required".into()))?;

    Ok(
        RealtimeConnector::new(realtime.url.as_str(), SecretString::from(api_key))
            .with_beta_header(realtime.beta_header.as_str())
            .with_connect_timeout(Duration::from_secs(realtime.connect_timeout_secs)),
    )
}

pub fn relay_settings(relay: &RelayConfig) -> RelaySettings {
    RelaySettings {
        stall_interval: Duration::from_millis(relay.stall_interval_ms),
        stall_messages: relay.stall_messages.clone(),
        mark_name: relay.mark_name.clone(),
        answer_template: relay.answer_template.clone(),
        show_timing_math: relay.show_timing_math,
    }
}

/// Resolves every configured tenant into an immutable profile.
pub fn build_tenants(config: &VoxrelayConfig) -> Result<TenantRegistry, RelayError> {
    let mut registry = TenantRegistry::new();
    for (key, tenant) in &config.tenants {
        registry.insert(build_tenant(key, tenant)?)?;
    }
    if let Some(default) = &config.server.default_tenant {
        registry.set_default(default.as_str())?;
    }
    Ok(registry)
}

fn build_tenant(key: &str, tenant: &TenantConfig) -> Result<TenantProfile, RelayError> {
    let instructions = tenant.resolve_instructions().map_err(|e| {
        RelayError::Config(format!("tenant `{key}`: cannot read instructions_file: {e}"))
    })?;

    let mut tools = ToolRegistry::new();
    for tool in &tenant.tools {
        let http = HttpTool::new(HttpToolSpec {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
            endpoint: tool.endpoint.clone(),
            method: tool.method.clone(),
            timeout: Duration::from_secs(tool.timeout_secs),
        })?;
        tools.register(Arc::new(http))?;
    }

    let session = SessionProfile {
        voice: tenant.voice.clone(),
        instructions,
        greeting: tenant
            .greeting
            .clone()
            .filter(|greeting| !greeting.trim().is_empty()),
        settings: tenant.session.clone(),
        tools_schema: Vec::new(),
    };
    info!(tenant = key, tools = tools.len(), "tenant loaded");
    Ok(TenantProfile::new(key, tenant.intro.as_str(), session).with_tools(tools))
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("voxrelay={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config(toml: &str) -> VoxrelayConfig {
        voxrelay_config::load_config_from_str(toml).unwrap()
    }

    #[test]
    fn tenants_are_built_with_tools_and_instructions_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "You sell cars at Acme.").unwrap();

        let config = config(&format!(
            r#"
            [server]
            default_tenant = "acme"

            [tenants.acme]
            intro = "Thanks for calling Acme."
            voice = "coral"
            instructions = "ignored"
            instructions_file = "{}"
            greeting = "Greet the caller."

            [[tenants.acme.tools]]
            name = "check_inventory"
            description = "Look up stock"
            endpoint = "https://inventory.example.com/lookup"

            [tenants.globex]
            greeting = "   "
            "#,
            file.path().display()
        ));

        let registry = build_tenants(&config).unwrap();
        assert_eq!(registry.keys(), vec!["acme", "globex"]);

        let acme = registry.default_tenant().unwrap();
        assert_eq!(acme.key, "acme");
        assert_eq!(acme.intro, "Thanks for calling Acme.");
        assert_eq!(acme.session.voice, "coral");
        assert_eq!(acme.session.instructions, "You sell cars at Acme.");
        assert_eq!(acme.session.greeting.as_deref(), Some("Greet the caller."));
        assert_eq!(acme.session.tools_schema[0]["name"], "check_inventory");
        assert!(acme.tools.get("check_inventory").is_some());

        let globex = registry.get("globex").unwrap();
        assert_eq!(globex.session.voice, "alloy");
        assert!(globex.session.greeting.is_none());
        assert!(globex.session.tools_schema.is_empty());
    }

    #[test]
    fn missing_instructions_file_is_a_config_error() {
        let config = config(
            r#"
            [tenants.acme]
            instructions_file = "/nonexistent/voxrelay/instructions.txt"
            "#,
        );
        let err = build_tenants(&config).unwrap_err();
        assert!(matches!(err, RelayError::Config(msg) if msg.contains("acme")));
    }

    #[test]
    fn relay_settings_follow_config() {
        let config = config(
            r#"
            [relay]
            stall_interval_ms = 1500
            stall_messages = ["One moment."]
            mark_name = "chunk"
            show_timing_math = true
            "#,
        );
        let settings = relay_settings(&config.relay);
        assert_eq!(settings.stall_interval, Duration::from_millis(1500));
        assert_eq!(settings.stall_prompt(3), "Respond to the user with wait message. One moment.");
        assert_eq!(settings.mark_name, "chunk");
        assert!(settings.show_timing_math);
        assert_eq!(
            settings.answer_template,
            RelaySettings::default().answer_template
        );
    }

    #[test]
    fn connector_requires_api_key() {
        let mut realtime = RealtimeConfig::default();
        assert!(matches!(
            build_connector(&realtime),
            Err(RelayError::Config(_))
        ));

        realtime.api_key = Some("sk-live".into());
        let request = build_connector(&realtime).unwrap().request().unwrap();
        assert_eq!(request.headers()["authorization"], "Bearer sk-live");
        assert_eq!(request.headers()["openai-beta"], "realtime=v1");
    }
}
