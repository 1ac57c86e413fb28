// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant registry.
//!
//! Each tenant is a phone-facing persona: the intro the phone network reads
//! out, the AI session profile and the tools the model may call. Profiles are
//! built once at startup and shared read-only by every call.

use std::collections::HashMap;
use std::sync::Arc;

use voxrelay_core::{RelayError, SessionProfile};
use voxrelay_tools::ToolRegistry;

/// Immutable per-tenant settings resolved once per call.
#[derive(Debug, Clone)]
pub struct TenantProfile {
    /// Path segment used in `/incoming-call/{tenant}`.
    pub key: String,
    /// Spoken by the phone network before the stream connects. Empty skips it.
    pub intro: String,
    pub session: Arc<SessionProfile>,
    pub tools: Arc<ToolRegistry>,
}

impl TenantProfile {
    pub fn new(key: impl Into<String>, intro: impl Into<String>, session: SessionProfile) -> Self {
        Self {
            key: key.into(),
            intro: intro.into(),
            session: Arc::new(session),
            tools: Arc::new(ToolRegistry::new()),
        }
    }

    /// Attaches `tools`, advertising their schemas unless the session
    /// profile already carries an explicit tool list.
    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        if self.session.tools_schema.is_empty() && !tools.is_empty() {
            Arc::make_mut(&mut self.session).tools_schema = tools.function_schemas();
        }
        self.tools = Arc::new(tools);
        self
    }
}

/// Tenants keyed by their path segment.
#[derive(Debug, Default)]
pub struct TenantRegistry {
    tenants: HashMap<String, Arc<TenantProfile>>,
    default_key: Option<String>,
}

impl TenantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tenant. Blank and duplicate keys are rejected.
    pub fn insert(&mut self, profile: TenantProfile) -> Result<(), RelayError> {
        if profile.key.trim().is_empty() {
            return Err(RelayError::Config("tenant key must not be empty".into()));
        }
        if self.tenants.contains_key(&profile.key) {
            return Err(RelayError::Config(format!(
                "tenant `{}` is defined twice",
                profile.key
            )));
        }
        self.tenants.insert(profile.key.clone(), Arc::new(profile));
        Ok(())
    }

    /// Marks `key` as the tenant the index page reports on.
    pub fn set_default(&mut self, key: impl Into<String>) -> Result<(), RelayError> {
        let key = key.into();
        if !self.tenants.contains_key(&key) {
            return Err(RelayError::Config(format!(
                "default tenant `{key}` is not defined"
            )));
        }
        self.default_key = Some(key);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<Arc<TenantProfile>> {
        self.tenants.get(key).cloned()
    }

    /// The configured default tenant, or the only tenant when there is one.
    pub fn default_tenant(&self) -> Option<Arc<TenantProfile>> {
        match &self.default_key {
            Some(key) => self.get(key),
            None if self.tenants.len() == 1 => self.tenants.values().next().cloned(),
            None => None,
        }
    }

    /// Tenant keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.tenants.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxrelay_tools::{FnTool, Tool};

    fn profile(key: &str) -> TenantProfile {
        TenantProfile::new(key, format!("Welcome to {key}"), SessionProfile::default())
    }

    #[test]
    fn insert_and_lookup() {
        let mut registry = TenantRegistry::new();
        registry.insert(profile("acme")).unwrap();
        registry.insert(profile("globex")).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("acme").unwrap().intro, "Welcome to acme");
        assert!(registry.get("initech").is_none());
        assert_eq!(registry.keys(), vec!["acme", "globex"]);
    }

    #[test]
    fn rejects_blank_and_duplicate_keys() {
        let mut registry = TenantRegistry::new();
        registry.insert(profile("acme")).unwrap();
        assert!(matches!(
            registry.insert(profile("acme")),
            Err(RelayError::Config(msg)) if msg.contains("twice")
        ));
        assert!(registry.insert(profile("  ")).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn default_tenant_resolution() {
        let mut registry = TenantRegistry::new();
        assert!(registry.default_tenant().is_none());

        registry.insert(profile("acme")).unwrap();
        assert_eq!(registry.default_tenant().unwrap().key, "acme");

        registry.insert(profile("globex")).unwrap();
        assert!(registry.default_tenant().is_none());

        registry.set_default("globex").unwrap();
        assert_eq!(registry.default_tenant().unwrap().key, "globex");
        assert!(registry.set_default("initech").is_err());
    }

    #[test]
    fn tools_fill_in_the_advertised_schema() {
        let mut tools = ToolRegistry::new();
        let echo: Arc<dyn Tool> = Arc::new(FnTool::new(
            "echo",
            "Echo the input",
            serde_json::json!({"type": "object"}),
            |args: serde_json::Value| Ok::<_, String>(args.to_string()),
        ));
        tools.register(echo).unwrap();

        let tenant = profile("acme").with_tools(tools);
        assert_eq!(tenant.session.tools_schema.len(), 1);
        assert_eq!(tenant.session.tools_schema[0]["name"], "echo");
        assert!(tenant.tools.get("echo").is_some());
    }
}
