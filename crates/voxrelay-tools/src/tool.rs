// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait and registry for functions the voice model may call mid-call.
//!
//! The [`Tool`] trait defines the interface that configured HTTP tools and
//! in-process closures implement. The [`ToolRegistry`] resolves a model's
//! function call by name and generates the function schema advertised to the
//! AI gateway in `session.update`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use voxrelay_core::RelayError;

/// Output from a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Text handed back to the model as the function output.
    pub content: String,
    /// Whether the tool invocation resulted in an error.
    pub is_error: bool,
}

impl ToolOutput {
    /// A successful text result.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// A failed invocation carrying a diagnostic message.
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// Unified trait for all tools.
///
/// Every tool provides a name, a description, a JSON Schema for its
/// parameters, and an async `invoke` method. The relay calls `invoke` with
/// the arguments object the model produced.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's unique name (the function name the model calls).
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// Returns the JSON Schema describing the tool's input parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Invokes the tool with the given JSON arguments and returns the output.
    async fn invoke(&self, args: serde_json::Value) -> Result<ToolOutput, RelayError>;
}

/// Registry of available tools, indexed by name.
///
/// Registration is validated: names must be non-empty and unique, so every
/// function the model is told about resolves to exactly one callable.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Creates an empty tool registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registers a tool under its `name()`.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RelayError> {
        let name = tool.name().trim();
        if name.is_empty() {
            return Err(RelayError::Config(
                "tool name must not be empty".to_string(),
            ));
        }
        if self.tools.contains_key(name) {
            return Err(RelayError::Config(format!(
                "tool `{name}` is registered twice"
            )));
        }
        self.tools.insert(name.to_string(), tool);
        Ok(())
    }

    /// Looks up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Returns (name, description) pairs for all registered tools.
    pub fn list(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .tools
            .values()
            .map(|t| (t.name(), t.description()))
            .collect();
        entries.sort_by_key(|(name, _)| *name);
        entries
    }

    /// Returns realtime-format function definitions for all registered tools.
    ///
    /// Each definition has the shape:
    /// ```json
    /// {
    ///   "type": "function",
    ///   "name": "tool_name",
    ///   "description": "What the tool does",
    ///   "parameters": { ... JSON Schema ... }
    /// }
    /// ```
    pub fn function_schemas(&self) -> Vec<serde_json::Value> {
        let mut defs: Vec<serde_json::Value> = self
            .tools
            .values()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "name": t.name(),
                    "description": t.description(),
                    "parameters": t.parameters_schema(),
                })
            })
            .collect();
        defs.sort_by(|a, b| {
            a["name"]
                .as_str()
                .unwrap_or("")
                .cmp(b["name"].as_str().unwrap_or(""))
        });
        defs
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}
