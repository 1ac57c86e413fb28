// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A tool that sleeps for a fixed time and returns a canned result.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use voxrelay_core::RelayError;
use voxrelay_tools::{Tool, ToolOutput};

/// Scripted tool with call recording.
pub struct ScriptedTool {
    name: String,
    delay: Duration,
    result: Result<String, String>,
    calls: AtomicUsize,
    last_args: Mutex<Option<serde_json::Value>>,
}

impl ScriptedTool {
    /// A tool returning `output` after `delay`.
    pub fn new(name: impl Into<String>, delay: Duration, output: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            delay,
            result: Ok(output.into()),
            calls: AtomicUsize::new(0),
            last_args: Mutex::new(None),
        })
    }

    /// A tool failing with `message` after `delay`.
    pub fn failing(name: impl Into<String>, delay: Duration, message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            delay,
            result: Err(message.into()),
            calls: AtomicUsize::new(0),
            last_args: Mutex::new(None),
        })
    }

    /// Number of times the tool was invoked.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Arguments of the most recent invocation.
    pub fn last_args(&self) -> Option<serde_json::Value> {
        self.last_args
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Tool for ScriptedTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "scripted test tool"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn invoke(&self, args: serde_json::Value) -> Result<ToolOutput, RelayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_args.lock().unwrap_or_else(PoisonError::into_inner) = Some(args);
        tokio::time::sleep(self.delay).await;
        self.result
            .clone()
            .map(ToolOutput::text)
            .map_err(|message| RelayError::Tool {
                name: self.name.clone(),
                message,
                source: None,
            })
    }
}
