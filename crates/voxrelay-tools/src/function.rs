// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed synchronous closures exposed as tools.
//!
//! Arguments are deserialized into `A` before the closure runs, and the
//! closure itself runs on tokio's blocking pool so a slow lookup never stalls
//! the relay loops.

use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use voxrelay_core::RelayError;

use crate::tool::{Tool, ToolOutput};

/// A tool backed by a plain `Fn(A) -> Result<String, E>`.
pub struct FnTool<A, F, E> {
    name: String,
    description: String,
    parameters: serde_json::Value,
    func: Arc<F>,
    _marker: PhantomData<fn(A) -> E>,
}

impl<A, F, E> FnTool<A, F, E>
where
    A: DeserializeOwned + Send + 'static,
    F: Fn(A) -> Result<String, E> + Send + Sync + 'static,
    E: Display + Send + 'static,
{
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
        func: F,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            func: Arc::new(func),
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<A, F, E> Tool for FnTool<A, F, E>
where
    A: DeserializeOwned + Send + 'static,
    F: Fn(A) -> Result<String, E> + Send + Sync + 'static,
    E: Display + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.parameters.clone()
    }

    async fn invoke(&self, args: serde_json::Value) -> Result<ToolOutput, RelayError> {
        let typed: A = serde_json::from_value(args).map_err(|e| RelayError::Tool {
            name: self.name.clone(),
            message: format!("invalid arguments: {e}"),
            source: Some(Box::new(e)),
        })?;

        let func = Arc::clone(&self.func);
        let joined = tokio::task::spawn_blocking(move || func(typed).map_err(|e| e.to_string()))
            .await
            .map_err(|e| RelayError::Tool {
                name: self.name.clone(),
                message: format!("tool task did not complete: {e}"),
                source: Some(Box::new(e)),
            })?;

        joined.map(ToolOutput::text).map_err(|message| RelayError::Tool {
            name: self.name.clone(),
            message,
            source: None,
        })
    }
}
