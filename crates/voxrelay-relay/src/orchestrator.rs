// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Function calls requested by the voice model.
//!
//! Each call runs on its own task: the tool is invoked on a further task
//! while an interval timer keeps the caller company with stalling prompts.
//! Neither relay loop ever waits on a tool.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, info, warn, Instrument};
use voxrelay_core::RelayError;
use voxrelay_tools::{Tool, ToolRegistry};

use crate::conversation::Conversation;
use crate::protocol::realtime::ResponseOptions;
use crate::protocol::ClientEvent;
use crate::settings::RelaySettings;

/// A `response.function_call_arguments.done` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub call_id: String,
    pub name: String,
    /// JSON-encoded arguments object.
    pub arguments: String,
}

#[derive(Debug, Clone)]
pub struct ToolOrchestrator {
    conversation: Conversation,
    tools: Arc<ToolRegistry>,
    settings: Arc<RelaySettings>,
    modalities: Vec<String>,
    cancel: CancellationToken,
}

impl ToolOrchestrator {
    /// `cancel` stops every in-flight call, tool included.
    pub fn new(
        conversation: Conversation,
        tools: Arc<ToolRegistry>,
        settings: Arc<RelaySettings>,
        modalities: Vec<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            conversation,
            tools,
            settings,
            modalities,
            cancel,
        }
    }

    /// Runs `call` on a new task and returns immediately.
    pub fn dispatch(&self, call: ToolCall) -> JoinHandle<()> {
        let this = self.clone();
        let span = tracing::info_span!("tool_call", call_id = call.call_id.as_str(), tool = call.name.as_str());
        tokio::spawn(
            async move {
                tokio::select! {
                    _ = this.cancel.cancelled() => debug!("tool call cancelled"),
                    _ = this.handle(call) => {}
                }
            }
            .instrument(span),
        )
    }

    /// Runs one call to completion, apologising to the caller on failure.
    pub async fn handle(&self, call: ToolCall) {
        if let Err(e) = self.run(&call).await {
            warn!(error = %e, "tool call failed");
            if let Err(e) = self
                .conversation
                .inject_unconditionally(self.settings.apology_prompt())
                .await
            {
                debug!(error = %e, "could not deliver apology");
            }
        }
    }

    async fn run(&self, call: &ToolCall) -> Result<(), RelayError> {
        self.conversation
            .inject(&self.settings.stall_prompt(0))
            .await?;

        let resolved = self
            .tools
            .get(&call.name)
            .ok_or_else(|| RelayError::ToolNotFound(call.name.clone()));
        let output = match resolved {
            Ok(tool) => {
                let args = parse_arguments(call)?;
                self.invoke_with_stalls(tool, args).await?
            }
            Err(e) => {
                warn!(error = %e, "answering with empty output");
                String::new()
            }
        };
        info!(output_len = output.len(), "tool call finished");

        let gateway = self.conversation.gateway();
        gateway
            .send_json(&ClientEvent::function_output(call.call_id.as_str(), output.as_str()))
            .await?;
        gateway
            .send_json(&ClientEvent::ResponseCreate {
                response: Some(ResponseOptions {
                    modalities: self.modalities.clone(),
                    instructions: self.settings.answer_instructions(&output),
                }),
            })
            .await
    }

    /// Invokes `tool` on its own task, injecting a stalling prompt each time
    /// the interval elapses before it returns.
    ///
    /// The ledger is consulted again before every stall.
    async fn invoke_with_stalls(
        &self,
        tool: Arc<dyn Tool>,
        args: serde_json::Value,
    ) -> Result<String, RelayError> {
        let name = tool.name().to_string();
        let mut task = AbortOnDropHandle::new(tokio::spawn(async move { tool.invoke(args).await }));

        let period = self.settings.stall_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut index = 1;

        let joined = loop {
            tokio::select! {
                biased;
                joined = &mut task => break joined,
                _ = ticker.tick() => {
                    debug!(index, "tool still running, stalling");
                    self.conversation.inject(&self.settings.stall_prompt(index)).await?;
                    index += 1;
                }
            }
        };

        let output = joined.map_err(|e| RelayError::Tool {
            name: name.clone(),
            message: format!("tool task did not complete: {e}"),
            source: Some(Box::new(e)),
        })??;

        if output.is_error {
            return Err(RelayError::Tool {
                name,
                message: output.content,
                source: None,
            });
        }
        Ok(output.content)
    }
}

fn parse_arguments(call: &ToolCall) -> Result<serde_json::Value, RelayError> {
    if call.arguments.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }
    serde_json::from_str(&call.arguments).map_err(|e| RelayError::Tool {
        name: call.name.clone(),
        message: format!("invalid arguments: {e}"),
        source: Some(Box::new(e)),
    })
}
