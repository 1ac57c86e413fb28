// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP-backed tool declared in tenant configuration.
//!
//! Forwards the model's arguments to a fixed endpoint and hands the response
//! body back as the function output. Response bodies are truncated to 50KB to
//! keep the follow-up prompt small.

use std::time::Duration;

use async_trait::async_trait;
use voxrelay_core::RelayError;

use crate::tool::{Tool, ToolOutput};

/// Maximum response body size in bytes (50KB).
const MAX_RESPONSE_SIZE: usize = 50 * 1024;

/// Static description of an HTTP tool.
#[derive(Debug, Clone)]
pub struct HttpToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments object.
    pub parameters: serde_json::Value,
    /// Absolute http(s) URL the arguments are sent to.
    pub endpoint: String,
    /// HTTP method. `GET` sends arguments as query parameters, anything
    /// else sends them as a JSON body.
    pub method: String,
    pub timeout: Duration,
}

/// Calls a configured endpoint and returns the response body.
pub struct HttpTool {
    spec: HttpToolSpec,
    method: reqwest::Method,
    endpoint: reqwest::Url,
    client: reqwest::Client,
}

impl HttpTool {
    /// Builds the tool, rejecting bad URLs and methods up front.
    pub fn new(spec: HttpToolSpec) -> Result<Self, RelayError> {
        let endpoint = reqwest::Url::parse(&spec.endpoint).map_err(|e| {
            RelayError::Config(format!(
                "tool `{}` has an invalid endpoint `{}`: {e}",
                spec.name, spec.endpoint
            ))
        })?;
        let scheme = endpoint.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(RelayError::Config(format!(
                "tool `{}` endpoint scheme `{scheme}` not allowed, use http or https",
                spec.name
            )));
        }

        let method = spec
            .method
            .to_ascii_uppercase()
            .parse::<reqwest::Method>()
            .map_err(|e| {
                RelayError::Config(format!(
                    "tool `{}` has an invalid method `{}`: {e}",
                    spec.name, spec.method
                ))
            })?;

        let client = reqwest::Client::builder()
            .timeout(spec.timeout)
            .build()
            .map_err(|e| RelayError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            spec,
            method,
            endpoint,
            client,
        })
    }

    fn request(&self, args: &serde_json::Value) -> reqwest::RequestBuilder {
        if self.method == reqwest::Method::GET {
            let mut url = self.endpoint.clone();
            if let Some(object) = args.as_object() {
                let mut pairs = url.query_pairs_mut();
                for (key, value) in object {
                    match value.as_str() {
                        Some(s) => pairs.append_pair(key, s),
                        None => pairs.append_pair(key, &value.to_string()),
                    };
                }
            }
            self.client.get(url)
        } else {
            self.client
                .request(self.method.clone(), self.endpoint.clone())
                .json(args)
        }
    }
}

#[async_trait]
impl Tool for HttpTool {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn description(&self) -> &str {
        &self.spec.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.spec.parameters.clone()
    }

    async fn invoke(&self, args: serde_json::Value) -> Result<ToolOutput, RelayError> {
        let response = self.request(&args).send().await.map_err(|e| RelayError::Tool {
            name: self.spec.name.clone(),
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| RelayError::Tool {
            name: self.spec.name.clone(),
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        let truncated = if body.len() > MAX_RESPONSE_SIZE {
            let mut cut = MAX_RESPONSE_SIZE;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            tracing::debug!(
                tool = self.spec.name.as_str(),
                size = body.len(),
                "truncating tool response"
            );
            body[..cut].to_string()
        } else {
            body
        };

        if status.is_client_error() || status.is_server_error() {
            return Ok(ToolOutput::error(format!("HTTP {status}: {truncated}")));
        }

        Ok(ToolOutput::text(truncated))
    }
}
