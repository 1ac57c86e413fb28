// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay behavior shared by every call.

use std::time::Duration;

/// Placeholder in [`RelaySettings::answer_template`] replaced by the tool output.
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

const WAIT_PREFIX: &str = "Respond to the user with wait message.";

const APOLOGY: &str = "Respond to the user with apologetic message. 'I apologize, but I'm having \
     trouble processing your request right now. Is there anything else I can help you with?'";

#[derive(Debug, Clone, PartialEq)]
pub struct RelaySettings {
    /// Gap between stalling utterances while a tool runs.
    pub stall_interval: Duration,
    /// Filler phrases, used in rotation.
    pub stall_messages: Vec<String>,
    /// Name carried by every flow-control mark.
    pub mark_name: String,
    /// Grounding instructions for the answer after a tool result.
    pub answer_template: String,
    /// Log the truncation arithmetic of every barge-in.
    pub show_timing_math: bool,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            stall_interval: Duration::from_secs(2),
            stall_messages: [
                "I'm processing your request, this will just take a moment...",
                "Working on getting that information for you...",
                "Almost there, retrieving the data you need...",
                "Just a few more seconds while I gather the details...",
                "Processing your request, thank you for your patience...",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            mark_name: "responsePart".to_string(),
            answer_template: "Formulate an answer strictly based on the provided context without \
                              adding external knowledge or assumptions. Context: {context}. Be \
                              concise and friendly."
                .to_string(),
            show_timing_math: false,
        }
    }
}

impl RelaySettings {
    /// The `index`-th stalling prompt, wrapping around the list.
    pub fn stall_prompt(&self, index: usize) -> String {
        match self.stall_messages.len() {
            0 => WAIT_PREFIX.to_string(),
            len => format!("{WAIT_PREFIX} {}", self.stall_messages[index % len]),
        }
    }

    pub fn apology_prompt(&self) -> &'static str {
        APOLOGY
    }

    /// Answer instructions grounded in `context`.
    pub fn answer_instructions(&self, context: &str) -> String {
        self.answer_template.replace(CONTEXT_PLACEHOLDER, context)
    }
}
