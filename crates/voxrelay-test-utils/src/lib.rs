// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for voxrelay integration tests.
//!
//! Runs real relay sessions against in-memory transports, so call flows can
//! be scripted frame by frame without a phone bridge or an AI gateway.
//!
//! # Components
//!
//! - [`CallHarness`] - one live call session with scriptable transports
//! - [`ScriptedTool`] - a tool with a fixed delay and canned result

pub mod harness;
pub mod scripted_tool;

pub use harness::{CallHarness, CallHarnessBuilder};
pub use scripted_tool::ScriptedTool;
