// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait, registry, and built-in tools for voxrelay calls.
//!
//! The voice model may ask for a function call mid-conversation. This crate
//! provides the [`Tool`] trait those functions implement, the
//! [`ToolRegistry`] that resolves them by name, and two ready-made kinds:
//! - [`builtin::HttpTool`] -- forwards arguments to a configured endpoint
//! - [`FnTool`] -- wraps a typed synchronous closure

pub mod builtin;
pub mod function;
pub mod tool;

pub use function::FnTool;
pub use tool::{Tool, ToolOutput, ToolRegistry};
