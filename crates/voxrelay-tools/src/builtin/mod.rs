// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in tool kinds that tenants can declare without writing code.

pub mod http;

pub use http::{HttpTool, HttpToolSpec};
