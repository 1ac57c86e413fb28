// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire formats for both legs of a call. All frames are JSON text.

pub mod realtime;
pub mod telephony;

pub use realtime::{ClientEvent, ResponseStatus, ServerEvent};
pub use telephony::{TelephonyCommand, TelephonyEvent};
