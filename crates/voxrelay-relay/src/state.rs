// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-call stream bookkeeping shared by the two relay loops.
//!
//! The inbound loop owns the stream id and the latest media timestamp; the
//! outbound loop owns the pending marks and the in-flight response. Both sit
//! behind one short-lived `std::sync::Mutex` that is never held across an
//! `.await`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mutable state of one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamState {
    /// Telephony stream handle, unset until the `start` event.
    pub stream_sid: Option<String>,
    /// Telephony-clock timestamp of the newest inbound media frame.
    pub latest_media_timestamp_ms: u64,
    /// Item id of the AI content currently being played.
    pub active_response_item_id: Option<String>,
    /// Telephony-clock timestamp at which the current AI turn began playing.
    pub response_start_timestamp_ms: Option<u64>,
    /// Marks sent to telephony and not yet acknowledged, oldest first.
    pub pending_marks: VecDeque<String>,
}

/// What an interruption must send, computed atomically from the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterruptionPlan {
    /// Item to truncate, if one is known.
    pub item_id: Option<String>,
    /// How much of the item the caller actually heard.
    pub audio_end_ms: u64,
    pub stream_sid: Option<String>,
    pub response_start_timestamp_ms: u64,
    pub latest_media_timestamp_ms: u64,
}

impl StreamState {
    /// Handles a `start` event: adopts the new stream and resets all timing.
    pub fn start(&mut self, stream_sid: impl Into<String>) {
        *self = Self {
            stream_sid: Some(stream_sid.into()),
            ..Self::default()
        };
    }

    pub fn record_media(&mut self, timestamp_ms: u64) {
        self.latest_media_timestamp_ms = timestamp_ms;
    }

    /// Acknowledges the oldest outstanding mark. A no-op on an empty queue.
    pub fn pop_mark(&mut self) -> Option<String> {
        self.pending_marks.pop_front()
    }

    /// Notes that an audio delta is about to be played.
    ///
    /// Pins the response start on the first delta of a turn and records the
    /// item id when the event carries one.
    pub fn begin_playback(&mut self, item_id: Option<&str>) {
        if self.response_start_timestamp_ms.is_none() {
            self.response_start_timestamp_ms = Some(self.latest_media_timestamp_ms);
        }
        if let Some(id) = item_id {
            self.active_response_item_id = Some(id.to_string());
        }
    }

    /// Queues a mark, returning the stream it must be sent on.
    ///
    /// Returns `None` (and queues nothing) before the stream has started.
    pub fn push_mark(&mut self, name: &str) -> Option<String> {
        let sid = self.stream_sid.clone()?;
        self.pending_marks.push_back(name.to_string());
        Some(sid)
    }

    /// Computes the barge-in plan, or `None` when nothing is being played.
    pub fn interruption_plan(&self) -> Option<InterruptionPlan> {
        if self.pending_marks.is_empty() {
            return None;
        }
        let start = self.response_start_timestamp_ms?;
        Some(InterruptionPlan {
            item_id: self.active_response_item_id.clone(),
            audio_end_ms: self.latest_media_timestamp_ms.saturating_sub(start),
            stream_sid: self.stream_sid.clone(),
            response_start_timestamp_ms: start,
            latest_media_timestamp_ms: self.latest_media_timestamp_ms,
        })
    }

    /// Forgets the in-flight response after an interruption.
    pub fn reset_response(&mut self) {
        self.pending_marks.clear();
        self.active_response_item_id = None;
        self.response_start_timestamp_ms = None;
    }
}

/// Shared handle to a call's [`StreamState`].
#[derive(Debug, Clone, Default)]
pub struct StateHandle(Arc<Mutex<StreamState>>);

impl StateHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the state. A poisoned lock is recovered: the state is plain
    /// data and stays consistent between statements.
    pub fn lock(&self) -> MutexGuard<'_, StreamState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> StreamState {
        self.lock().clone()
    }
}
