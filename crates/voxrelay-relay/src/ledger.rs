// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle of the AI gateway's responses within one call.
//!
//! Records are upserted from `response.created` and `response.done`. The
//! status of the most recently appended record decides whether a synthetic
//! user turn may be injected without colliding with an active response.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::protocol::realtime::ResponseStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    pub response_id: String,
    pub status: ResponseStatus,
}

#[derive(Debug, Clone, Default)]
pub struct ResponseLedger {
    records: Vec<ResponseRecord>,
}

impl ResponseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the record for `response_id` in place, or appends a new one.
    pub fn upsert(&mut self, response_id: &str, status: ResponseStatus) {
        match self
            .records
            .iter_mut()
            .find(|r| r.response_id == response_id)
        {
            Some(record) => record.status = status,
            None => self.records.push(ResponseRecord {
                response_id: response_id.to_string(),
                status,
            }),
        }
    }

    /// True iff the last appended record is still in progress.
    pub fn is_latest_in_progress(&self) -> bool {
        self.records
            .last()
            .is_some_and(|r| r.status == ResponseStatus::InProgress)
    }

    pub fn records(&self) -> &[ResponseRecord] {
        &self.records
    }
}

/// Shared handle to a call's [`ResponseLedger`].
#[derive(Debug, Clone, Default)]
pub struct LedgerHandle(Arc<Mutex<ResponseLedger>>);

impl LedgerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, ResponseLedger> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn upsert(&self, response_id: &str, status: ResponseStatus) {
        self.lock().upsert(response_id, status);
    }

    pub fn is_latest_in_progress(&self) -> bool {
        self.lock().is_latest_in_progress()
    }
}
