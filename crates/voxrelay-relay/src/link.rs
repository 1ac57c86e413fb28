// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound half of a transport connection.
//!
//! A [`Link`] is the cloneable handle every producer writes through. It feeds
//! a bounded queue that exactly one writer task drains into the real socket
//! (see [`Outbox::drain_into`]), so frames from the relay loops and the tool
//! orchestrator never interleave mid-write. The link also carries the
//! connection's open/closed state as a [`CancellationToken`].

use futures::{Sink, SinkExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::debug;
use voxrelay_core::{RelayError, TransportKind};

/// Frames buffered per link before producers wait on the writer.
pub const DEFAULT_LINK_CAPACITY: usize = 256;

/// Cloneable write handle for one transport.
#[derive(Debug, Clone)]
pub struct Link {
    kind: TransportKind,
    tx: mpsc::Sender<String>,
    closed: CancellationToken,
}

/// Receiving side of a [`Link`], owned by the transport's writer task.
#[derive(Debug)]
pub struct Outbox {
    kind: TransportKind,
    rx: mpsc::Receiver<String>,
    closed: CancellationToken,
}

impl Link {
    /// Creates a link and the outbox its writer task drains.
    pub fn new(kind: TransportKind) -> (Self, Outbox) {
        Self::with_capacity(kind, DEFAULT_LINK_CAPACITY)
    }

    pub fn with_capacity(kind: TransportKind, capacity: usize) -> (Self, Outbox) {
        let (tx, rx) = mpsc::channel(capacity);
        let closed = CancellationToken::new();
        (
            Self {
                kind,
                tx,
                closed: closed.clone(),
            },
            Outbox { kind, rx, closed },
        )
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Whether the connection is still accepting frames.
    pub fn is_open(&self) -> bool {
        !self.closed.is_cancelled()
    }

    /// Marks the connection closed. Idempotent.
    ///
    /// Frames already queued are still flushed by the writer before it
    /// closes the socket.
    pub fn close(&self) {
        if !self.closed.is_cancelled() {
            debug!(transport = %self.kind, "closing link");
            self.closed.cancel();
        }
    }

    /// Resolves once the link has been closed from either end.
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.closed.cancelled()
    }

    /// Queues one pre-encoded text frame.
    pub async fn send_text(&self, frame: String) -> Result<(), RelayError> {
        if !self.is_open() {
            return Err(RelayError::Closed(self.kind));
        }
        self.tx
            .send(frame)
            .await
            .map_err(|_| RelayError::Closed(self.kind))
    }

    /// Serializes `event` as JSON and queues it.
    pub async fn send_json<T: Serialize>(&self, event: &T) -> Result<(), RelayError> {
        let frame = serde_json::to_string(event).map_err(|e| RelayError::Protocol {
            transport: self.kind,
            message: format!("failed to encode outbound event: {e}"),
        })?;
        self.send_text(frame).await
    }
}

impl Outbox {
    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Receives the next queued frame.
    ///
    /// Returns `None` once the link is closed and the queue is drained, or
    /// when every [`Link`] handle has been dropped.
    pub async fn recv(&mut self) -> Option<String> {
        tokio::select! {
            biased;
            frame = self.rx.recv() => frame,
            _ = self.closed.cancelled() => self.rx.try_recv().ok(),
        }
    }

    /// Writer loop: forwards every queued frame into `sink`, then closes it.
    ///
    /// A failed write marks the link closed so producers stop queueing.
    pub async fn drain_into<S, M, F>(mut self, mut sink: S, to_message: F)
    where
        S: Sink<M> + Unpin,
        S::Error: std::fmt::Display,
        F: Fn(String) -> M,
    {
        while let Some(frame) = self.recv().await {
            if let Err(e) = sink.send(to_message(frame)).await {
                debug!(transport = %self.kind, error = %e, "write failed, closing link");
                self.closed.cancel();
                break;
            }
        }
        self.closed.cancel();
        if let Err(e) = sink.close().await {
            debug!(transport = %self.kind, error = %e, "error closing sink");
        }
    }
}
