// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Session Log Bus
//!
//! In-memory publish/subscribe bus carrying structured [`LogRecord`]s for
//! one session. Built on `tokio::sync::broadcast` for multi-producer,
//! multi-consumer semantics: handlers publish without blocking, and every
//! subscriber receives records published after its subscription opened.
//! Lagging subscribers skip records rather than backpressure publishers;
//! the log stream is advisory, never load-bearing.

use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

use discovery_engine_domain::events::log_record::LogRecord;
use discovery_engine_domain::services::log_service::LogPublisher;

/// Maximum records buffered per subscriber before lagging skips records
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Broadcast-backed implementation of the session log bus.
pub struct SessionLogBus {
    sender: broadcast::Sender<LogRecord>,
    records_published: AtomicU64,
    capacity: usize,
}

impl SessionLogBus {
    /// Creates a bus with the default per-subscriber capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus with an explicit per-subscriber capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            records_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Returns the total records published on this bus
    pub fn records_published(&self) -> u64 {
        self.records_published.load(Ordering::Relaxed)
    }

    /// Returns the per-subscriber buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SessionLogBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LogPublisher for SessionLogBus {
    fn publish(&self, record: LogRecord) {
        self.records_published.fetch_add(1, Ordering::Relaxed);
        // Send fails only when no subscriber is attached; records are
        // advisory, so that is not an error.
        let _ = self.sender.send(record);
    }

    fn subscribe(&self) -> BoxStream<'static, LogRecord> {
        let receiver = self.sender.subscribe();
        BroadcastStream::new(receiver)
            .filter_map(|result| async move {
                match result {
                    Ok(record) => Some(record),
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        debug!(skipped, "Log subscriber lagged; records skipped");
                        None
                    }
                }
            })
            .boxed()
    }

    fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
