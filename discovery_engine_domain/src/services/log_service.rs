// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Log Bus Port
//!
//! Publish/subscribe port for the per-session log bus. Publishing is
//! fire-and-forget and never blocks the caller; subscribers receive a
//! stream of structured records and may lag (lagging subscribers skip
//! records rather than apply backpressure to handlers).

use futures::stream::BoxStream;

use crate::events::log_record::LogRecord;

/// Per-session publish/subscribe log bus
pub trait LogPublisher: Send + Sync {
    /// Publishes a record to all current subscribers.
    ///
    /// Records published while no subscriber is attached are dropped.
    fn publish(&self, record: LogRecord);

    /// Opens a subscription delivering records published after this call
    fn subscribe(&self) -> BoxStream<'static, LogRecord>;

    /// Returns the number of attached subscribers
    fn subscriber_count(&self) -> usize;
}
