// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Session Statistics
//!
//! This module provides per-session progress accounting for the discovery
//! engine. Counters are updated atomically by the dispatcher and pipeline
//! sinks, so handlers never estimate progress from queue lengths.
//!
//! ## Overview
//!
//! Statistics track two views of a session:
//!
//! - **Per-state counters**: events received, done, cancelled, in process,
//!   errored, and waiting for a handler slot
//! - **Work items**: total work discovered so far versus work completed,
//!   which is the pair external callers use for progress reporting
//!
//! Snapshots are cheap, lock-free, and serde-serializable; they are
//! published to log-bus subscribers on completion milestones.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic per-session counters.
///
/// All increments happen exactly once per event transition: the dispatcher
/// counts `received` and `in_process` on admission, and the pipeline sink
/// moves the event to exactly one of `done`, `cancelled`, or `errored`.
#[derive(Debug, Default)]
pub struct SessionStats {
    /// Events accepted by the dispatcher
    received: AtomicU64,
    /// Events fully processed by a pipeline sink
    done: AtomicU64,
    /// Events abandoned because the session was cancelled
    cancelled: AtomicU64,
    /// Events currently inside a pipeline
    in_process: AtomicU64,
    /// Events that completed with at least one handler error
    errored: AtomicU64,
    /// Events parked waiting on a handler instance slot
    waiting: AtomicU64,
    /// Total work items discovered (monotonic)
    work_items_total: AtomicU64,
    /// Work items completed (monotonic)
    work_items_completed: AtomicU64,
}

impl SessionStats {
    /// Creates zeroed statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an accepted event; increments received, in-process, and the
    /// work item total.
    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
        self.in_process.fetch_add(1, Ordering::Relaxed);
        self.work_items_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an event leaving its pipeline successfully
    pub fn record_done(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
        self.in_process.fetch_sub(1, Ordering::Relaxed);
        self.work_items_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an event abandoned by cancellation
    pub fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
        self.in_process.fetch_sub(1, Ordering::Relaxed);
        self.work_items_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an event that finished with handler errors
    pub fn record_errored(&self) {
        self.errored.fetch_add(1, Ordering::Relaxed);
    }

    /// Marks an event parked on a handler instance slot
    pub fn record_waiting(&self) {
        self.waiting.fetch_add(1, Ordering::Relaxed);
    }

    /// Marks a parked event released
    pub fn record_resumed(&self) {
        self.waiting.fetch_sub(1, Ordering::Relaxed);
    }

    /// Returns the number of events currently inside a pipeline
    pub fn in_process(&self) -> u64 {
        self.in_process.load(Ordering::Relaxed)
    }

    /// Takes a consistent-enough snapshot for reporting.
    ///
    /// Counters are read individually with relaxed ordering; the snapshot is
    /// advisory, not transactional.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            done: self.done.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            in_process: self.in_process.load(Ordering::Relaxed),
            errored: self.errored.load(Ordering::Relaxed),
            waiting: self.waiting.load(Ordering::Relaxed),
            work_items_total: self.work_items_total.load(Ordering::Relaxed),
            work_items_completed: self.work_items_completed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of session statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Events accepted by the dispatcher
    pub received: u64,
    /// Events fully processed
    pub done: u64,
    /// Events abandoned by cancellation
    pub cancelled: u64,
    /// Events currently inside a pipeline
    pub in_process: u64,
    /// Events that completed with handler errors
    pub errored: u64,
    /// Events parked on a handler slot
    pub waiting: u64,
    /// Total work items discovered
    pub work_items_total: u64,
    /// Work items completed
    pub work_items_completed: u64,
}

impl StatsSnapshot {
    /// Returns completion as a fraction in `[0, 1]`; 1.0 when no work exists
    pub fn progress(&self) -> f64 {
        if self.work_items_total == 0 {
            1.0
        } else {
            self.work_items_completed as f64 / self.work_items_total as f64
        }
    }
}
