// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # In-Flight Tracker
//!
//! Tracks the number of events a session currently has inside pipelines and
//! detects quiescence: the counter having been zero continuously for a
//! configured window. External callers use quiescence as the "work done"
//! signal for a session, since handlers keep feeding newly discovered
//! assets back into the engine and momentary zeros are common early in a
//! run.

use parking_lot::Mutex;
use std::pin::pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;

struct TrackerState {
    count: u64,
    /// Set to the transition instant whenever the counter reaches zero
    zero_since: Option<Instant>,
}

/// Session in-flight counter with quiescence detection.
#[derive(Clone)]
pub struct InFlightTracker {
    state: Arc<Mutex<TrackerState>>,
    changed: Arc<Notify>,
}

impl InFlightTracker {
    /// Creates a tracker starting at zero
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TrackerState {
                count: 0,
                zero_since: Some(Instant::now()),
            })),
            changed: Arc::new(Notify::new()),
        }
    }

    /// Records an event entering a pipeline
    pub fn increment(&self) {
        let mut state = self.state.lock();
        state.count += 1;
        state.zero_since = None;
        drop(state);
        self.changed.notify_waiters();
    }

    /// Records an event leaving its pipeline
    pub fn decrement(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.count > 0, "in-flight counter underflow");
        state.count = state.count.saturating_sub(1);
        if state.count == 0 {
            state.zero_since = Some(Instant::now());
        }
        drop(state);
        self.changed.notify_waiters();
    }

    /// Returns the current in-flight count
    pub fn in_flight(&self) -> u64 {
        self.state.lock().count
    }

    /// Waits until the counter has been zero continuously for `window`.
    ///
    /// Returns immediately when that condition already holds.
    pub async fn wait_quiescent(&self, window: Duration) {
        loop {
            // Register interest before re-checking so a racing transition
            // cannot be missed.
            let mut notified = pin!(self.changed.notified());
            notified.as_mut().enable();

            let remaining = {
                let state = self.state.lock();
                match (state.count, state.zero_since) {
                    (0, Some(since)) => {
                        let elapsed = since.elapsed();
                        if elapsed >= window {
                            return;
                        }
                        Some(window - elapsed)
                    }
                    _ => None,
                }
            };

            match remaining {
                Some(remaining) => {
                    tokio::select! {
                        _ = tokio::time::sleep(remaining) => {}
                        _ = notified => {}
                    }
                }
                None => notified.await,
            }
        }
    }

    /// Waits until at least one event is in flight
    pub async fn wait_active(&self) {
        loop {
            let mut notified = pin!(self.changed.notified());
            notified.as_mut().enable();
            if self.state.lock().count > 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Default for InFlightTracker {
    fn default() -> Self {
        Self::new()
    }
}
