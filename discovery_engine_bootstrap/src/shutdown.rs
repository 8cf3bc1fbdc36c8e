// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cancellation and Shutdown
//!
//! Lifecycle primitives shared by the whole engine:
//!
//! - [`CancellationToken`]: a one-shot flag with async waiters. Every
//!   discovery session owns one as its done-signal, and the engine owns one
//!   for process-level teardown.
//! - [`ShutdownCoordinator`]: pairs the engine's token with a bounded
//!   drain. Initiating shutdown fires the token; whoever performs the
//!   actual teardown reports back with [`ShutdownCoordinator::mark_drained`],
//!   and [`ShutdownCoordinator::wait_drained`] gives up after the grace
//!   period so a wedged pipeline cannot hold the process hostage.
//!
//! The engine facade drives the coordinator from `shutdown()`; embedding
//! binaries connect OS signals to it through the signal listener in
//! [`crate::signals`].

use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Default grace period for graceful shutdown (in seconds)
pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 5;

/// One-shot cancellation flag observable from async tasks.
///
/// Clones share the same flag. Once cancelled the token stays cancelled.
#[derive(Clone)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    waiters: Arc<Notify>,
}

impl CancellationToken {
    /// Create a new, uncancelled token
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            waiters: Arc::new(Notify::new()),
        }
    }

    /// Cancel this token; idempotent
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.waiters.notify_waiters();
    }

    /// Check if cancelled (non-blocking)
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Wait for cancellation (async).
    ///
    /// Interest is registered before the flag is re-checked, so a `cancel`
    /// racing with this call cannot be missed.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        let mut notified = pin!(self.waiters.notified());
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Engine-level shutdown: token fan-out plus a grace-bounded drain.
///
/// The coordinator separates the two halves of teardown. `initiate` only
/// fires the shared token; the component that actually drains (cancelling
/// sessions, closing pipelines, stopping the write queue) calls
/// `mark_drained` when it finishes. `wait_drained` then resolves either on
/// that mark or when the grace period runs out, whichever comes first.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    grace_period: Duration,
    initiated: Arc<AtomicBool>,
    drained: Arc<AtomicBool>,
    drained_waiters: Arc<Notify>,
}

impl ShutdownCoordinator {
    /// Create a coordinator with the given drain grace period
    pub fn new(grace_period: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            grace_period,
            initiated: Arc::new(AtomicBool::new(false)),
            drained: Arc::new(AtomicBool::new(false)),
            drained_waiters: Arc::new(Notify::new()),
        }
    }

    /// Get the shared cancellation token
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Returns the configured drain grace period
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Check if shutdown has been initiated
    pub fn is_shutting_down(&self) -> bool {
        self.initiated.load(Ordering::SeqCst)
    }

    /// Fire the shared token and start the shutdown; idempotent
    pub fn initiate(&self) {
        if self
            .initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            tracing::info!(grace = ?self.grace_period, "Shutdown initiated");
            self.token.cancel();
        }
    }

    /// Report that teardown finished; unblocks every `wait_drained` caller
    pub fn mark_drained(&self) {
        self.drained.store(true, Ordering::SeqCst);
        self.drained_waiters.notify_waiters();
    }

    /// Wait for the drain to finish, bounded by the grace period.
    ///
    /// Returns `true` when the drain completed in time and `false` when the
    /// grace period expired first. A drain marked before this call returns
    /// `true` immediately.
    pub async fn wait_drained(&self) -> bool {
        if self.drained.load(Ordering::SeqCst) {
            return true;
        }
        let mut notified = pin!(self.drained_waiters.notified());
        notified.as_mut().enable();
        if self.drained.load(Ordering::SeqCst) {
            return true;
        }
        tokio::select! {
            _ = notified => true,
            _ = tokio::time::sleep(self.grace_period) => {
                tracing::warn!(grace = ?self.grace_period, "Drain exceeded the shutdown grace period");
                false
            }
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_GRACE_PERIOD_SECS))
    }
}
