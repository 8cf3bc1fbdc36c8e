// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Discovery Session
//!
//! Per-run state for one isolated discovery: immutable configuration, asset
//! cache, graph store handle, log bus, statistics, and the one-shot done
//! token. Sessions are created by the session manager, shared behind `Arc`,
//! and live until explicit termination or engine shutdown.

use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use discovery_engine_bootstrap::shutdown::CancellationToken;
use discovery_engine_domain::entities::session_config::SessionConfig;
use discovery_engine_domain::entities::session_stats::{SessionStats, StatsSnapshot};
use discovery_engine_domain::events::log_record::LogRecord;
use discovery_engine_domain::repositories::graph_repository::GraphRepository;
use discovery_engine_domain::services::asset_handler::{EventDispatch, HandlerContext};
use discovery_engine_domain::services::log_service::LogPublisher;
use discovery_engine_domain::value_objects::SessionId;

use crate::infrastructure::bus::SessionLogBus;
use crate::infrastructure::cache::SessionCache;
use crate::infrastructure::runtime::dispatcher::TokenDoneSignal;
use crate::infrastructure::runtime::tracker::InFlightTracker;

/// One isolated discovery run.
pub struct Session {
    id: SessionId,
    config: Arc<SessionConfig>,
    cache: Arc<SessionCache>,
    db: Arc<dyn GraphRepository>,
    log_bus: Arc<SessionLogBus>,
    stats: Arc<SessionStats>,
    tracker: Arc<InFlightTracker>,
    done: CancellationToken,
    ctx: HandlerContext,
    cancelled_logged: AtomicBool,
    quiescence_window: Duration,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Assembles a session from its parts and builds the handler context
    /// handlers will see.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: SessionId,
        config: Arc<SessionConfig>,
        cache: Arc<SessionCache>,
        db: Arc<dyn GraphRepository>,
        log_bus: Arc<SessionLogBus>,
        dispatcher: Arc<dyn EventDispatch>,
        quiescence_window: Duration,
    ) -> Self {
        let stats = Arc::new(SessionStats::new());
        let tracker = Arc::new(InFlightTracker::new());
        let done = CancellationToken::new();

        let ctx = HandlerContext::new(
            config.clone(),
            cache.clone(),
            db.clone(),
            log_bus.clone(),
            Arc::new(TokenDoneSignal(done.clone())),
            dispatcher,
        );

        Self {
            id,
            config,
            cache,
            db,
            log_bus,
            stats,
            tracker,
            done,
            ctx,
            cancelled_logged: AtomicBool::new(false),
            quiescence_window,
            created_at: Utc::now(),
        }
    }

    /// Returns the session identifier
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the immutable session configuration
    pub fn config(&self) -> &Arc<SessionConfig> {
        &self.config
    }

    /// Returns the session asset cache
    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    /// Returns the session's graph store handle
    pub fn db(&self) -> &Arc<dyn GraphRepository> {
        &self.db
    }

    /// Returns the session statistics handle
    pub fn stats(&self) -> &Arc<SessionStats> {
        &self.stats
    }

    /// Returns a point-in-time statistics snapshot
    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns the in-flight tracker
    pub fn tracker(&self) -> &Arc<InFlightTracker> {
        &self.tracker
    }

    /// Returns the number of events currently inside pipelines
    pub fn in_flight(&self) -> u64 {
        self.tracker.in_flight()
    }

    /// Returns the session log bus
    pub fn log_bus(&self) -> &Arc<SessionLogBus> {
        &self.log_bus
    }

    /// Opens a subscription to the session log stream
    pub fn subscribe_log(&self) -> BoxStream<'static, LogRecord> {
        self.log_bus.subscribe()
    }

    /// Returns the done token observed by handlers
    pub fn done_token(&self) -> CancellationToken {
        self.done.clone()
    }

    /// Returns true once the session has been cancelled
    pub fn is_done(&self) -> bool {
        self.done.is_cancelled()
    }

    /// Returns the handler context cloned into every envelope
    pub fn handler_context(&self) -> HandlerContext {
        self.ctx.clone()
    }

    /// Returns the session creation timestamp
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the configured quiescence window
    pub fn quiescence_window(&self) -> Duration {
        self.quiescence_window
    }

    /// Cancels the session; idempotent.
    ///
    /// The done token fires exactly once; the cancellation record is
    /// published on the log bus on the first call only.
    pub fn cancel(&self) {
        self.done.cancel();
        if !self.cancelled_logged.swap(true, Ordering::SeqCst) {
            info!(session = %self.id, "Session cancelled");
            self.log_bus.publish(LogRecord::cancelled(self.id, "session"));
        }
    }

    /// Waits until the session has been idle for its quiescence window.
    ///
    /// Returns immediately once cancelled.
    pub async fn wait_for_quiescence(&self) {
        tokio::select! {
            _ = self.done.cancelled() => {}
            _ = self.tracker.wait_quiescent(self.quiescence_window) => {}
        }
    }
}

/// Background idle monitor: publishes an idle record (with a statistics
/// snapshot) each time the session becomes quiescent, until the session is
/// cancelled.
pub async fn idle_monitor(session: Arc<Session>) {
    loop {
        tokio::select! {
            _ = session.done.cancelled() => break,
            _ = session.tracker.wait_quiescent(session.quiescence_window) => {
                session
                    .log_bus
                    .publish(LogRecord::idle(session.id, "session"));
                session
                    .log_bus
                    .publish(LogRecord::stats(session.id, "session", session.stats_snapshot()));

                // Wait for new work (or cancellation) before watching for
                // the next quiet period.
                tokio::select! {
                    _ = session.done.cancelled() => break,
                    _ = session.tracker.wait_active() => {}
                }
            }
        }
    }
}
