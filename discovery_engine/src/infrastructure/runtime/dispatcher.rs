// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Event Dispatcher
//!
//! The routing layer between events and pipelines. The dispatcher is
//! engine-wide and passive: it owns no thread and is driven entirely by
//! whoever calls `dispatch_event`: the public ingest surface and every
//! handler that emits newly discovered assets.
//!
//! ## Dispatch Contract
//!
//! For each event, in order:
//!
//! 1. The owning session must exist (`SessionNotFound`) and must not be
//!    cancelled (`SessionCancelled`).
//! 2. The asset must fall inside the session scope; out-of-scope assets are
//!    dropped silently (`NotInScope`), counted in metrics but never logged
//!    at error level.
//! 3. A pipeline must exist for the asset type (`NoPipeline`).
//! 4. The session's in-flight counter and stats are incremented exactly
//!    once, the event is wrapped in an envelope carrying the session's
//!    accounting handles, and the envelope is enqueued. The call returns
//!    immediately; completion is settled by the pipeline sink, which
//!    decrements the same counter exactly once.
//!
//! Central accounting is what lets external callers read real progress
//! (`work-items-completed` / `work-items-total`) instead of estimating it
//! from queue lengths.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

use discovery_engine_bootstrap::shutdown::CancellationToken;
use discovery_engine_domain::entities::session_config::SessionConfig;
use discovery_engine_domain::entities::session_stats::SessionStats;
use discovery_engine_domain::events::discovery_event::DiscoveryEvent;
use discovery_engine_domain::services::asset_handler::{DoneSignal, EventDispatch, HandlerContext};
use discovery_engine_domain::services::log_service::LogPublisher;
use discovery_engine_domain::value_objects::SessionId;
use discovery_engine_domain::EngineError;

use crate::infrastructure::metrics::MetricsService;
use crate::infrastructure::runtime::envelope::{EventAccounting, EventEnvelope};
use crate::infrastructure::runtime::registry::HandlerRegistry;
use crate::infrastructure::runtime::tracker::InFlightTracker;

/// Adapter exposing a [`CancellationToken`] through the domain done-signal
/// port.
pub struct TokenDoneSignal(pub CancellationToken);

impl DoneSignal for TokenDoneSignal {
    fn is_done(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// The dispatcher's per-session registration: the shared handles it needs
/// to validate, account, and envelope events for one session.
#[derive(Clone)]
pub struct SessionEntry {
    /// Immutable session configuration
    pub config: Arc<SessionConfig>,
    /// Session counters
    pub stats: Arc<SessionStats>,
    /// In-flight tracker feeding quiescence detection
    pub tracker: Arc<InFlightTracker>,
    /// Session done token
    pub done: CancellationToken,
    /// Session log bus
    pub log: Arc<dyn LogPublisher>,
    /// Handler context cloned into every envelope
    pub ctx: HandlerContext,
}

/// Engine-wide event dispatcher implementing the domain dispatch port.
pub struct EventDispatcher {
    registry: Arc<HandlerRegistry>,
    metrics: MetricsService,
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
}

impl EventDispatcher {
    /// Creates a dispatcher over a registry
    pub fn new(registry: Arc<HandlerRegistry>, metrics: MetricsService) -> Self {
        Self {
            registry,
            metrics,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a session's handles; called by the session manager at
    /// session creation.
    pub fn register_session(&self, session_id: SessionId, entry: SessionEntry) {
        self.sessions.write().insert(session_id, entry);
    }

    /// Removes a session's handles; dispatches for the session fail with
    /// `SessionNotFound` afterwards.
    pub fn deregister_session(&self, session_id: SessionId) {
        self.sessions.write().remove(&session_id);
    }

    /// Returns a session's registration, if present
    pub fn session(&self, session_id: SessionId) -> Option<SessionEntry> {
        self.sessions.read().get(&session_id).cloned()
    }

    /// Returns the number of registered sessions
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}

impl EventDispatch for EventDispatcher {
    fn dispatch_event(&self, event: DiscoveryEvent) -> Result<(), EngineError> {
        let session_id = event.session_id();
        let entry = self
            .session(session_id)
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;

        if entry.done.is_cancelled() {
            self.metrics.record_dropped("session_cancelled");
            return Err(EngineError::SessionCancelled(session_id.to_string()));
        }

        if !entry.config.scope.in_scope(event.asset()) {
            // Silent drop: counted, not logged at error level.
            self.metrics.record_dropped("not_in_scope");
            trace!(event = %event.name(), "Asset outside session scope");
            return Err(EngineError::not_in_scope(event.name()));
        }

        let pipeline = self.registry.pipeline_for(event.asset_type()).map_err(|e| {
            self.metrics.record_dropped("no_pipeline");
            e
        })?;

        entry.stats.record_received();
        entry.tracker.increment();
        self.metrics.record_dispatched();

        let accounting = EventAccounting {
            stats: entry.stats.clone(),
            tracker: entry.tracker.clone(),
            metrics: self.metrics.clone(),
            log: entry.log.clone(),
        };
        let envelope = EventEnvelope::new(event, entry.ctx.clone(), accounting);

        // On a closed pipeline the envelope settles its own accounting
        // before the error propagates, keeping counters balanced.
        pipeline.enqueue(envelope)
    }
}
