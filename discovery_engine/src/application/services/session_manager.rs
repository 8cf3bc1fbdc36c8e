// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Session Manager
//!
//! Process-wide registry of discovery sessions, keyed by session id. The
//! manager owns session construction (cache, graph handle, log bus, stats,
//! done token), registers each session's handles with the dispatcher, and
//! multiplexes any number of concurrent sessions over the shared pipelines.
//!
//! ## Lifecycle Invariant
//!
//! `cancel` fires the session's done token and is idempotent. A cancelled
//! session remains retrievable through `get` so in-flight work can drain
//! gracefully; the dispatcher rejects new events for it with
//! `SessionCancelled`. `shutdown` cancels everything and empties the
//! registry.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use discovery_engine_domain::entities::session_config::SessionConfig;
use discovery_engine_domain::services::asset_handler::EventDispatch;
use discovery_engine_domain::value_objects::SessionId;
use discovery_engine_domain::EngineError;

use crate::application::services::session::{idle_monitor, Session};
use crate::infrastructure::bus::SessionLogBus;
use crate::infrastructure::cache::SessionCache;
use crate::infrastructure::config::EngineSettings;
use crate::infrastructure::metrics::MetricsService;
use crate::infrastructure::runtime::db_queue::{GraphWriteQueue, QueuedGraphRepository};
use crate::infrastructure::runtime::dispatcher::{EventDispatcher, SessionEntry};

/// Process-wide registry of discovery sessions.
pub struct SessionManager {
    settings: EngineSettings,
    dispatcher: Arc<EventDispatcher>,
    write_queue: Arc<GraphWriteQueue>,
    metrics: MetricsService,
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
    monitors: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionManager {
    /// Creates a manager bound to the engine's dispatcher and write queue
    pub fn new(
        settings: EngineSettings,
        dispatcher: Arc<EventDispatcher>,
        write_queue: Arc<GraphWriteQueue>,
        metrics: MetricsService,
    ) -> Self {
        Self {
            settings,
            dispatcher,
            write_queue,
            metrics,
            sessions: RwLock::new(HashMap::new()),
            monitors: Mutex::new(Vec::new()),
        }
    }

    /// Creates a session: validates the configuration, instantiates the
    /// cache, graph handle, log bus, and stats, registers the session with
    /// the dispatcher, and starts its idle monitor.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidConfiguration` when the configuration
    /// fails validation.
    pub fn create(&self, config: SessionConfig) -> Result<(SessionId, Arc<Session>), EngineError> {
        config.validate()?;

        let id = SessionId::new();
        let config = Arc::new(config);
        let cache = Arc::new(SessionCache::new());
        let log_bus = Arc::new(SessionLogBus::new());
        let db = Arc::new(QueuedGraphRepository::new(self.write_queue.clone()));

        let dispatch: Arc<dyn EventDispatch> = self.dispatcher.clone();
        let session = Arc::new(Session::new(
            id,
            config.clone(),
            cache,
            db,
            log_bus.clone(),
            dispatch,
            self.settings.quiescence_window,
        ));

        self.dispatcher.register_session(
            id,
            SessionEntry {
                config,
                stats: session.stats().clone(),
                tracker: session.tracker().clone(),
                done: session.done_token(),
                log: log_bus,
                ctx: session.handler_context(),
            },
        );

        self.monitors.lock().push(tokio::spawn(idle_monitor(session.clone())));
        self.sessions.write().insert(id, session.clone());
        self.metrics.record_session_opened();
        info!(session = %id, "Session created");

        Ok((id, session))
    }

    /// Returns a session by id.
    ///
    /// Cancelled sessions remain retrievable until engine shutdown so
    /// in-flight work can drain.
    ///
    /// # Errors
    /// Returns `EngineError::SessionNotFound` for unknown ids.
    pub fn get(&self, id: SessionId) -> Result<Arc<Session>, EngineError> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::SessionNotFound(id.to_string()))
    }

    /// Cancels a session; idempotent.
    ///
    /// # Errors
    /// Returns `EngineError::SessionNotFound` for unknown ids.
    pub fn cancel(&self, id: SessionId) -> Result<(), EngineError> {
        let session = self.get(id)?;
        if !session.is_done() {
            self.metrics.record_session_closed();
        }
        session.cancel();
        Ok(())
    }

    /// Returns the number of registered sessions (live and draining)
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Cancels all sessions, waits for their monitors, and empties the
    /// registry.
    pub async fn shutdown(&self) {
        let sessions: Vec<Arc<Session>> = self.sessions.read().values().cloned().collect();
        for session in &sessions {
            if !session.is_done() {
                self.metrics.record_session_closed();
            }
            session.cancel();
        }

        let monitors = std::mem::take(&mut *self.monitors.lock());
        for monitor in monitors {
            let _ = monitor.await;
        }

        for session in &sessions {
            self.dispatcher.deregister_session(session.id());
        }
        self.sessions.write().clear();
        info!(count = sessions.len(), "All sessions shut down");
    }
}
