// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Discovery Engine Facade
//!
//! This module composes the engine: handler registry, dispatcher, session
//! manager, rate limiter registry, guess filter, graph write queue, and
//! metrics, wired together at construction and exposed through one typed
//! facade. The surrounding API layer (out of scope here) talks to this
//! type; so do tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let engine = DiscoveryEngine::new(EngineSettings::default())?;
//! engine.register_handler(Arc::new(CnameLookup::new()))?;
//! engine.register_handler(Arc::new(ApexLookup::new()))?;
//! engine.start()?;
//!
//! let session_id = engine.create_session(config)?;
//! engine.ingest_asset(session_id, Asset::Fqdn(Fqdn::new("example.com")?))?;
//! engine.wait_for_quiescence(session_id).await?;
//! let stats = engine.session_stats(session_id)?;
//! engine.shutdown().await;
//! ```
//!
//! ## Lifecycle
//!
//! Registration happens between construction and `start`; `start` freezes
//! the registry and builds one pipeline per registered asset type.
//! `shutdown` cancels all sessions, drains every pipeline, and stops the
//! graph write queue, bounded by the configured grace period so a wedged
//! handler cannot stall teardown forever. Embedding binaries may connect
//! OS signals to the engine's shutdown coordinator (see
//! `discovery_engine_bootstrap::spawn_signal_listener`). The engine must
//! be constructed inside a tokio runtime, since the write queue and
//! pipelines own background tasks.

use futures::stream::BoxStream;
use std::sync::Arc;
use tracing::{info, warn};

use discovery_engine_bootstrap::shutdown::ShutdownCoordinator;

use discovery_engine_domain::entities::asset::Asset;
use discovery_engine_domain::entities::session_config::SessionConfig;
use discovery_engine_domain::entities::session_stats::StatsSnapshot;
use discovery_engine_domain::events::discovery_event::DiscoveryEvent;
use discovery_engine_domain::events::log_record::LogRecord;
use discovery_engine_domain::repositories::graph_repository::GraphRepository;
use discovery_engine_domain::services::asset_handler::{AssetHandler, EventDispatch};
use discovery_engine_domain::value_objects::{EventId, SessionId};
use discovery_engine_domain::EngineError;

use crate::application::services::session::Session;
use crate::application::services::session_manager::SessionManager;
use crate::infrastructure::config::EngineSettings;
use crate::infrastructure::filters::GuessFilter;
use crate::infrastructure::metrics::MetricsService;
use crate::infrastructure::repositories::InMemoryGraphRepository;
use crate::infrastructure::runtime::db_queue::GraphWriteQueue;
use crate::infrastructure::runtime::dispatcher::EventDispatcher;
use crate::infrastructure::runtime::rate_limiter::RateLimiterRegistry;
use crate::infrastructure::runtime::registry::HandlerRegistry;

/// The assembled coordination core.
pub struct DiscoveryEngine {
    settings: EngineSettings,
    registry: Arc<HandlerRegistry>,
    dispatcher: Arc<EventDispatcher>,
    sessions: Arc<SessionManager>,
    metrics: MetricsService,
    rate_limiters: Arc<RateLimiterRegistry>,
    guess_filter: Arc<GuessFilter>,
    write_queue: Arc<GraphWriteQueue>,
    shutdown: ShutdownCoordinator,
}

impl DiscoveryEngine {
    /// Creates an engine backed by the in-memory graph repository.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidConfiguration` for invalid settings and
    /// `EngineError::MetricsError` when metric registration fails.
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        Self::with_repository(settings, Arc::new(InMemoryGraphRepository::new()))
    }

    /// Creates an engine over an explicit graph store collaborator.
    ///
    /// # Errors
    /// See [`DiscoveryEngine::new`].
    pub fn with_repository(
        settings: EngineSettings,
        repository: Arc<dyn GraphRepository>,
    ) -> Result<Self, EngineError> {
        settings.validate()?;
        let metrics = MetricsService::new()?;
        let registry = Arc::new(HandlerRegistry::new());
        let dispatcher = Arc::new(EventDispatcher::new(registry.clone(), metrics.clone()));
        let write_queue = Arc::new(GraphWriteQueue::new(repository));
        let sessions = Arc::new(SessionManager::new(
            settings.clone(),
            dispatcher.clone(),
            write_queue.clone(),
            metrics.clone(),
        ));
        let shutdown = ShutdownCoordinator::new(settings.shutdown_grace);

        info!(
            quiescence = ?settings.quiescence_window,
            stage_buffer = settings.stage_buffer,
            instance_cap = settings.max_handler_instances,
            "Discovery engine constructed"
        );

        Ok(Self {
            settings,
            registry,
            dispatcher,
            sessions,
            metrics,
            rate_limiters: Arc::new(RateLimiterRegistry::new()),
            guess_filter: Arc::new(GuessFilter::new()),
            write_queue,
            shutdown,
        })
    }

    /// Registers a handler; rejected after `start`.
    ///
    /// # Errors
    /// See [`HandlerRegistry::register`].
    pub fn register_handler(&self, handler: Arc<dyn AssetHandler>) -> Result<(), EngineError> {
        self.registry.register(handler)
    }

    /// Freezes the registry and builds one pipeline per asset type.
    ///
    /// # Errors
    /// Returns `EngineError::RegistryFrozen` when called twice.
    pub fn start(&self) -> Result<(), EngineError> {
        self.registry
            .build_pipelines(self.settings.stage_buffer, self.settings.max_handler_instances)
    }

    /// Creates a session and returns its id.
    ///
    /// # Errors
    /// See [`SessionManager::create`].
    pub fn create_session(&self, config: SessionConfig) -> Result<SessionId, EngineError> {
        self.sessions.create(config).map(|(id, _)| id)
    }

    /// Creates a session and returns both id and handle.
    ///
    /// # Errors
    /// See [`SessionManager::create`].
    pub fn create_session_handle(
        &self,
        config: SessionConfig,
    ) -> Result<(SessionId, Arc<Session>), EngineError> {
        self.sessions.create(config)
    }

    /// Returns a session handle.
    ///
    /// # Errors
    /// Returns `EngineError::SessionNotFound` for unknown ids.
    pub fn session(&self, session_id: SessionId) -> Result<Arc<Session>, EngineError> {
        self.sessions.get(session_id)
    }

    /// Wraps an asset as an event and dispatches it into the session.
    ///
    /// # Errors
    /// See [`EventDispatch::dispatch_event`] for the dispatch error
    /// contract.
    pub fn ingest_asset(&self, session_id: SessionId, asset: Asset) -> Result<EventId, EngineError> {
        let event = DiscoveryEvent::new(session_id, asset);
        let event_id = event.event_id();
        self.dispatcher.dispatch_event(event)?;
        Ok(event_id)
    }

    /// Returns a session's statistics snapshot.
    ///
    /// # Errors
    /// Returns `EngineError::SessionNotFound` for unknown ids.
    pub fn session_stats(&self, session_id: SessionId) -> Result<StatsSnapshot, EngineError> {
        Ok(self.sessions.get(session_id)?.stats_snapshot())
    }

    /// Opens a subscription to a session's log stream.
    ///
    /// # Errors
    /// Returns `EngineError::SessionNotFound` for unknown ids.
    pub fn subscribe_log(&self, session_id: SessionId) -> Result<BoxStream<'static, LogRecord>, EngineError> {
        Ok(self.sessions.get(session_id)?.subscribe_log())
    }

    /// Cancels a session; idempotent.
    ///
    /// # Errors
    /// Returns `EngineError::SessionNotFound` for unknown ids.
    pub fn terminate_session(&self, session_id: SessionId) -> Result<(), EngineError> {
        self.sessions.cancel(session_id)
    }

    /// Waits until a session has been idle for the quiescence window (or
    /// was cancelled).
    ///
    /// # Errors
    /// Returns `EngineError::SessionNotFound` for unknown ids.
    pub async fn wait_for_quiescence(&self, session_id: SessionId) -> Result<(), EngineError> {
        let session = self.sessions.get(session_id)?;
        session.wait_for_quiescence().await;
        Ok(())
    }

    /// Returns the dispatch port handlers and embedding layers use
    pub fn dispatcher(&self) -> Arc<dyn EventDispatch> {
        self.dispatcher.clone()
    }

    /// Returns the global guess admission filter
    pub fn guess_filter(&self) -> &Arc<GuessFilter> {
        &self.guess_filter
    }

    /// Returns the per-plugin rate limiter registry
    pub fn rate_limiters(&self) -> &Arc<RateLimiterRegistry> {
        &self.rate_limiters
    }

    /// Returns the engine metrics service
    pub fn metrics(&self) -> &MetricsService {
        &self.metrics
    }

    /// Returns the graph write queue
    pub fn write_queue(&self) -> &Arc<GraphWriteQueue> {
        &self.write_queue
    }

    /// Returns the shutdown coordinator, for wiring OS signals or external
    /// supervisors to engine teardown
    pub fn shutdown_coordinator(&self) -> ShutdownCoordinator {
        self.shutdown.clone()
    }

    /// Shuts the engine down: cancels all sessions, drains every pipeline,
    /// and stops the graph write queue.
    ///
    /// The drain is bounded by the configured shutdown grace period.
    /// Returns `true` when everything drained in time; `false` means the
    /// grace period expired with work still settling in the background.
    pub async fn shutdown(&self) -> bool {
        self.shutdown.initiate();

        let sessions = self.sessions.clone();
        let registry = self.registry.clone();
        let write_queue = self.write_queue.clone();
        let coordinator = self.shutdown.clone();
        tokio::spawn(async move {
            sessions.shutdown().await;
            registry.shutdown().await;
            write_queue.shutdown().await;
            coordinator.mark_drained();
        });

        let graceful = self.shutdown.wait_drained().await;
        if graceful {
            info!("Discovery engine shut down");
        } else {
            warn!("Discovery engine shutdown exceeded its grace period");
        }
        graceful
    }
}
