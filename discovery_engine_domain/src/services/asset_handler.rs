// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Asset Handler Capability
//!
//! This module defines the contract between the discovery engine and its
//! pluggable handlers. A handler contributes one discovery transformation
//! for one asset type: given an event carrying an asset of that type, it may
//! read and mutate the session cache, write to the graph store, and dispatch
//! newly discovered assets back into the engine.
//!
//! ## Overview
//!
//! The capability is split across three pieces:
//!
//! - [`AssetHandler`]: the trait handler authors implement. Registration
//!   metadata (identity, asset type, priority, instance cap, declared output
//!   types, timeout) is exposed as trait methods with sensible defaults, and
//!   the work happens in `invoke`.
//! - [`HandlerContext`]: the per-invocation view of the owning session. The
//!   context borrows the session's services for the duration of the call;
//!   handlers never hold session references across invocations.
//! - [`EventDispatch`] and [`DoneSignal`]: narrow ports the engine
//!   implements. Dispatch is synchronous and non-blocking (the pipeline head
//!   queue is unbounded); the done signal is the session's cancellation
//!   flag, which well-behaved handlers check before expensive work and
//!   between I/O calls.
//!
//! ## Error Contract
//!
//! `invoke` errors accumulate on the event and never abort sibling handlers
//! in a parallel stage. Returning `TransformationMismatch` is the normal
//! "configuration does not request my transformation" fast path and is not
//! counted as a failure.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::entities::asset::AssetType;
use crate::entities::session_config::SessionConfig;
use crate::events::discovery_event::DiscoveryEvent;
use crate::events::log_record::LogRecord;
use crate::repositories::graph_repository::GraphRepository;
use crate::services::cache_service::AssetCacheService;
use crate::services::log_service::LogPublisher;
use crate::value_objects::{HandlerId, Priority};
use crate::EngineError;

/// Default per-handler action timeout applied when a handler declares none
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(60);

/// Dispatch port handlers use to emit newly discovered assets.
///
/// Implemented by the engine's dispatcher. The call validates the session,
/// checks scope, routes to the pipeline for the event's asset type, and
/// returns immediately; it never blocks on pipeline capacity.
pub trait EventDispatch: Send + Sync {
    /// Dispatches an event into the engine.
    ///
    /// # Errors
    /// - `EngineError::SessionNotFound` / `SessionCancelled` for dead sessions
    /// - `EngineError::NotInScope` when the asset falls outside the scope
    /// - `EngineError::NoPipeline` when no handler consumes the asset type
    /// - `EngineError::PipelineClosed` during engine shutdown
    fn dispatch_event(&self, event: DiscoveryEvent) -> Result<(), EngineError>;
}

/// Observable session cancellation flag.
///
/// One-shot: once set it never clears. Handlers poll it at natural
/// checkpoints; the engine also enforces it between pipeline stages.
pub trait DoneSignal: Send + Sync {
    /// Returns true once the session has been cancelled
    fn is_done(&self) -> bool;
}

/// Per-invocation view of the owning session, passed to `invoke`.
///
/// Cheap to clone; all fields are shared handles. The context is scoped to
/// the invocation; handlers must not stash it.
#[derive(Clone)]
pub struct HandlerContext {
    config: Arc<SessionConfig>,
    cache: Arc<dyn AssetCacheService>,
    db: Arc<dyn GraphRepository>,
    log: Arc<dyn LogPublisher>,
    done: Arc<dyn DoneSignal>,
    dispatcher: Arc<dyn EventDispatch>,
}

impl HandlerContext {
    /// Assembles a context from the session's shared services
    pub fn new(
        config: Arc<SessionConfig>,
        cache: Arc<dyn AssetCacheService>,
        db: Arc<dyn GraphRepository>,
        log: Arc<dyn LogPublisher>,
        done: Arc<dyn DoneSignal>,
        dispatcher: Arc<dyn EventDispatch>,
    ) -> Self {
        Self {
            config,
            cache,
            db,
            log,
            done,
            dispatcher,
        }
    }

    /// Returns the session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the session asset cache
    pub fn cache(&self) -> &dyn AssetCacheService {
        self.cache.as_ref()
    }

    /// Returns the graph store handle
    pub fn db(&self) -> &Arc<dyn GraphRepository> {
        &self.db
    }

    /// Publishes a record on the session log bus
    pub fn log(&self, record: LogRecord) {
        self.log.publish(record);
    }

    /// Returns true once the session has been cancelled
    pub fn is_done(&self) -> bool {
        self.done.is_done()
    }

    /// Dispatches a newly discovered asset back into the engine.
    ///
    /// # Errors
    /// See [`EventDispatch::dispatch_event`].
    pub fn dispatch(&self, event: DiscoveryEvent) -> Result<(), EngineError> {
        self.dispatcher.dispatch_event(event)
    }

    /// Checks which of the transformations this handler offers are
    /// requested by the session configuration.
    ///
    /// Returns the admitted target types; handlers receiving an empty set
    /// should return [`EngineError::TransformationMismatch`] without work.
    pub fn check_transformations(
        &self,
        from: AssetType,
        candidates: &[AssetType],
        plugin: Option<&str>,
    ) -> std::collections::BTreeSet<AssetType> {
        self.config
            .transformations
            .check_transformations(from, candidates, plugin)
    }
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("active", &self.config.active)
            .field("done", &self.done.is_done())
            .finish()
    }
}

/// The capability a plugin registers for one asset type.
///
/// Registration metadata is part of the trait so a handler is a single
/// self-describing value; the registry clamps the declared priority and
/// applies the engine-wide instance cap to handlers that declare none.
#[async_trait]
pub trait AssetHandler: Send + Sync {
    /// Unique `(plugin, name)` identity of this handler
    fn id(&self) -> HandlerId;

    /// The asset type this handler consumes
    fn asset_type(&self) -> AssetType;

    /// Execution priority within the pipeline; clamped to `[1..9]`
    fn priority(&self) -> Priority {
        Priority::DEFAULT
    }

    /// Maximum concurrent invocations; `0` means unbounded (the engine-wide
    /// cap still applies)
    fn max_instances(&self) -> usize {
        0
    }

    /// Asset types this handler may emit, used for transformation checks
    fn output_types(&self) -> Vec<AssetType> {
        Vec::new()
    }

    /// Per-invocation timeout; exceeding it marks the event errored
    fn timeout(&self) -> Duration {
        DEFAULT_HANDLER_TIMEOUT
    }

    /// Processes one event.
    ///
    /// # Errors
    /// Errors accumulate on the event's error accumulator; they do not abort
    /// sibling handlers or the pipeline.
    async fn invoke(&self, event: &DiscoveryEvent, ctx: &HandlerContext) -> Result<(), EngineError>;
}
