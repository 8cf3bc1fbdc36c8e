// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Handler Registry
//!
//! This module provides the registry mapping asset types to priority
//! buckets of registered handlers, and the pipeline builder that turns
//! those buckets into per-asset-type staged executors.
//!
//! ## Lifecycle
//!
//! Registration is open from engine construction until `build_pipelines`
//! runs, and is safe from any thread. Building freezes the registry: the
//! handler table becomes immutable, one pipeline is constructed per
//! registered asset type, and any further `register` call is rejected with
//! `RegistryFrozen`. The freeze is what lets pipelines and dispatch run
//! without locks on the handler table.
//!
//! ## Bucket Semantics
//!
//! Handlers land in `(asset type, priority)` buckets; insertion order is
//! preserved within a bucket. At build time priorities are walked in
//! ascending order: a singleton bucket becomes a gated FIFO stage, a
//! multi-handler bucket becomes a parallel fan-out stage of peers.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use discovery_engine_domain::entities::asset::AssetType;
use discovery_engine_domain::services::asset_handler::AssetHandler;
use discovery_engine_domain::value_objects::{HandlerId, Priority};
use discovery_engine_domain::EngineError;

use crate::infrastructure::runtime::pipeline::{AssetPipeline, HandlerSlot, StageSpec};

struct RegistryInner {
    frozen: bool,
    buckets: HashMap<AssetType, BTreeMap<Priority, Vec<Arc<dyn AssetHandler>>>>,
    ids: HashSet<HandlerId>,
}

/// Registry of handler registrations, frozen into pipelines at build time.
pub struct HandlerRegistry {
    inner: RwLock<RegistryInner>,
    pipelines: RwLock<HashMap<AssetType, Arc<AssetPipeline>>>,
}

impl HandlerRegistry {
    /// Creates an empty, unfrozen registry
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                frozen: false,
                buckets: HashMap::new(),
                ids: HashSet::new(),
            }),
            pipelines: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a handler.
    ///
    /// The handler's declared priority is already clamped to `[1..9]` by
    /// the [`Priority`] value object; the registry stores it as declared.
    ///
    /// # Errors
    /// - `EngineError::RegistryFrozen` after `build_pipelines` has run
    /// - `EngineError::AlreadyRegistered` when the `(plugin, name)` pair is
    ///   taken
    pub fn register(&self, handler: Arc<dyn AssetHandler>) -> Result<(), EngineError> {
        let mut inner = self.inner.write();
        if inner.frozen {
            return Err(EngineError::RegistryFrozen(format!(
                "Cannot register {} after pipelines are built",
                handler.id()
            )));
        }
        let id = handler.id();
        if !inner.ids.insert(id.clone()) {
            return Err(EngineError::AlreadyRegistered(id.to_string()));
        }

        let asset_type = handler.asset_type();
        let priority = handler.priority();
        inner
            .buckets
            .entry(asset_type)
            .or_default()
            .entry(priority)
            .or_default()
            .push(handler);
        debug!(handler = %id, asset_type = %asset_type, priority = %priority, "Handler registered");
        Ok(())
    }

    /// Returns the number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.inner.read().ids.len()
    }

    /// Returns true once `build_pipelines` has run
    pub fn is_frozen(&self) -> bool {
        self.inner.read().frozen
    }

    /// Freezes the registry and constructs one pipeline per registered
    /// asset type, stages in ascending priority order.
    ///
    /// `default_instance_cap` is the engine-wide cap substituted for
    /// handlers that declare unbounded instances (`max_instances() == 0`).
    ///
    /// # Errors
    /// Returns `EngineError::RegistryFrozen` when called twice.
    pub fn build_pipelines(&self, stage_buffer: usize, default_instance_cap: usize) -> Result<(), EngineError> {
        let mut inner = self.inner.write();
        if inner.frozen {
            return Err(EngineError::RegistryFrozen(
                "Pipelines are already built".to_string(),
            ));
        }
        inner.frozen = true;

        let mut pipelines = self.pipelines.write();
        for (asset_type, priorities) in &inner.buckets {
            let stages: Vec<StageSpec> = priorities
                .iter()
                .map(|(priority, handlers)| {
                    let slots = handlers
                        .iter()
                        .map(|handler| {
                            let declared = handler.max_instances();
                            let effective = if declared == 0 { default_instance_cap } else { declared };
                            HandlerSlot::new(handler.clone(), effective)
                        })
                        .collect();
                    StageSpec::new(*priority, slots)
                })
                .collect();

            let pipeline = Arc::new(AssetPipeline::new(*asset_type, stages, stage_buffer));
            pipelines.insert(*asset_type, pipeline);
        }

        info!(
            asset_types = pipelines.len(),
            handlers = inner.ids.len(),
            "Pipelines built; registry frozen"
        );
        Ok(())
    }

    /// Returns the pipeline serving an asset type.
    ///
    /// # Errors
    /// Returns `EngineError::NoPipeline` when no handler was registered for
    /// the type (or pipelines are not built yet).
    pub fn pipeline_for(&self, asset_type: AssetType) -> Result<Arc<AssetPipeline>, EngineError> {
        self.pipelines
            .read()
            .get(&asset_type)
            .cloned()
            .ok_or_else(|| EngineError::NoPipeline(asset_type.to_string()))
    }

    /// Returns all built pipelines
    pub fn pipelines(&self) -> Vec<Arc<AssetPipeline>> {
        self.pipelines.read().values().cloned().collect()
    }

    /// Shuts down every pipeline, draining in-flight work
    pub async fn shutdown(&self) {
        let pipelines = self.pipelines();
        for pipeline in pipelines {
            pipeline.shutdown().await;
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
