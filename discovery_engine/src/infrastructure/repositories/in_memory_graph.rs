// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # In-Memory Graph Repository
//!
//! Default implementation of the graph store collaborator port. Real
//! deployments point the engine at an external asset graph; this
//! implementation backs tests and standalone runs with plain maps so the
//! engine is usable without any collaborator process.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use discovery_engine_domain::entities::asset::AssetRecord;
use discovery_engine_domain::entities::relation::RelationRecord;
use discovery_engine_domain::repositories::graph_repository::GraphRepository;
use discovery_engine_domain::value_objects::SessionId;
use discovery_engine_domain::EngineError;

#[derive(Default)]
struct GraphInner {
    assets: HashMap<SessionId, HashMap<String, AssetRecord>>,
    relations: HashMap<SessionId, Vec<RelationRecord>>,
    closed: bool,
}

/// Map-backed graph store for tests and standalone runs.
#[derive(Default)]
pub struct InMemoryGraphRepository {
    inner: Mutex<GraphInner>,
}

impl InMemoryGraphRepository {
    /// Creates an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored assets for a session
    pub fn asset_count(&self, session_id: SessionId) -> usize {
        self.inner
            .lock()
            .assets
            .get(&session_id)
            .map(|m| m.len())
            .unwrap_or(0)
    }

    /// Returns the number of stored relations for a session
    pub fn relation_count(&self, session_id: SessionId) -> usize {
        self.inner
            .lock()
            .relations
            .get(&session_id)
            .map(|v| v.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl GraphRepository for InMemoryGraphRepository {
    fn system(&self) -> &str {
        "memory"
    }

    async fn upsert_asset(&self, session_id: SessionId, record: &AssetRecord) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(EngineError::database_error("Graph repository is closed"));
        }
        let key = format!("{}", record.asset.key());
        inner
            .assets
            .entry(session_id)
            .or_default()
            .insert(key, record.clone());
        Ok(())
    }

    async fn upsert_relation(&self, session_id: SessionId, record: &RelationRecord) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(EngineError::database_error("Graph repository is closed"));
        }
        let relations = inner.relations.entry(session_id).or_default();
        if let Some(existing) = relations.iter_mut().find(|r| r.relation == record.relation) {
            existing.last_seen = record.last_seen;
        } else {
            relations.push(record.clone());
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.inner.lock().closed = true;
        Ok(())
    }
}
