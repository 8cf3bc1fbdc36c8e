// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Session Asset Cache
//!
//! This module provides the concrete per-session asset cache backing the
//! domain `AssetCacheService` port. Every handler working for a session
//! shares one cache instance; it is the deduplication point that keeps the
//! discovery loop from re-processing assets the session already knows.
//!
//! ## Overview
//!
//! The cache is two layered maps guarded by a single session-scoped mutex:
//!
//! - `assets[asset_type][canonical_key] -> AssetRecord`
//! - `relations[relation_type] -> Vec<RelationRecord>`
//!
//! An optional chained parent cache serves multi-level lookup: a miss in
//! the top layer consults the parent and promotes the result, so repeated
//! lookups stay local. Sessions chain to a shared warm cache when the
//! engine is configured with one.
//!
//! ## Concurrency
//!
//! A single `parking_lot::Mutex` guards both layers. Handlers hit the cache
//! at coarse points (once on entry, once on emit), so the critical sections
//! stay short and uncontended in practice. The lock is never held across
//! the parent lookup.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use discovery_engine_domain::entities::asset::{Asset, AssetRecord, AssetType};
use discovery_engine_domain::entities::relation::{Relation, RelationQuery, RelationRecord};
use discovery_engine_domain::services::cache_service::{AssetCacheService, CacheHit};
use discovery_engine_domain::EngineError;

#[derive(Default)]
struct CacheInner {
    assets: HashMap<AssetType, HashMap<String, AssetRecord>>,
    relations: HashMap<String, Vec<RelationRecord>>,
}

/// Per-session asset and relation cache with optional chained parent.
pub struct SessionCache {
    inner: Mutex<CacheInner>,
    parent: Option<Arc<dyn AssetCacheService>>,
}

impl SessionCache {
    /// Creates an empty cache with no parent layer
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            parent: None,
        }
    }

    /// Creates an empty cache chained to a parent layer.
    ///
    /// Lookup misses consult the parent and promote its records into this
    /// layer; writes never propagate upward.
    pub fn with_parent(parent: Arc<dyn AssetCacheService>) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            parent: Some(parent),
        }
    }

    /// Returns all cached relation records, across all types
    pub fn all_relations(&self) -> Vec<RelationRecord> {
        let inner = self.inner.lock();
        inner.relations.values().flatten().cloned().collect()
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetCacheService for SessionCache {
    fn get_asset(&self, asset: &Asset) -> Option<CacheHit> {
        let asset_type = asset.asset_type();
        let key = asset.canonical_key();

        {
            let inner = self.inner.lock();
            if let Some(record) = inner.assets.get(&asset_type).and_then(|bucket| bucket.get(&key)) {
                return Some(CacheHit {
                    record: record.clone(),
                    promoted: false,
                });
            }
        }

        // Miss: consult the chained parent outside the lock and promote.
        let parent_hit = self.parent.as_ref()?.get_asset(asset)?;
        let mut inner = self.inner.lock();
        let record = inner
            .assets
            .entry(asset_type)
            .or_default()
            .entry(key)
            .or_insert_with(|| parent_hit.record.clone())
            .clone();
        Some(CacheHit {
            record,
            promoted: true,
        })
    }

    fn assets_by_type(&self, asset_type: AssetType) -> Vec<AssetRecord> {
        let inner = self.inner.lock();
        inner
            .assets
            .get(&asset_type)
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default()
    }

    fn set_asset(&self, asset: Asset) -> AssetRecord {
        let asset_type = asset.asset_type();
        let key = asset.canonical_key();
        let mut inner = self.inner.lock();
        let bucket = inner.assets.entry(asset_type).or_default();
        match bucket.get_mut(&key) {
            Some(existing) => {
                existing.touch();
                existing.clone()
            }
            None => {
                let record = AssetRecord::new(asset);
                bucket.insert(key, record.clone());
                record
            }
        }
    }

    fn get_relations(&self, query: &RelationQuery) -> Vec<RelationRecord> {
        let inner = self.inner.lock();
        match &query.relation_type {
            Some(relation_type) => inner
                .relations
                .get(relation_type)
                .map(|records| {
                    records
                        .iter()
                        .filter(|r| query.matches(&r.relation))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
            None => inner
                .relations
                .values()
                .flatten()
                .filter(|r| query.matches(&r.relation))
                .cloned()
                .collect(),
        }
    }

    fn set_relation(&self, relation: Relation) -> Result<RelationRecord, EngineError> {
        let mut inner = self.inner.lock();

        let endpoint_missing = |inner: &CacheInner, key: &discovery_engine_domain::AssetKey| {
            inner
                .assets
                .get(&key.asset_type)
                .map(|bucket| !bucket.contains_key(&key.key))
                .unwrap_or(true)
        };
        if endpoint_missing(&inner, relation.from()) {
            return Err(EngineError::InvalidConfiguration(format!(
                "Relation endpoint not cached: {}",
                relation.from()
            )));
        }
        if endpoint_missing(&inner, relation.to()) {
            return Err(EngineError::InvalidConfiguration(format!(
                "Relation endpoint not cached: {}",
                relation.to()
            )));
        }

        let records = inner
            .relations
            .entry(relation.relation_type().to_string())
            .or_default();
        if let Some(existing) = records.iter_mut().find(|r| r.relation == relation) {
            existing.touch();
            return Ok(existing.clone());
        }
        let record = RelationRecord::new(relation);
        records.push(record.clone());
        Ok(record)
    }

    fn asset_count(&self) -> usize {
        let inner = self.inner.lock();
        inner.assets.values().map(|bucket| bucket.len()).sum()
    }
}
