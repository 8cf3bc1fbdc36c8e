// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Asset Cache Port
//!
//! The per-session deduplication cache consulted by every handler: assets
//! keyed by `(type, canonical key)` and relations keyed by type. The port is
//! synchronous: implementations guard their maps with a short-lived mutex,
//! and handlers hit the cache at coarse points (once on entry, once on
//! emit), so contention stays bounded. No implementation may hold its lock
//! across I/O.

use crate::entities::asset::{Asset, AssetRecord, AssetType};
use crate::entities::relation::{Relation, RelationQuery, RelationRecord};
use crate::EngineError;

/// Result of a cache lookup: the stored record plus where it was found
#[derive(Debug, Clone, PartialEq)]
pub struct CacheHit {
    /// The stored record
    pub record: AssetRecord,
    /// True when the record was promoted from a chained parent cache
    pub promoted: bool,
}

/// Session-scoped asset and relation cache.
///
/// # Invariants
///
/// - Inserting an asset twice (same type, same canonical key) leaves exactly
///   one record; re-insertion refreshes `last_seen`.
/// - Inserting a relation triple `(type, from, to)` any number of times
///   leaves exactly one logical edge.
/// - A lookup miss in the top layer consults the chained parent cache, if
///   any, and promotes the result into the top layer.
pub trait AssetCacheService: Send + Sync {
    /// Looks up an asset by its canonical identity.
    ///
    /// Returns `None` on a full miss; otherwise the stored record and a flag
    /// reporting whether a chained-parent promotion satisfied the lookup.
    fn get_asset(&self, asset: &Asset) -> Option<CacheHit>;

    /// Returns all cached records of one asset type
    fn assets_by_type(&self, asset_type: AssetType) -> Vec<AssetRecord>;

    /// Upserts an asset and returns the stored record.
    ///
    /// A repeated insert refreshes `last_seen` on the existing record.
    fn set_asset(&self, asset: Asset) -> AssetRecord;

    /// Returns all relation records matching the predicate
    fn get_relations(&self, query: &RelationQuery) -> Vec<RelationRecord>;

    /// Appends a relation; matching triples are idempotent.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidConfiguration` when either endpoint is
    /// not present in the asset layer; relations may only connect existing
    /// records.
    fn set_relation(&self, relation: Relation) -> Result<RelationRecord, EngineError>;

    /// Returns the total number of cached assets across all types
    fn asset_count(&self) -> usize;
}
