// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Transformation Permissions
//!
//! Declared `from-type -> to-type(s)` permissions consulted by handlers to
//! decide whether to run. A handler offering `fqdn -> ip_address` checks the
//! session's transformation set before doing any work; when the
//! configuration does not request that edge the handler returns without
//! work (`TransformationMismatch`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::entities::asset::AssetType;

/// One declared transformation permission.
///
/// - An empty `to` set permits every target type.
/// - `exclude` removes specific target types from the permitted set.
/// - An empty `plugins` list permits any plugin; otherwise only the listed
///   plugins may apply this transformation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transformation {
    /// Source asset type of the permitted edge
    pub from: Option<AssetType>,
    /// Permitted target types; empty permits all
    #[serde(default)]
    pub to: BTreeSet<AssetType>,
    /// Target types explicitly excluded
    #[serde(default)]
    pub exclude: BTreeSet<AssetType>,
    /// Plugins permitted to apply this transformation; empty permits all
    #[serde(default)]
    pub plugins: BTreeSet<String>,
}

impl Transformation {
    /// Checks whether this entry permits `from -> to` for `plugin`
    fn permits(&self, from: AssetType, to: AssetType, plugin: Option<&str>) -> bool {
        if let Some(entry_from) = self.from {
            if entry_from != from {
                return false;
            }
        }
        if self.exclude.contains(&to) {
            return false;
        }
        if !self.to.is_empty() && !self.to.contains(&to) {
            return false;
        }
        if !self.plugins.is_empty() {
            match plugin {
                Some(p) => {
                    if !self.plugins.contains(p) {
                        return false;
                    }
                }
                None => return false,
            }
        }
        true
    }
}

/// The session's full set of transformation permissions.
///
/// An empty set is the permissive default: every transformation is
/// requested. As soon as any entry names a `from` type, that type is
/// governed strictly by its entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformationSet {
    entries: Vec<Transformation>,
}

impl TransformationSet {
    /// Creates an empty (fully permissive) transformation set
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set from explicit entries
    pub fn from_entries(entries: Vec<Transformation>) -> Self {
        Self { entries }
    }

    /// Adds an entry
    pub fn push(&mut self, entry: Transformation) {
        self.entries.push(entry);
    }

    /// Returns true when no entries are configured
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Computes the subset of `candidates` the configuration requests for
    /// `from`, optionally restricted to `plugin`.
    ///
    /// Returns the admitted target types; an empty result means the handler
    /// offering these transformations should return without work.
    pub fn check_transformations(
        &self,
        from: AssetType,
        candidates: &[AssetType],
        plugin: Option<&str>,
    ) -> BTreeSet<AssetType> {
        if self.entries.is_empty() {
            return candidates.iter().copied().collect();
        }
        let governed = self
            .entries
            .iter()
            .any(|e| e.from.is_none() || e.from == Some(from));
        if !governed {
            return BTreeSet::new();
        }
        candidates
            .iter()
            .copied()
            .filter(|to| self.entries.iter().any(|e| e.permits(from, *to, plugin)))
            .collect()
    }
}
