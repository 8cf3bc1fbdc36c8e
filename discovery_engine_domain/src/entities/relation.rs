// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Relation Entity
//!
//! Typed directed edges between discovered assets. Relations connect cache
//! records (`a_record`, `cname_record`, `ns_record`, `contains`, `announces`,
//! `managed_by`, ...) and carry created/last-seen stamps. The relation type
//! is a free-form string owned by the handler that produced the edge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::entities::asset::AssetKey;
use crate::EngineError;

/// A typed directed edge between two assets.
///
/// Endpoints are canonical [`AssetKey`]s. Duplicate `(type, from, to)`
/// triples collapse to a single logical edge; re-insertion refreshes
/// `last_seen` on the stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    relation_type: String,
    from: AssetKey,
    to: AssetKey,
}

impl Relation {
    /// Creates a relation edge.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidConfiguration` when the relation type is
    /// empty.
    pub fn new(relation_type: impl Into<String>, from: AssetKey, to: AssetKey) -> Result<Self, EngineError> {
        let relation_type = relation_type.into();
        if relation_type.trim().is_empty() {
            return Err(EngineError::InvalidConfiguration(
                "Relation type cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            relation_type,
            from,
            to,
        })
    }

    /// Returns the relation type label
    pub fn relation_type(&self) -> &str {
        &self.relation_type
    }

    /// Returns the source endpoint key
    pub fn from(&self) -> &AssetKey {
        &self.from
    }

    /// Returns the target endpoint key
    pub fn to(&self) -> &AssetKey {
        &self.to
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -{}-> {}", self.from, self.relation_type, self.to)
    }
}

/// Stored cache record for a relation, stamped with discovery timestamps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord {
    /// The relation edge
    pub relation: Relation,
    /// First time the edge was observed in this session
    pub created_at: DateTime<Utc>,
    /// Most recent time the edge was observed in this session
    pub last_seen: DateTime<Utc>,
}

impl RelationRecord {
    /// Creates a record stamped with the current instant
    pub fn new(relation: Relation) -> Self {
        let now = Utc::now();
        Self {
            relation,
            created_at: now,
            last_seen: now,
        }
    }

    /// Refreshes the last-seen stamp
    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }
}

/// Predicate for relation lookups.
///
/// Each field is optional; a record matches when every populated field
/// matches. The empty query matches every relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationQuery {
    /// Match on relation type label
    pub relation_type: Option<String>,
    /// Match on source endpoint
    pub from: Option<AssetKey>,
    /// Match on target endpoint
    pub to: Option<AssetKey>,
}

impl RelationQuery {
    /// Creates the match-everything query
    pub fn any() -> Self {
        Self::default()
    }

    /// Restricts the query to a relation type
    pub fn with_type(mut self, relation_type: impl Into<String>) -> Self {
        self.relation_type = Some(relation_type.into());
        self
    }

    /// Restricts the query to a source endpoint
    pub fn with_from(mut self, from: AssetKey) -> Self {
        self.from = Some(from);
        self
    }

    /// Restricts the query to a target endpoint
    pub fn with_to(mut self, to: AssetKey) -> Self {
        self.to = Some(to);
        self
    }

    /// Checks the predicate against a relation
    pub fn matches(&self, relation: &Relation) -> bool {
        if let Some(relation_type) = &self.relation_type {
            if relation.relation_type() != relation_type {
                return false;
            }
        }
        if let Some(from) = &self.from {
            if relation.from() != from {
                return false;
            }
        }
        if let Some(to) = &self.to {
            if relation.to() != to {
                return false;
            }
        }
        true
    }
}
