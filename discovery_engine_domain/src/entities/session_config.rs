// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Session Configuration
//!
//! Immutable per-session configuration: the discovery scope, transformation
//! permissions, activity level, graph store descriptors, and per-plugin
//! data-source settings. The configuration is validated once at session
//! creation and never mutated afterwards; handlers read it through the
//! handler context.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::value_objects::{Scope, TransformationSet};
use crate::EngineError;

/// Engine-wide default cap on concurrent instances of a single handler
pub const DEFAULT_MAX_HANDLER_INSTANCES: usize = 500;

/// Per-plugin data-source settings: credentials plus rate-limit hints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// Opaque credential material handed to the plugin
    #[serde(default)]
    pub credentials: BTreeMap<String, String>,
    /// Permitted outbound calls per minute to the backing service; `None`
    /// leaves the plugin at the engine default
    #[serde(default)]
    pub rate_limit_per_minute: Option<u32>,
}

/// Opaque descriptor of a graph database collaborator.
///
/// The core never interprets the contents; it only hands the descriptor to
/// the persistence collaborator when asking it to connect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDbDescriptor {
    /// Storage system identifier (e.g. `postgres`, `memory`)
    pub system: String,
    /// Connection string or path, opaque to the core
    #[serde(default)]
    pub address: String,
    /// Marks the primary store when several are listed
    #[serde(default)]
    pub primary: bool,
}

/// Immutable per-session configuration.
///
/// # Invariants
///
/// - Validated by [`SessionConfig::validate`] before a session is created
/// - Never mutated after session creation (shared behind `Arc`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// The discovery scope; assets outside it are dropped as `NotInScope`
    #[serde(default)]
    pub scope: Scope,
    /// Declared transformation permissions
    #[serde(default)]
    pub transformations: TransformationSet,
    /// Gates aggressive behavior (larger sweeps, active probing)
    #[serde(default)]
    pub active: bool,
    /// Graph database descriptors; the primary one backs the session
    #[serde(default)]
    pub graph_dbs: Vec<GraphDbDescriptor>,
    /// Per-plugin credentials and rate hints, keyed by plugin id
    #[serde(default)]
    pub data_source_configs: BTreeMap<String, DataSourceConfig>,
    /// Engine-wide cap applied to handlers that declare no instance limit
    #[serde(default = "default_max_handler_instances")]
    pub max_handler_instances: usize,
}

fn default_max_handler_instances() -> usize {
    DEFAULT_MAX_HANDLER_INSTANCES
}

impl SessionConfig {
    /// Creates a configuration with the given scope and defaults elsewhere
    pub fn with_scope(scope: Scope) -> Self {
        Self {
            scope,
            max_handler_instances: DEFAULT_MAX_HANDLER_INSTANCES,
            ..Default::default()
        }
    }

    /// Returns the primary graph database descriptor, if any is configured
    pub fn primary_graph_db(&self) -> Option<&GraphDbDescriptor> {
        self.graph_dbs
            .iter()
            .find(|db| db.primary)
            .or_else(|| self.graph_dbs.first())
    }

    /// Returns the data-source settings for a plugin, if configured
    pub fn data_source(&self, plugin: &str) -> Option<&DataSourceConfig> {
        self.data_source_configs.get(plugin)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidConfiguration` when the handler instance
    /// cap is zero or a listed graph descriptor has an empty system name.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_handler_instances == 0 {
            return Err(EngineError::InvalidConfiguration(
                "max_handler_instances must be positive".to_string(),
            ));
        }
        for db in &self.graph_dbs {
            if db.system.trim().is_empty() {
                return Err(EngineError::InvalidConfiguration(
                    "Graph database descriptor requires a system name".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = SessionConfig::with_scope(Scope::new().add_domain("example.com"));
        assert!(config.validate().is_ok());
        assert_eq!(config.max_handler_instances, DEFAULT_MAX_HANDLER_INSTANCES);
    }

    #[test]
    fn test_zero_instance_cap_rejected() {
        let config = SessionConfig {
            max_handler_instances: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_primary_graph_db_prefers_marked_entry() {
        let config = SessionConfig {
            graph_dbs: vec![
                GraphDbDescriptor {
                    system: "memory".to_string(),
                    ..Default::default()
                },
                GraphDbDescriptor {
                    system: "postgres".to_string(),
                    address: "postgres://graph".to_string(),
                    primary: true,
                },
            ],
            max_handler_instances: DEFAULT_MAX_HANDLER_INSTANCES,
            ..Default::default()
        };
        assert_eq!(config.primary_graph_db().unwrap().system, "postgres");
    }

    #[test]
    fn test_empty_system_name_rejected() {
        let config = SessionConfig {
            graph_dbs: vec![GraphDbDescriptor::default()],
            max_handler_instances: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
