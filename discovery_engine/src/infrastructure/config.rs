// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Engine Configuration
//!
//! Engine-level tunables plus loading of session configurations from YAML
//! or TOML. The outer configuration shell (file discovery, environment
//! layering) belongs to the embedding application; the engine consumes a
//! parsed [`SessionConfig`] and its own [`EngineSettings`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use discovery_engine_bootstrap::shutdown::DEFAULT_GRACE_PERIOD_SECS;
use discovery_engine_domain::entities::session_config::{SessionConfig, DEFAULT_MAX_HANDLER_INSTANCES};
use discovery_engine_domain::EngineError;

use crate::infrastructure::runtime::pipeline::DEFAULT_STAGE_BUFFER;

/// Default quiescence window: how long the in-flight counter must stay at
/// zero before a session is declared idle
pub const DEFAULT_QUIESCENCE_WINDOW: Duration = Duration::from_secs(3);

/// Engine-wide tunables fixed at engine construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Sustained-zero window for declaring a session idle
    #[serde(with = "duration_secs", default = "default_quiescence")]
    pub quiescence_window: Duration,
    /// Bounded buffer depth between pipeline stages
    #[serde(default = "default_stage_buffer")]
    pub stage_buffer: usize,
    /// Cap substituted for handlers declaring unbounded instances
    #[serde(default = "default_instance_cap")]
    pub max_handler_instances: usize,
    /// Upper bound on the engine drain at shutdown
    #[serde(with = "duration_secs", default = "default_shutdown_grace")]
    pub shutdown_grace: Duration,
}

fn default_quiescence() -> Duration {
    DEFAULT_QUIESCENCE_WINDOW
}

fn default_stage_buffer() -> usize {
    DEFAULT_STAGE_BUFFER
}

fn default_instance_cap() -> usize {
    DEFAULT_MAX_HANDLER_INSTANCES
}

fn default_shutdown_grace() -> Duration {
    Duration::from_secs(DEFAULT_GRACE_PERIOD_SECS)
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            quiescence_window: DEFAULT_QUIESCENCE_WINDOW,
            stage_buffer: DEFAULT_STAGE_BUFFER,
            max_handler_instances: DEFAULT_MAX_HANDLER_INSTANCES,
            shutdown_grace: default_shutdown_grace(),
        }
    }
}

impl EngineSettings {
    /// Validates the settings.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidConfiguration` for zero buffer depth or
    /// a zero instance cap.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.stage_buffer == 0 {
            return Err(EngineError::invalid_config("stage_buffer must be positive"));
        }
        if self.max_handler_instances == 0 {
            return Err(EngineError::invalid_config("max_handler_instances must be positive"));
        }
        Ok(())
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Loads a session configuration from a YAML or TOML file, keyed on the
/// file extension (`.yaml`/`.yml`/`.toml`).
///
/// # Errors
/// Returns `EngineError::InvalidConfiguration` for unreadable files,
/// unknown extensions, or parse failures, and propagates the config's own
/// validation errors.
pub fn load_session_config(path: &Path) -> Result<SessionConfig, EngineError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| EngineError::invalid_config(format!("Cannot read {}: {}", path.display(), e)))?;

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let config: SessionConfig = match extension {
        "yaml" | "yml" => serde_yaml::from_str(&raw)
            .map_err(|e| EngineError::invalid_config(format!("Invalid YAML in {}: {}", path.display(), e)))?,
        "toml" => toml::from_str(&raw)
            .map_err(|e| EngineError::invalid_config(format!("Invalid TOML in {}: {}", path.display(), e)))?,
        other => {
            return Err(EngineError::invalid_config(format!(
                "Unsupported config extension '{}' for {}",
                other,
                path.display()
            )))
        }
    };

    config.validate()?;
    Ok(config)
}

/// Parses a session configuration from a YAML string.
///
/// # Errors
/// Returns `EngineError::InvalidConfiguration` on parse or validation
/// failure.
pub fn parse_session_config_yaml(raw: &str) -> Result<SessionConfig, EngineError> {
    let config: SessionConfig =
        serde_yaml::from_str(raw).map_err(|e| EngineError::invalid_config(format!("Invalid YAML: {}", e)))?;
    config.validate()?;
    Ok(config)
}
