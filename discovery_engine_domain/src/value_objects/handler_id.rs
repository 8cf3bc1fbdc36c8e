// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Handler identifier value object.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::EngineError;

/// Composite identifier for a registered handler: `(plugin, name)`.
///
/// A plugin may contribute several handlers (one per asset type it consumes,
/// typically); the pair is the registry's uniqueness key. The display form is
/// `plugin/name`, which is also the accepted parse form.
///
/// # Examples
///
/// ```
/// use discovery_engine_domain::value_objects::HandlerId;
///
/// let id = HandlerId::new("dns", "cname_lookup").unwrap();
/// assert_eq!(id.to_string(), "dns/cname_lookup");
///
/// let parsed: HandlerId = "dns/cname_lookup".parse().unwrap();
/// assert_eq!(parsed, id);
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct HandlerId {
    plugin: String,
    name: String,
}

impl HandlerId {
    /// Creates a handler identifier.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidConfiguration` when either component is
    /// empty or the plugin component contains the separator character.
    pub fn new(plugin: impl Into<String>, name: impl Into<String>) -> Result<Self, EngineError> {
        let plugin = plugin.into();
        let name = name.into();
        if plugin.is_empty() || name.is_empty() {
            return Err(EngineError::InvalidConfiguration(
                "Handler ID requires a non-empty plugin and name".to_string(),
            ));
        }
        if plugin.contains('/') {
            return Err(EngineError::InvalidConfiguration(format!(
                "Plugin ID '{}' must not contain '/'",
                plugin
            )));
        }
        Ok(Self { plugin, name })
    }

    /// Returns the plugin component
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Returns the handler name component
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.plugin, self.name)
    }
}

impl std::str::FromStr for HandlerId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((plugin, name)) => Self::new(plugin, name),
            None => Err(EngineError::InvalidConfiguration(format!(
                "Invalid handler ID '{}': expected plugin/name",
                s
            ))),
        }
    }
}
