// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Session Identifier
//!
//! ULID-backed session identifier value object. Sessions are the unit of
//! isolation in the engine; every event, cache entry, and log record is
//! attributed to exactly one session id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use ulid::Ulid;

use crate::EngineError;

/// Session identifier value object for type-safe session management.
///
/// Wraps a ULID so that session identifiers sort by creation time, which
/// keeps session listings and audit trails naturally chronological without a
/// secondary timestamp index.
///
/// # Key Features
///
/// - **Type Safety**: `SessionId` cannot be confused with `EventId` or other
///   identifier types in function signatures
/// - **Time Ordering**: ULID encoding yields lexicographic ordering by
///   creation instant
/// - **Global Uniqueness**: 80 bits of randomness per millisecond guarantee
///   uniqueness across engine instances
/// - **Serialization**: Stable string form for APIs and storage
///
/// # Examples
///
/// ```
/// use discovery_engine_domain::value_objects::SessionId;
///
/// let a = SessionId::new();
/// let b = SessionId::new();
/// assert_ne!(a, b);
///
/// let parsed: SessionId = a.to_string().parse().unwrap();
/// assert_eq!(parsed, a);
/// ```
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Ulid);

impl SessionId {
    /// Creates a new session identifier from the current instant
    pub fn new() -> Self {
        SessionId(Ulid::new())
    }

    /// Creates a session identifier from an existing ULID.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidConfiguration` for the nil ULID.
    pub fn from_ulid(ulid: Ulid) -> Result<Self, EngineError> {
        if ulid.0 == 0 {
            return Err(EngineError::InvalidConfiguration(
                "Session ID cannot be nil ULID".to_string(),
            ));
        }
        Ok(SessionId(ulid))
    }

    /// Returns the creation timestamp encoded in the identifier
    pub fn timestamp(&self) -> DateTime<Utc> {
        let millis = self.0.timestamp_ms();
        DateTime::from_timestamp_millis(millis as i64).unwrap_or_else(Utc::now)
    }

    /// Returns the underlying ULID
    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid = Ulid::from_string(s)
            .map_err(|e| EngineError::InvalidConfiguration(format!("Invalid session ID '{}': {}", s, e)))?;
        Self::from_ulid(ulid)
    }
}
