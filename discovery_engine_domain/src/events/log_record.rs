// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Session Log Records
//!
//! Structured records published on the per-session log bus. External
//! subscribers (the API layer's `subscribe-log` surface) receive these as a
//! stream; handlers publish them through the log port on the handler
//! context. Statistics snapshots ride the same stream so a subscriber can
//! follow progress without polling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display};

use crate::entities::session_stats::StatsSnapshot;
use crate::value_objects::SessionId;

/// Severity of a session log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    Debug,
    Info,
    Warn,
    Error,
}

impl Display for LogSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogSeverity::Debug => "debug",
            LogSeverity::Info => "info",
            LogSeverity::Warn => "warn",
            LogSeverity::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// Payload kinds carried on the session log bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogPayload {
    /// Free-form message from a handler or the engine
    Message { message: String },
    /// Progress milestone with a statistics snapshot
    Stats { snapshot: StatsSnapshot },
    /// The session has been idle for the quiescence window
    Idle,
    /// The session was cancelled
    Cancelled,
}

/// One structured record on the session log bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Owning session
    pub session_id: SessionId,
    /// Record severity
    pub severity: LogSeverity,
    /// Component that produced the record (handler id or engine component)
    pub source: String,
    /// The payload
    pub payload: LogPayload,
    /// Additional context fields
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Publication timestamp
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    /// Creates a message record
    pub fn message(
        session_id: SessionId,
        severity: LogSeverity,
        source: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            session_id,
            severity,
            source: source.into(),
            payload: LogPayload::Message {
                message: message.into(),
            },
            fields: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Creates a statistics milestone record
    pub fn stats(session_id: SessionId, source: impl Into<String>, snapshot: StatsSnapshot) -> Self {
        Self {
            session_id,
            severity: LogSeverity::Info,
            source: source.into(),
            payload: LogPayload::Stats { snapshot },
            fields: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Creates an idle notification record
    pub fn idle(session_id: SessionId, source: impl Into<String>) -> Self {
        Self {
            session_id,
            severity: LogSeverity::Info,
            source: source.into(),
            payload: LogPayload::Idle,
            fields: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Creates a cancellation notification record
    pub fn cancelled(session_id: SessionId, source: impl Into<String>) -> Self {
        Self {
            session_id,
            severity: LogSeverity::Warn,
            source: source.into(),
            payload: LogPayload::Cancelled,
            fields: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Adds a context field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}
