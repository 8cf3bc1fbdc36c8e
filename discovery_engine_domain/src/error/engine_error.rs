// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Engine Error Types
//!
//! This module defines the comprehensive error hierarchy for the discovery
//! engine. All fallible operations in the domain, application, and
//! infrastructure layers surface failures through [`EngineError`].
//!
//! ## Overview
//!
//! The error system distinguishes three broad families:
//!
//! - **Admission errors**: an input was rejected before any work happened
//!   (`NotInScope`, `TransformationMismatch`). These are expected outcomes in
//!   normal operation and are counted rather than logged at error level.
//! - **Handler errors**: a handler failed while processing an event
//!   (`AssetExtraction`, `ExternalService`, `RateLimited`, `Timeout`). These
//!   accumulate on the event and never abort sibling handlers.
//! - **Lifecycle errors**: a caller violated the registry or session life
//!   cycle (`AlreadyRegistered`, `RegistryFrozen`, `NoPipeline`,
//!   `PipelineClosed`, `SessionNotFound`, `SessionCancelled`). These are
//!   surfaced directly to the caller.
//!
//! ## Error Handling Strategy
//!
//! - Handler errors are captured into the event's error accumulator; peers in
//!   a parallel stage still run, and the pipeline continues to the sink.
//! - Lifecycle errors short-circuit the operation that triggered them.
//! - Only registry inconsistency and a lost graph-store handle are treated as
//!   fatal for a session; the session manager cancels the session in
//!   response. The engine never aborts the process.

use thiserror::Error;

/// Domain-specific errors for the asset discovery engine.
///
/// Each variant includes a descriptive message and is designed to provide
/// clear information about what went wrong and potentially how to fix it.
///
/// ## Design Principles
///
/// - **Specific**: Each error type represents a specific failure mode
/// - **Actionable**: Error messages provide enough context for debugging
/// - **Categorized**: Errors are grouped by type for systematic handling
/// - **Recoverable**: Some errors indicate retry-able conditions
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("Asset not in scope: {0}")]
    NotInScope(String),

    #[error("Asset extraction failed: {0}")]
    AssetExtraction(String),

    #[error("Transformation not requested: {0}")]
    TransformationMismatch(String),

    #[error("External service failure: {0}")]
    ExternalService(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Handler already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Registry is frozen: {0}")]
    RegistryFrozen(String),

    #[error("No pipeline for asset type: {0}")]
    NoPipeline(String),

    #[error("Pipeline closed: {0}")]
    PipelineClosed(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session cancelled: {0}")]
    SessionCancelled(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Metrics error: {0}")]
    MetricsError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl EngineError {
    /// Creates a new not-in-scope error
    pub fn not_in_scope(msg: impl Into<String>) -> Self {
        Self::NotInScope(msg.into())
    }

    /// Creates a new asset extraction error
    pub fn asset_extraction(msg: impl Into<String>) -> Self {
        Self::AssetExtraction(msg.into())
    }

    /// Creates a new transformation mismatch error
    pub fn transformation_mismatch(msg: impl Into<String>) -> Self {
        Self::TransformationMismatch(msg.into())
    }

    /// Creates a new external service error
    pub fn external_service(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }

    /// Creates a new timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Creates a new configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates a new database error
    pub fn database_error(msg: impl Into<String>) -> Self {
        Self::DatabaseError(msg.into())
    }

    /// Creates a new metrics error
    pub fn metrics_error(msg: impl Into<String>) -> Self {
        Self::MetricsError(msg.into())
    }

    /// Creates a new internal error
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Checks if the error is recoverable through retry
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::ExternalService(_) | EngineError::RateLimited(_) | EngineError::Timeout(_)
        )
    }

    /// Checks if the error is an admission rejection rather than a failure.
    ///
    /// Admission rejections are expected in normal operation and are counted
    /// rather than logged at error level.
    pub fn is_admission_rejection(&self) -> bool {
        matches!(
            self,
            EngineError::NotInScope(_) | EngineError::TransformationMismatch(_)
        )
    }

    /// Checks if the error is a registry or session lifecycle violation
    pub fn is_lifecycle_error(&self) -> bool {
        matches!(
            self,
            EngineError::AlreadyRegistered(_)
                | EngineError::RegistryFrozen(_)
                | EngineError::NoPipeline(_)
                | EngineError::PipelineClosed(_)
                | EngineError::SessionNotFound(_)
                | EngineError::SessionCancelled(_)
        )
    }

    /// Gets the error category
    pub fn category(&self) -> &'static str {
        match self {
            EngineError::NotInScope(_) => "scope",
            EngineError::AssetExtraction(_) => "extraction",
            EngineError::TransformationMismatch(_) => "transformation",
            EngineError::ExternalService(_) => "external",
            EngineError::RateLimited(_) => "rate_limit",
            EngineError::Timeout(_) => "timeout",
            EngineError::AlreadyRegistered(_) => "registry",
            EngineError::RegistryFrozen(_) => "registry",
            EngineError::NoPipeline(_) => "dispatch",
            EngineError::PipelineClosed(_) => "dispatch",
            EngineError::SessionNotFound(_) => "session",
            EngineError::SessionCancelled(_) => "session",
            EngineError::InvalidConfiguration(_) => "configuration",
            EngineError::DatabaseError(_) => "database",
            EngineError::SerializationError(_) => "serialization",
            EngineError::MetricsError(_) => "metrics",
            EngineError::InternalError(_) => "internal",
        }
    }
}

// Implement conversion from standard library errors
impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::ExternalService(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::SerializationError(err.to_string())
    }
}
