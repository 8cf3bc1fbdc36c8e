// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Discovery Engine Domain Layer
//!
//! Pure domain logic for the network asset discovery engine: the asset
//! model, relations, event envelopes, per-session configuration and
//! statistics, the handler capability contract, and the ports the engine
//! implements for handlers (cache, log bus, dispatch, done signal) and
//! consumes from collaborators (graph repository).
//!
//! ## Architecture
//!
//! This crate follows Domain-Driven Design layering:
//!
//! - **Entities** (`entities`): assets, relations, session configuration,
//!   session statistics
//! - **Value Objects** (`value_objects`): identifiers, priority, scope,
//!   transformation permissions
//! - **Events** (`events`): the discovery event envelope and log records
//! - **Services** (`services`): the `AssetHandler` capability and the ports
//!   handlers reach through the handler context
//! - **Repositories** (`repositories`): collaborator ports (graph store)
//! - **Error** (`error`): the `EngineError` hierarchy
//!
//! The crate is infrastructure-free: no tokio runtime, no tracing, no
//! storage drivers. Async appears only at port boundaries via `async-trait`.

pub mod entities;
pub mod error;
pub mod events;
pub mod repositories;
pub mod services;
pub mod value_objects;

// Re-export commonly used types for convenient access
// These exports provide a clean API surface for consumers of the domain layer
pub use entities::{
    Asset, AssetKey, AssetRecord, AssetType, Relation, RelationQuery, RelationRecord, SessionConfig, SessionStats,
    StatsSnapshot,
};
pub use error::EngineError;
pub use events::{DiscoveryEvent, LogPayload, LogRecord, LogSeverity};
pub use services::{AssetCacheService, AssetHandler, EventDispatch, HandlerContext, LogPublisher};
pub use value_objects::{EventId, HandlerId, Priority, Scope, SessionId, TransformationSet};
