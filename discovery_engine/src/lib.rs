// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Discovery Engine
//!
//! Event-driven coordination core of a network asset discovery engine.
//! External callers create sessions and ingest seed assets; the engine
//! routes each asset event through a per-asset-type pipeline of registered
//! handlers, and every asset a handler discovers feeds back into the engine
//! until the transitive closure is exhausted or the session terminates.
//!
//! ## Architecture
//!
//! - **Application** (`application`): the [`DiscoveryEngine`] facade,
//!   sessions, and the session manager
//! - **Infrastructure** (`infrastructure`): the runtime (registry,
//!   pipelines, dispatcher, rate limiter, graph write queue), the session
//!   cache, the log bus, speculative expansion filters, metrics, and
//!   configuration
//!
//! The domain model and handler contract live in `discovery-engine-domain`;
//! lifecycle primitives (cancellation tokens, signal handling) live in
//! `discovery-engine-bootstrap`.
//!
//! ## Collaborators
//!
//! The persistence layer (asset graph), the external API surface, and
//! individual data-source plugins are deliberately out of scope: the engine
//! consumes them through the `GraphRepository` and `AssetHandler` ports.
//!
//! [`DiscoveryEngine`]: application::services::engine::DiscoveryEngine

pub mod application;
pub mod infrastructure;

pub use application::services::engine::DiscoveryEngine;
pub use application::services::session::Session;
pub use application::services::session_manager::SessionManager;
pub use infrastructure::config::EngineSettings;
