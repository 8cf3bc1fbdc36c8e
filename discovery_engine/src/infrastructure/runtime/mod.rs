// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Engine Runtime
//!
//! The concurrent core: handler registry, per-asset-type pipelines, the
//! event dispatcher with in-flight accounting, the data-source rate
//! limiter, and the serialized graph write queue.

pub mod db_queue;
pub mod dispatcher;
pub mod envelope;
pub mod pipeline;
pub mod rate_limiter;
pub mod registry;
pub mod tracker;

pub use db_queue::{GraphWriteQueue, QueuedGraphRepository};
pub use dispatcher::{EventDispatcher, SessionEntry, TokenDoneSignal};
pub use envelope::{EventAccounting, EventEnvelope};
pub use pipeline::{AssetPipeline, HandlerSlot, StageSpec, DEFAULT_STAGE_BUFFER};
pub use rate_limiter::{LeakyBucket, RateLimiterRegistry};
pub use registry::HandlerRegistry;
pub use tracker::InFlightTracker;
