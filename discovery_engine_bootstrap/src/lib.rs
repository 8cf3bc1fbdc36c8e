// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Bootstrap Module
//!
//! The bootstrap module sits **outside** the engine's application layers
//! (domain, application, infrastructure) and provides:
//!
//! - **Cancellation tokens** - One-shot tokens backing engine shutdown and
//!   session done-signals
//! - **Shutdown coordination** - Grace-bounded drain driven by the engine
//!   facade's `shutdown()`
//! - **Signal handling** - SIGTERM/SIGINT wired to the coordinator by
//!   embedding binaries
//! - **Logging initialization** - Process-wide tracing subscriber setup
//!
//! ## Architecture Position
//!
//! Bootstrap depends on nothing inside the engine; the engine crate depends
//! on bootstrap for its lifecycle primitives. This keeps cancellation a
//! plain, runtime-level concern that the domain layer can model as a port
//! without importing tokio.

pub mod logger;
pub mod shutdown;
pub mod signals;

pub use logger::init_tracing;
pub use shutdown::{CancellationToken, ShutdownCoordinator, DEFAULT_GRACE_PERIOD_SECS};
pub use signals::spawn_signal_listener;
