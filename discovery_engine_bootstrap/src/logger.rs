// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logging Initialization
//!
//! Process-wide tracing subscriber setup. Engine components log through
//! `tracing` directly; embedding binaries call [`init_tracing`] once at
//! startup before constructing the engine.

use tracing_subscriber::EnvFilter;

/// Initialize the process-wide tracing subscriber.
///
/// Respects `RUST_LOG` when set; falls back to the provided default
/// directive otherwise. Idempotent: when a subscriber is already installed
/// (an embedding application brought its own), the call is a no-op.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
