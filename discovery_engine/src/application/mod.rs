// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Layer
//!
//! Orchestration over the domain and infrastructure: session lifecycle and
//! the engine facade consumed by the surrounding API layer.

pub mod services;

pub use services::{DiscoveryEngine, Session, SessionManager};
