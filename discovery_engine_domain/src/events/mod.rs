// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Events
//!
//! The discovery event envelope and the structured records published on the
//! per-session log bus.

pub mod discovery_event;
pub mod log_record;

pub use discovery_event::DiscoveryEvent;
pub use log_record::{LogPayload, LogRecord, LogSeverity};
