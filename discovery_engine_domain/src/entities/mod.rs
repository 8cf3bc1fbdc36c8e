// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Entities
//!
//! Entities with identity and lifecycle: assets and their cache records,
//! relations between assets, per-session statistics, and the immutable
//! session configuration.

pub mod asset;
pub mod relation;
pub mod session_config;
pub mod session_stats;

pub use asset::{
    Asset, AssetKey, AssetRecord, AssetType, AutonomousSystem, EmailAddress, Fqdn, IpAddress, Netblock,
    RirOrganization, TlsCertificate, WhoisRecord,
};
pub use relation::{Relation, RelationQuery, RelationRecord};
pub use session_config::{DataSourceConfig, GraphDbDescriptor, SessionConfig, DEFAULT_MAX_HANDLER_INSTANCES};
pub use session_stats::{SessionStats, StatsSnapshot};
