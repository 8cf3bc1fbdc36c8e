// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Discovery Event
//!
//! The immutable envelope that delivers one asset to one pipeline. Events
//! are created by the dispatcher (initial ingestion) or by handlers (newly
//! discovered assets) and destroyed after the pipeline sink consumes them.
//!
//! Events reference their session by id rather than by pointer; the live
//! session services reach handlers separately through the handler context,
//! which keeps the envelope cheap to clone and free of ownership cycles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::asset::{Asset, AssetType};
use crate::value_objects::{EventId, SessionId};

/// Immutable event envelope carrying one asset through the engine.
///
/// Handlers receive events by reference and may only emit new events through
/// the dispatch port, never by mutating one they received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryEvent {
    event_id: EventId,
    session_id: SessionId,
    name: String,
    asset: Asset,
    created_at: DateTime<Utc>,
}

impl DiscoveryEvent {
    /// Creates an event for an asset, named after the asset itself
    pub fn new(session_id: SessionId, asset: Asset) -> Self {
        let name = asset.to_string();
        Self::named(session_id, name, asset)
    }

    /// Creates an event with an explicit display name
    pub fn named(session_id: SessionId, name: impl Into<String>, asset: Asset) -> Self {
        Self {
            event_id: EventId::new(),
            session_id,
            name: name.into(),
            asset,
            created_at: Utc::now(),
        }
    }

    /// Returns the unique event identifier
    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    /// Returns the owning session identifier
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Returns the display name used in logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the asset payload
    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    /// Returns the asset type the dispatcher routes on
    pub fn asset_type(&self) -> AssetType {
        self.asset.asset_type()
    }

    /// Returns the creation timestamp
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
