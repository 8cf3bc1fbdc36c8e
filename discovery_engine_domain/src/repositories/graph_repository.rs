// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Graph Repository Port
//!
//! The persistence collaborator interface. The engine core never owns
//! on-disk format or transaction semantics; it hands discovered assets and
//! relations to this port and lets the collaborator decide how to store
//! them. Writes are funneled through the engine's single-worker write queue,
//! so implementations see one call at a time per engine instance and need
//! not defend against transactional storms.

use async_trait::async_trait;

use crate::entities::asset::AssetRecord;
use crate::entities::relation::RelationRecord;
use crate::value_objects::SessionId;
use crate::EngineError;

/// Asset graph store collaborator.
///
/// Losing the handle mid-session is one of the two fatal session errors;
/// the session manager cancels the session when an implementation reports
/// it via `DatabaseError` on every subsequent call.
#[async_trait]
pub trait GraphRepository: Send + Sync {
    /// Short identifier of the backing system (e.g. `memory`, `postgres`)
    fn system(&self) -> &str;

    /// Inserts or refreshes an asset node.
    ///
    /// # Errors
    /// Returns `EngineError::DatabaseError` when the store rejects the write.
    async fn upsert_asset(&self, session_id: SessionId, record: &AssetRecord) -> Result<(), EngineError>;

    /// Inserts or refreshes a relation edge.
    ///
    /// # Errors
    /// Returns `EngineError::DatabaseError` when the store rejects the write.
    async fn upsert_relation(&self, session_id: SessionId, record: &RelationRecord) -> Result<(), EngineError>;

    /// Flushes buffered writes, if the implementation buffers.
    ///
    /// # Errors
    /// Returns `EngineError::DatabaseError` when the flush fails.
    async fn flush(&self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Releases the connection.
    ///
    /// # Errors
    /// Returns `EngineError::DatabaseError` when teardown fails.
    async fn close(&self) -> Result<(), EngineError> {
        Ok(())
    }
}
