// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Graph Write Queue
//!
//! Serializes writes to the graph store collaborator. Handlers across all
//! sessions and pipelines emit graph mutations concurrently; funneling them
//! through one worker task protects the collaborator from transactional
//! storms and gives it a single-writer view. The queue is a process-wide
//! singleton created at engine init.
//!
//! Handlers do not talk to the queue directly: the session's handler
//! context exposes a [`QueuedGraphRepository`], a `GraphRepository`
//! implementation whose writes enqueue here and whose `flush` waits for
//! the worker to drain.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use async_trait::async_trait;

use discovery_engine_domain::entities::asset::AssetRecord;
use discovery_engine_domain::entities::relation::RelationRecord;
use discovery_engine_domain::repositories::graph_repository::GraphRepository;
use discovery_engine_domain::value_objects::SessionId;
use discovery_engine_domain::EngineError;

enum GraphWrite {
    Asset {
        session_id: SessionId,
        record: AssetRecord,
    },
    Relation {
        session_id: SessionId,
        record: RelationRecord,
    },
    Flush {
        ack: oneshot::Sender<()>,
    },
}

/// Single-worker write queue in front of the graph store.
pub struct GraphWriteQueue {
    sender: Mutex<Option<mpsc::UnboundedSender<GraphWrite>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    repository: Arc<dyn GraphRepository>,
}

impl GraphWriteQueue {
    /// Creates the queue and starts its worker task
    pub fn new(repository: Arc<dyn GraphRepository>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker_repo = repository.clone();
        let worker = tokio::spawn(write_worker(receiver, worker_repo));
        Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            repository,
        }
    }

    /// Returns the backing repository
    pub fn repository(&self) -> &Arc<dyn GraphRepository> {
        &self.repository
    }

    fn send(&self, write: GraphWrite) -> Result<(), EngineError> {
        let guard = self.sender.lock();
        let sender = guard
            .as_ref()
            .ok_or_else(|| EngineError::database_error("Graph write queue is closed"))?;
        sender
            .send(write)
            .map_err(|_| EngineError::database_error("Graph write queue worker stopped"))
    }

    /// Enqueues an asset upsert.
    ///
    /// # Errors
    /// Returns `EngineError::DatabaseError` after the queue is closed.
    pub fn enqueue_asset(&self, session_id: SessionId, record: AssetRecord) -> Result<(), EngineError> {
        self.send(GraphWrite::Asset { session_id, record })
    }

    /// Enqueues a relation upsert.
    ///
    /// # Errors
    /// Returns `EngineError::DatabaseError` after the queue is closed.
    pub fn enqueue_relation(&self, session_id: SessionId, record: RelationRecord) -> Result<(), EngineError> {
        self.send(GraphWrite::Relation { session_id, record })
    }

    /// Waits until every write enqueued before this call has been applied.
    ///
    /// # Errors
    /// Returns `EngineError::DatabaseError` after the queue is closed.
    pub async fn flush(&self) -> Result<(), EngineError> {
        let (ack, done) = oneshot::channel();
        self.send(GraphWrite::Flush { ack })?;
        done.await
            .map_err(|_| EngineError::database_error("Graph write queue worker stopped during flush"))
    }

    /// Closes the queue, drains pending writes, and closes the repository.
    pub async fn shutdown(&self) {
        self.sender.lock().take();
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                if e.is_panic() {
                    warn!("Graph write worker panicked during shutdown");
                }
            }
        }
        if let Err(e) = self.repository.close().await {
            warn!("Graph repository close failed: {}", e);
        }
    }
}

async fn write_worker(mut receiver: mpsc::UnboundedReceiver<GraphWrite>, repository: Arc<dyn GraphRepository>) {
    while let Some(write) = receiver.recv().await {
        match write {
            GraphWrite::Asset { session_id, record } => {
                if let Err(e) = repository.upsert_asset(session_id, &record).await {
                    warn!(session = %session_id, "Graph asset write failed: {}", e);
                }
            }
            GraphWrite::Relation { session_id, record } => {
                if let Err(e) = repository.upsert_relation(session_id, &record).await {
                    warn!(session = %session_id, "Graph relation write failed: {}", e);
                }
            }
            GraphWrite::Flush { ack } => {
                if let Err(e) = repository.flush().await {
                    warn!("Graph flush failed: {}", e);
                }
                let _ = ack.send(());
            }
        }
    }
    debug!("Graph write queue drained");
}

/// Session-facing `GraphRepository` whose writes ride the shared queue.
pub struct QueuedGraphRepository {
    queue: Arc<GraphWriteQueue>,
}

impl QueuedGraphRepository {
    /// Creates the adapter over the shared queue
    pub fn new(queue: Arc<GraphWriteQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl GraphRepository for QueuedGraphRepository {
    fn system(&self) -> &str {
        self.queue.repository().system()
    }

    async fn upsert_asset(&self, session_id: SessionId, record: &AssetRecord) -> Result<(), EngineError> {
        self.queue.enqueue_asset(session_id, record.clone())
    }

    async fn upsert_relation(&self, session_id: SessionId, record: &RelationRecord) -> Result<(), EngineError> {
        self.queue.enqueue_relation(session_id, record.clone())
    }

    async fn flush(&self) -> Result<(), EngineError> {
        self.queue.flush().await
    }

    async fn close(&self) -> Result<(), EngineError> {
        // The queue owns the repository lifecycle; sessions closing their
        // handle must not tear down the shared store.
        Ok(())
    }
}
