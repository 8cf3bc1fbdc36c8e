// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Asset Pipeline
//!
//! This module provides the per-asset-type staged executor at the core of
//! the discovery engine. One pipeline exists per registered asset type;
//! every event for that type flows through the same ordered stages.
//!
//! ## Overview
//!
//! A pipeline is a chain of tokio tasks connected by bounded channels:
//!
//! ```text
//! enqueue -> [unbounded head] -> feeder -> stage(p=1) -> ... -> stage(p=9) -> sink
//!                                       bounded(50)  bounded(50)       bounded(50)
//! ```
//!
//! - The head queue is unbounded, so `enqueue` never blocks the dispatcher.
//! - Inter-stage buffers are bounded (default 50); a full buffer blocks the
//!   producing stage, providing backpressure all the way to the head queue.
//! - A stage holds the handlers of one priority bucket. Singleton buckets
//!   execute as a gated FIFO: invocations are started in arrival order and
//!   bounded by the handler's instance semaphore. Multi-handler buckets fan
//!   out: every handler observes the same event in parallel, and the event
//!   advances only after all of them complete.
//! - The sink tallies accumulated errors, publishes them on the session log
//!   bus, and settles the event's accounting exactly once.
//!
//! ## Failure Semantics
//!
//! Handler invocations run in spawned tasks, so a panic is recovered by the
//! stage, logged, and converted into an error on the event; the pipeline
//! keeps running. Timeouts likewise mark the event errored and advance.
//! Handler errors never short-circuit peers in a fan-out stage and never
//! cancel the pipeline.
//!
//! ## Ordering Guarantees
//!
//! Within one pipeline, handler invocations begin in enqueue order for
//! every stage; completion order is unconstrained once a stage runs more
//! than one invocation concurrently (an instance cap above one, or a
//! fan-out bucket). Across pipelines there is no ordering.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use discovery_engine_domain::entities::asset::AssetType;
use discovery_engine_domain::events::discovery_event::DiscoveryEvent;
use discovery_engine_domain::services::asset_handler::{AssetHandler, HandlerContext};
use discovery_engine_domain::value_objects::{HandlerId, Priority};
use discovery_engine_domain::EngineError;

use crate::infrastructure::runtime::envelope::{EventAccounting, EventEnvelope};

/// Default bounded buffer depth between pipeline stages
pub const DEFAULT_STAGE_BUFFER: usize = 50;

/// One handler installed in a stage, with its concurrency gate.
#[derive(Clone)]
pub struct HandlerSlot {
    handler: Arc<dyn AssetHandler>,
    semaphore: Arc<Semaphore>,
    timeout: Duration,
}

impl HandlerSlot {
    /// Creates a slot for a handler with an effective instance cap.
    ///
    /// The cap must already be resolved: handlers declaring `0` (unbounded)
    /// receive the engine-wide default cap from the registry.
    pub fn new(handler: Arc<dyn AssetHandler>, effective_instances: usize) -> Self {
        let timeout = handler.timeout();
        Self {
            handler,
            semaphore: Arc::new(Semaphore::new(effective_instances.max(1))),
            timeout,
        }
    }

    /// Returns the handler identity
    pub fn handler_id(&self) -> HandlerId {
        self.handler.id()
    }
}

/// The handlers of one priority bucket, executed as one stage.
#[derive(Clone)]
pub struct StageSpec {
    priority: Priority,
    slots: Vec<HandlerSlot>,
}

impl StageSpec {
    /// Creates a stage from a priority bucket; `slots` must be non-empty
    pub fn new(priority: Priority, slots: Vec<HandlerSlot>) -> Self {
        debug_assert!(!slots.is_empty(), "stage requires at least one handler");
        Self { priority, slots }
    }

    /// Returns the stage priority
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the handler identities installed in this stage
    pub fn handler_ids(&self) -> Vec<HandlerId> {
        self.slots.iter().map(|slot| slot.handler_id()).collect()
    }
}

/// Per-asset-type staged executor.
#[derive(Debug)]
pub struct AssetPipeline {
    asset_type: AssetType,
    input: Mutex<Option<mpsc::UnboundedSender<EventEnvelope>>>,
    closed: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    /// Stage layout kept for introspection and registry invariant checks
    layout: Vec<(Priority, Vec<HandlerId>)>,
}

impl AssetPipeline {
    /// Builds and starts a pipeline from ordered stages.
    ///
    /// `stages` must be sorted by ascending priority; the registry
    /// guarantees this by iterating its priority buckets in order.
    pub fn new(asset_type: AssetType, stages: Vec<StageSpec>, stage_buffer: usize) -> Self {
        let layout = stages
            .iter()
            .map(|stage| (stage.priority(), stage.handler_ids()))
            .collect();

        let (input_tx, input_rx) = mpsc::unbounded_channel::<EventEnvelope>();
        let mut workers = Vec::with_capacity(stages.len() + 2);

        // Feeder: unbounded head -> first bounded buffer. Keeps enqueue
        // non-blocking while the bounded chain provides backpressure.
        let (first_tx, mut chain_rx) = mpsc::channel::<EventEnvelope>(stage_buffer.max(1));
        workers.push(tokio::spawn(feeder_worker(input_rx, first_tx)));

        for stage in stages {
            let (next_tx, next_rx) = mpsc::channel::<EventEnvelope>(stage_buffer.max(1));
            workers.push(tokio::spawn(stage_worker(stage, chain_rx, next_tx)));
            chain_rx = next_rx;
        }

        workers.push(tokio::spawn(sink_worker(asset_type, chain_rx)));

        Self {
            asset_type,
            input: Mutex::new(Some(input_tx)),
            closed: Arc::new(AtomicBool::new(false)),
            workers: Mutex::new(workers),
            layout,
        }
    }

    /// Returns the asset type this pipeline serves
    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    /// Returns the stage layout: `(priority, handler ids)` in execution order
    pub fn layout(&self) -> &[(Priority, Vec<HandlerId>)] {
        &self.layout
    }

    /// Returns the stage priority at which a handler is installed, if any
    pub fn stage_of(&self, handler_id: &HandlerId) -> Option<Priority> {
        self.layout
            .iter()
            .find(|(_, ids)| ids.contains(handler_id))
            .map(|(priority, _)| *priority)
    }

    /// Returns true once `shutdown` has been initiated
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Appends an envelope to the head queue; never blocks.
    ///
    /// # Errors
    /// Returns `EngineError::PipelineClosed` after shutdown. The envelope's
    /// accounting is settled (as cancelled) before the error returns, so
    /// the dispatcher's counters stay balanced.
    pub fn enqueue(&self, envelope: EventEnvelope) -> Result<(), EngineError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(self.settle_rejected(envelope));
        }
        let sender = {
            let guard = self.input.lock();
            guard.clone()
        };
        match sender {
            Some(sender) => match sender.send(envelope) {
                Ok(()) => Ok(()),
                Err(mpsc::error::SendError(envelope)) => Err(self.settle_rejected(envelope)),
            },
            None => Err(self.settle_rejected(envelope)),
        }
    }

    fn settle_rejected(&self, envelope: EventEnvelope) -> EngineError {
        envelope
            .accounting
            .complete(&envelope.event, &envelope.errors, true);
        EngineError::PipelineClosed(format!("Pipeline for {} is shut down", self.asset_type))
    }

    /// Stops accepting new events, drains in-flight stages, and waits for
    /// all stage workers to finish.
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        // Dropping the head sender lets the feeder drain and the chain
        // collapse stage by stage.
        self.input.lock().take();
        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if let Err(e) = worker.await {
                if e.is_panic() {
                    warn!(asset_type = %self.asset_type, "Pipeline worker panicked during shutdown");
                }
            }
        }
        debug!(asset_type = %self.asset_type, "Pipeline drained");
    }
}

/// Copies the unbounded head queue into the bounded stage chain.
async fn feeder_worker(
    mut input: mpsc::UnboundedReceiver<EventEnvelope>,
    chain: mpsc::Sender<EventEnvelope>,
) {
    while let Some(envelope) = input.recv().await {
        if chain.send(envelope).await.is_err() {
            // Chain torn down mid-shutdown; remaining envelopes were
            // settled by enqueue's closed check or are settled here.
            break;
        }
    }
}

/// Runs one priority stage: gated FIFO for a singleton bucket, fan-out for
/// a multi-handler bucket.
async fn stage_worker(
    stage: StageSpec,
    mut rx: mpsc::Receiver<EventEnvelope>,
    tx: mpsc::Sender<EventEnvelope>,
) {
    if stage.slots.len() == 1 {
        let slot = stage.slots[0].clone();
        while let Some(mut envelope) = rx.recv().await {
            if envelope.cancelled || envelope.ctx.is_done() {
                envelope.cancelled = true;
                if tx.send(envelope).await.is_err() {
                    return;
                }
                continue;
            }

            // Park the event until an instance slot frees up. Holding the
            // permit across the spawned invocation bounds concurrency to
            // the handler's cap while letting later events overtake slow
            // ones once the cap allows it.
            let permit = acquire_slot(&slot, &envelope.accounting).await;
            let slot = slot.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = invoke_detached(permit, slot, envelope.event.clone(), envelope.ctx.clone()).await;
                if let Some(error) = outcome {
                    envelope.record_error(error);
                }
                let _ = tx.send(envelope).await;
            });
        }
    } else {
        while let Some(mut envelope) = rx.recv().await {
            if envelope.cancelled || envelope.ctx.is_done() {
                envelope.cancelled = true;
                if tx.send(envelope).await.is_err() {
                    return;
                }
                continue;
            }

            // All peers observe the same event; the stage advances only
            // after every one of them has completed.
            let invocations = stage.slots.iter().map(|slot| {
                let slot = slot.clone();
                let accounting = envelope.accounting.clone();
                let event = envelope.event.clone();
                let ctx = envelope.ctx.clone();
                async move {
                    let permit = acquire_slot(&slot, &accounting).await;
                    invoke_detached(permit, slot, event, ctx).await
                }
            });
            let errors: Vec<EngineError> = futures::future::join_all(invocations)
                .await
                .into_iter()
                .flatten()
                .collect();
            for error in errors {
                envelope.record_error(error);
            }

            if tx.send(envelope).await.is_err() {
                return;
            }
        }
    }
}

/// Final stage: log, tally, and settle each event exactly once.
async fn sink_worker(asset_type: AssetType, mut rx: mpsc::Receiver<EventEnvelope>) {
    while let Some(envelope) = rx.recv().await {
        if envelope.errors.is_empty() {
            debug!(
                asset_type = %asset_type,
                event = %envelope.event.name(),
                cancelled = envelope.cancelled,
                "Event completed"
            );
        } else {
            warn!(
                asset_type = %asset_type,
                event = %envelope.event.name(),
                errors = envelope.errors.len(),
                "Event completed with handler errors"
            );
        }
        envelope
            .accounting
            .complete(&envelope.event, &envelope.errors, envelope.cancelled);
    }
}

/// Acquires an instance permit, accounting the park in session stats when
/// the slot is exhausted.
async fn acquire_slot(slot: &HandlerSlot, accounting: &EventAccounting) -> OwnedSemaphorePermit {
    match slot.semaphore.clone().try_acquire_owned() {
        Ok(permit) => permit,
        Err(_) => {
            accounting.stats.record_waiting();
            let permit = slot
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .expect("handler semaphore is never closed");
            accounting.stats.record_resumed();
            permit
        }
    }
}

/// Invocation core shared by FIFO and fan-out stages. The spawned task
/// isolates handler panics from the stage worker.
async fn invoke_detached(
    permit: OwnedSemaphorePermit,
    slot: HandlerSlot,
    event: DiscoveryEvent,
    ctx: HandlerContext,
) -> Option<EngineError> {
    let handler = slot.handler.clone();
    let handler_id = handler.id();
    let timeout = slot.timeout;

    let join = tokio::spawn(async move {
        let _permit = permit;
        tokio::time::timeout(timeout, handler.invoke(&event, &ctx)).await
    });

    match join.await {
        Ok(Ok(Ok(()))) => None,
        // Admission rejections are the normal "nothing for me here" path.
        Ok(Ok(Err(error))) if error.is_admission_rejection() => None,
        Ok(Ok(Err(error))) => Some(error),
        Ok(Err(_elapsed)) => Some(EngineError::timeout(format!(
            "Handler {} exceeded its {:?} action timeout",
            handler_id, timeout
        ))),
        Err(join_error) if join_error.is_panic() => {
            warn!(handler = %handler_id, "Handler panicked; recovered by pipeline");
            Some(EngineError::internal_error(format!(
                "Handler {} panicked",
                handler_id
            )))
        }
        Err(_) => Some(EngineError::internal_error(format!(
            "Handler {} task aborted",
            handler_id
        ))),
    }
}
