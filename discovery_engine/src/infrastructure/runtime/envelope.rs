// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Event Envelope
//!
//! Internal wrapper carrying one discovery event through a pipeline. The
//! envelope bundles the immutable event with the session services handlers
//! need (the handler context), the per-session accounting handles the sink
//! settles, and the error accumulator stages append to. Envelopes exist
//! only between dispatch and sink; they never leave the runtime.

use std::sync::Arc;

use discovery_engine_domain::entities::session_stats::SessionStats;
use discovery_engine_domain::events::discovery_event::DiscoveryEvent;
use discovery_engine_domain::events::log_record::{LogRecord, LogSeverity};
use discovery_engine_domain::services::asset_handler::HandlerContext;
use discovery_engine_domain::services::log_service::LogPublisher;
use discovery_engine_domain::EngineError;

use crate::infrastructure::metrics::MetricsService;
use crate::infrastructure::runtime::tracker::InFlightTracker;

/// Per-session accounting handles settled by the pipeline sink.
///
/// Cloned into every envelope at dispatch time; `complete` must be called
/// exactly once per envelope, which the sink guarantees structurally (it is
/// the only consumer of the final stage channel).
#[derive(Clone)]
pub struct EventAccounting {
    /// Session counters
    pub stats: Arc<SessionStats>,
    /// Session in-flight tracker feeding quiescence detection
    pub tracker: Arc<InFlightTracker>,
    /// Engine-wide metrics
    pub metrics: MetricsService,
    /// Session log bus for error records
    pub log: Arc<dyn LogPublisher>,
}

impl EventAccounting {
    /// Settles a completed envelope: updates session counters, the
    /// in-flight tracker, and engine metrics, and publishes error records.
    pub fn complete(&self, event: &DiscoveryEvent, errors: &[EngineError], cancelled: bool) {
        let errored = !errors.is_empty();

        for error in errors {
            self.metrics.record_handler_error(error.category());
            self.log.publish(
                LogRecord::message(
                    event.session_id(),
                    LogSeverity::Error,
                    "pipeline",
                    error.to_string(),
                )
                .with_field("event", event.name().to_string())
                .with_field("category", error.category().to_string()),
            );
        }

        if errored {
            self.stats.record_errored();
        }
        if cancelled {
            self.stats.record_cancelled();
        } else {
            self.stats.record_done();
        }
        self.metrics.record_completed(errored);
        self.tracker.decrement();
    }
}

/// One event travelling through pipeline stages.
pub struct EventEnvelope {
    /// The immutable event
    pub event: DiscoveryEvent,
    /// Session services exposed to handlers
    pub ctx: HandlerContext,
    /// Accounting handles settled at the sink
    pub accounting: EventAccounting,
    /// Handler errors accumulated across stages
    pub errors: Vec<EngineError>,
    /// Set when the session was cancelled while the event was in flight;
    /// remaining stages skip execution and the sink counts the event as
    /// cancelled rather than done.
    pub cancelled: bool,
}

impl EventEnvelope {
    /// Wraps an event for pipeline transit
    pub fn new(event: DiscoveryEvent, ctx: HandlerContext, accounting: EventAccounting) -> Self {
        Self {
            event,
            ctx,
            accounting,
            errors: Vec::new(),
            cancelled: false,
        }
    }

    /// Appends a handler error to the accumulator
    pub fn record_error(&mut self, error: EngineError) {
        self.errors.push(error);
    }
}
