// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Engine Metrics Service
//!
//! Prometheus metrics for engine observability. Per-session progress lives
//! in `SessionStats`; this service tracks engine-wide totals across all
//! sessions: dispatch outcomes, completion outcomes, and live gauges for
//! sessions and in-flight events.
//!
//! # Design Principles
//!
//! - **Separation of Concerns**: Metrics are handled by dedicated
//!   observability infrastructure; pipelines and handlers never talk to
//!   prometheus directly
//! - **Performance**: Counter increments on the dispatch path are lock-free
//! - **Reliability**: Metric registration failures surface once, at engine
//!   construction, not during processing

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

use discovery_engine_domain::EngineError;

/// Prometheus-backed engine metrics.
#[derive(Clone)]
pub struct MetricsService {
    registry: Arc<Registry>,

    // Dispatch outcomes
    events_dispatched_total: IntCounter,
    events_dropped_total: IntCounterVec,

    // Completion outcomes
    events_completed_total: IntCounter,
    events_errored_total: IntCounter,
    handler_errors_total: IntCounterVec,

    // Live state
    active_sessions: IntGauge,
    in_flight_events: IntGauge,
}

impl MetricsService {
    /// Create a new MetricsService with its own Prometheus registry.
    ///
    /// # Errors
    /// Returns `EngineError::MetricsError` when a metric cannot be created
    /// or registered.
    pub fn new() -> Result<Self, EngineError> {
        let registry = Registry::new();

        let events_dispatched_total = IntCounter::with_opts(
            Opts::new("events_dispatched_total", "Total events accepted by the dispatcher")
                .namespace("discovery_engine"),
        )
        .map_err(|e| EngineError::metrics_error(format!("Failed to create events_dispatched_total metric: {}", e)))?;

        let events_dropped_total = IntCounterVec::new(
            Opts::new("events_dropped_total", "Events dropped before processing, by reason")
                .namespace("discovery_engine"),
            &["reason"],
        )
        .map_err(|e| EngineError::metrics_error(format!("Failed to create events_dropped_total metric: {}", e)))?;

        let events_completed_total = IntCounter::with_opts(
            Opts::new("events_completed_total", "Events fully processed by a pipeline sink")
                .namespace("discovery_engine"),
        )
        .map_err(|e| EngineError::metrics_error(format!("Failed to create events_completed_total metric: {}", e)))?;

        let events_errored_total = IntCounter::with_opts(
            Opts::new("events_errored_total", "Events completed with at least one handler error")
                .namespace("discovery_engine"),
        )
        .map_err(|e| EngineError::metrics_error(format!("Failed to create events_errored_total metric: {}", e)))?;

        let handler_errors_total = IntCounterVec::new(
            Opts::new("handler_errors_total", "Handler errors by error category").namespace("discovery_engine"),
            &["category"],
        )
        .map_err(|e| EngineError::metrics_error(format!("Failed to create handler_errors_total metric: {}", e)))?;

        let active_sessions = IntGauge::with_opts(
            Opts::new("active_sessions", "Number of live discovery sessions").namespace("discovery_engine"),
        )
        .map_err(|e| EngineError::metrics_error(format!("Failed to create active_sessions metric: {}", e)))?;

        let in_flight_events = IntGauge::with_opts(
            Opts::new("in_flight_events", "Events currently inside pipelines").namespace("discovery_engine"),
        )
        .map_err(|e| EngineError::metrics_error(format!("Failed to create in_flight_events metric: {}", e)))?;

        registry
            .register(Box::new(events_dispatched_total.clone()))
            .map_err(|e| EngineError::metrics_error(format!("Failed to register metric: {}", e)))?;
        registry
            .register(Box::new(events_dropped_total.clone()))
            .map_err(|e| EngineError::metrics_error(format!("Failed to register metric: {}", e)))?;
        registry
            .register(Box::new(events_completed_total.clone()))
            .map_err(|e| EngineError::metrics_error(format!("Failed to register metric: {}", e)))?;
        registry
            .register(Box::new(events_errored_total.clone()))
            .map_err(|e| EngineError::metrics_error(format!("Failed to register metric: {}", e)))?;
        registry
            .register(Box::new(handler_errors_total.clone()))
            .map_err(|e| EngineError::metrics_error(format!("Failed to register metric: {}", e)))?;
        registry
            .register(Box::new(active_sessions.clone()))
            .map_err(|e| EngineError::metrics_error(format!("Failed to register metric: {}", e)))?;
        registry
            .register(Box::new(in_flight_events.clone()))
            .map_err(|e| EngineError::metrics_error(format!("Failed to register metric: {}", e)))?;

        Ok(Self {
            registry: Arc::new(registry),
            events_dispatched_total,
            events_dropped_total,
            events_completed_total,
            events_errored_total,
            handler_errors_total,
            active_sessions,
            in_flight_events,
        })
    }

    /// Records an event accepted by the dispatcher
    pub fn record_dispatched(&self) {
        self.events_dispatched_total.inc();
        self.in_flight_events.inc();
    }

    /// Records an event dropped before processing
    pub fn record_dropped(&self, reason: &str) {
        self.events_dropped_total.with_label_values(&[reason]).inc();
    }

    /// Records an event leaving its pipeline
    pub fn record_completed(&self, errored: bool) {
        self.events_completed_total.inc();
        self.in_flight_events.dec();
        if errored {
            self.events_errored_total.inc();
        }
    }

    /// Records one handler error by category
    pub fn record_handler_error(&self, category: &str) {
        self.handler_errors_total.with_label_values(&[category]).inc();
    }

    /// Records a session entering the live set
    pub fn record_session_opened(&self) {
        self.active_sessions.inc();
    }

    /// Records a session leaving the live set
    pub fn record_session_closed(&self) {
        self.active_sessions.dec();
    }

    /// Returns the number of live sessions according to the gauge
    pub fn active_sessions(&self) -> i64 {
        self.active_sessions.get()
    }

    /// Encodes all metrics in the Prometheus text exposition format.
    ///
    /// # Errors
    /// Returns `EngineError::MetricsError` when encoding fails.
    pub fn gather_metrics(&self) -> Result<String, EngineError> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| EngineError::metrics_error(format!("Failed to encode metrics: {}", e)))?;
        String::from_utf8(buffer).map_err(|e| EngineError::metrics_error(format!("Metrics are not UTF-8: {}", e)))
    }
}
