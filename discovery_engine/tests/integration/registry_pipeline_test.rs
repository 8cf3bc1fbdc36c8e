// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Registry and Pipeline Construction Tests
//!
//! Validates the registry contract: duplicate rejection, freeze-on-build,
//! priority bucket layout, and the registry-to-pipeline round trip.

use std::sync::Arc;
use std::time::Duration;

use discovery_engine::infrastructure::bus::SessionLogBus;
use discovery_engine::infrastructure::cache::SessionCache;
use discovery_engine::infrastructure::metrics::MetricsService;
use discovery_engine::infrastructure::repositories::InMemoryGraphRepository;
use discovery_engine::infrastructure::runtime::db_queue::{GraphWriteQueue, QueuedGraphRepository};
use discovery_engine::infrastructure::runtime::dispatcher::TokenDoneSignal;
use discovery_engine::infrastructure::runtime::envelope::{EventAccounting, EventEnvelope};
use discovery_engine::infrastructure::runtime::registry::HandlerRegistry;
use discovery_engine::infrastructure::runtime::tracker::InFlightTracker;
use discovery_engine_bootstrap::shutdown::CancellationToken;
use discovery_engine_domain::entities::asset::AssetType;
use discovery_engine_domain::entities::session_config::SessionConfig;
use discovery_engine_domain::entities::session_stats::SessionStats;
use discovery_engine_domain::events::discovery_event::DiscoveryEvent;
use discovery_engine_domain::services::asset_handler::{EventDispatch, HandlerContext};
use discovery_engine_domain::value_objects::{HandlerId, Priority, SessionId};
use discovery_engine_domain::EngineError;

use crate::common::{fqdn, InvocationLog, StubHandler};

fn handler(plugin: &str, name: &str, priority: u8, log: &InvocationLog) -> Arc<StubHandler> {
    Arc::new(StubHandler::new(plugin, name, AssetType::Fqdn, log.clone()).with_priority(priority))
}

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let log = InvocationLog::new();
    let registry = HandlerRegistry::new();

    registry.register(handler("dns", "cname", 1, &log)).unwrap();
    let err = registry.register(handler("dns", "cname", 2, &log)).unwrap_err();
    assert!(matches!(err, EngineError::AlreadyRegistered(_)));

    // Same name under a different plugin is a different handler.
    registry.register(handler("whois", "cname", 2, &log)).unwrap();
    assert_eq!(registry.handler_count(), 2);
}

#[tokio::test]
async fn test_registration_rejected_after_freeze() {
    let log = InvocationLog::new();
    let registry = HandlerRegistry::new();
    registry.register(handler("dns", "cname", 1, &log)).unwrap();

    registry.build_pipelines(50, 500).unwrap();
    assert!(registry.is_frozen());

    let err = registry.register(handler("dns", "apex", 9, &log)).unwrap_err();
    assert!(matches!(err, EngineError::RegistryFrozen(_)));

    let err = registry.build_pipelines(50, 500).unwrap_err();
    assert!(matches!(err, EngineError::RegistryFrozen(_)));
}

#[tokio::test]
async fn test_pipeline_contains_handler_at_clamped_priority() {
    let log = InvocationLog::new();
    let registry = HandlerRegistry::new();

    // Priority 0 normalizes to the default (5); 99 clamps to 9.
    registry.register(handler("dns", "unspecified", 0, &log)).unwrap();
    registry.register(handler("dns", "overeager", 99, &log)).unwrap();
    registry.register(handler("dns", "early", 1, &log)).unwrap();
    registry.build_pipelines(50, 500).unwrap();

    let pipeline = registry.pipeline_for(AssetType::Fqdn).unwrap();
    let id = |name: &str| HandlerId::new("dns", name).unwrap();

    assert_eq!(pipeline.stage_of(&id("unspecified")), Some(Priority::DEFAULT));
    assert_eq!(pipeline.stage_of(&id("overeager")), Some(Priority::MAX));
    assert_eq!(pipeline.stage_of(&id("early")), Some(Priority::MIN));

    // Stages come out in ascending priority order.
    let priorities: Vec<u8> = pipeline.layout().iter().map(|(p, _)| p.value()).collect();
    assert_eq!(priorities, vec![1, 5, 9]);
}

#[tokio::test]
async fn test_bucket_preserves_insertion_order() {
    let log = InvocationLog::new();
    let registry = HandlerRegistry::new();
    registry.register(handler("a", "first", 5, &log)).unwrap();
    registry.register(handler("b", "second", 5, &log)).unwrap();
    registry.register(handler("c", "third", 5, &log)).unwrap();
    registry.build_pipelines(50, 500).unwrap();

    let pipeline = registry.pipeline_for(AssetType::Fqdn).unwrap();
    let (_, ids) = &pipeline.layout()[0];
    let names: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    assert_eq!(names, vec!["a/first", "b/second", "c/third"]);
}

#[tokio::test]
async fn test_pipeline_for_unregistered_type_fails() {
    let log = InvocationLog::new();
    let registry = HandlerRegistry::new();
    registry.register(handler("dns", "cname", 1, &log)).unwrap();
    registry.build_pipelines(50, 500).unwrap();

    let err = registry.pipeline_for(AssetType::Netblock).unwrap_err();
    assert!(matches!(err, EngineError::NoPipeline(_)));
}

/// A dispatch port that drops everything, for envelope construction
struct NullDispatch;

impl EventDispatch for NullDispatch {
    fn dispatch_event(&self, _event: DiscoveryEvent) -> Result<(), EngineError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_enqueue_after_shutdown_returns_pipeline_closed() {
    let log = InvocationLog::new();
    let registry = HandlerRegistry::new();
    registry.register(handler("dns", "cname", 1, &log)).unwrap();
    registry.build_pipelines(50, 500).unwrap();

    let pipeline = registry.pipeline_for(AssetType::Fqdn).unwrap();
    pipeline.shutdown().await;
    assert!(pipeline.is_closed());

    // Assemble a minimal envelope by hand.
    let session_id = SessionId::new();
    let config = Arc::new(SessionConfig::default());
    let cache = Arc::new(SessionCache::new());
    let bus = Arc::new(SessionLogBus::new());
    let queue = Arc::new(GraphWriteQueue::new(Arc::new(InMemoryGraphRepository::new())));
    let stats = Arc::new(SessionStats::new());
    let tracker = Arc::new(InFlightTracker::new());
    let metrics = MetricsService::new().unwrap();

    let ctx = HandlerContext::new(
        config,
        cache,
        Arc::new(QueuedGraphRepository::new(queue)),
        bus.clone(),
        Arc::new(TokenDoneSignal(CancellationToken::new())),
        Arc::new(NullDispatch),
    );

    // Mirror the dispatcher's accounting so the settlement path balances.
    stats.record_received();
    tracker.increment();
    metrics.record_dispatched();

    let envelope = EventEnvelope::new(
        DiscoveryEvent::new(session_id, fqdn("example.com")),
        ctx,
        EventAccounting {
            stats: stats.clone(),
            tracker: tracker.clone(),
            metrics,
            log: bus,
        },
    );

    let err = pipeline.enqueue(envelope).unwrap_err();
    assert!(matches!(err, EngineError::PipelineClosed(_)));

    // The rejected envelope settled its accounting: nothing left in flight.
    assert_eq!(tracker.in_flight(), 0);
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.cancelled, 1);
    assert_eq!(snapshot.in_process, 0);
}

#[tokio::test]
async fn test_shutdown_drains_in_flight_events() {
    let log = InvocationLog::new();
    let registry = HandlerRegistry::new();
    registry
        .register(Arc::new(
            StubHandler::new("dns", "slow", AssetType::Fqdn, log.clone())
                .with_priority(5)
                .with_delay(Duration::from_millis(30)),
        ))
        .unwrap();
    registry.build_pipelines(50, 500).unwrap();

    // Shutdown with nothing in flight completes promptly.
    tokio::time::timeout(Duration::from_secs(1), registry.shutdown())
        .await
        .expect("shutdown should drain promptly");
}
