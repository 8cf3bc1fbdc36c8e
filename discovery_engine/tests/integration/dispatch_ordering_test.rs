// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dispatch Ordering and Concurrency Tests
//!
//! Validates the pipeline execution contract: priority ordering across
//! stages, parallel fan-out within a stage, and the per-handler instance
//! cap.

use std::sync::Arc;
use std::time::Duration;

use discovery_engine::DiscoveryEngine;
use discovery_engine_domain::entities::asset::AssetType;

use crate::common::{config_for_domain, fqdn, test_settings, InvocationLog, StubHandler};

#[tokio::test]
async fn test_lower_priority_begins_before_higher() {
    let log = InvocationLog::new();
    let engine = DiscoveryEngine::new(test_settings()).unwrap();

    engine
        .register_handler(Arc::new(
            StubHandler::new("dns", "h1", AssetType::Fqdn, log.clone()).with_priority(1),
        ))
        .unwrap();
    engine
        .register_handler(Arc::new(
            StubHandler::new("dns", "h2", AssetType::Fqdn, log.clone()).with_priority(3),
        ))
        .unwrap();
    engine.start().unwrap();

    let session = engine.create_session(config_for_domain("example.com")).unwrap();
    engine.ingest_asset(session, fqdn("example.com")).unwrap();
    engine.wait_for_quiescence(session).await.unwrap();

    // H2 observed the event only after H1 had already been invoked.
    let h1_start = log.first_start("dns/h1").expect("h1 ran");
    let h2_start = log.first_start("dns/h2").expect("h2 ran");
    assert!(h1_start < h2_start, "priority 1 must begin before priority 3");

    engine.shutdown().await;
}

#[tokio::test]
async fn test_same_priority_handlers_fan_out_in_parallel() {
    let log = InvocationLog::new();
    let engine = DiscoveryEngine::new(test_settings()).unwrap();

    for name in ["a", "b", "c"] {
        engine
            .register_handler(Arc::new(
                StubHandler::new("fanout", name, AssetType::Fqdn, log.clone())
                    .with_priority(5)
                    .with_delay(Duration::from_millis(60)),
            ))
            .unwrap();
    }
    engine.start().unwrap();

    let session = engine.create_session(config_for_domain("example.com")).unwrap();
    engine.ingest_asset(session, fqdn("example.com")).unwrap();
    engine.wait_for_quiescence(session).await.unwrap();

    // All three peers started within a narrow window: each slept 60ms, so
    // sequential execution would spread the starts by at least that much.
    let starts: Vec<_> = ["fanout/a", "fanout/b", "fanout/c"]
        .iter()
        .map(|h| log.first_start(h).expect("peer ran"))
        .collect();
    let earliest = *starts.iter().min().unwrap();
    let latest = *starts.iter().max().unwrap();
    assert!(
        latest.duration_since(earliest) < Duration::from_millis(50),
        "fan-out peers must start together, spread was {:?}",
        latest.duration_since(earliest)
    );

    // The event advanced past the stage only after all three completed.
    let stats = engine.session_stats(session).unwrap();
    assert_eq!(stats.done, 1);
    assert_eq!(stats.in_process, 0);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_max_instances_caps_concurrency() {
    let log = InvocationLog::new();
    let handler = StubHandler::new("capped", "worker", AssetType::Fqdn, log.clone())
        .with_priority(5)
        .with_max_instances(2)
        .with_delay(Duration::from_millis(100));
    let gauge = handler.gauge();

    let engine = DiscoveryEngine::new(test_settings()).unwrap();
    engine.register_handler(Arc::new(handler)).unwrap();
    engine.start().unwrap();

    let session = engine.create_session(config_for_domain("example.com")).unwrap();
    for i in 0..10 {
        engine
            .ingest_asset(session, fqdn(&format!("host{}.example.com", i)))
            .unwrap();
    }
    engine.wait_for_quiescence(session).await.unwrap();

    assert_eq!(log.count_for("capped/worker"), 10);
    assert!(
        gauge.peak() <= 2,
        "at most 2 concurrent invocations allowed, saw {}",
        gauge.peak()
    );

    // 10 events through a 2-wide gate at 100ms each: the last invocation
    // cannot begin before 4 full batches have run.
    let entries = log.entries();
    let first = entries.iter().map(|i| i.started).min().unwrap();
    let last = entries.iter().map(|i| i.started).max().unwrap();
    assert!(
        last.duration_since(first) >= Duration::from_millis(380),
        "cap of 2 implies at least ~400ms between first and last start, saw {:?}",
        last.duration_since(first)
    );

    let stats = engine.session_stats(session).unwrap();
    assert_eq!(stats.done, 10);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_serialized_handler_preserves_fifo_order() {
    let log = InvocationLog::new();
    let engine = DiscoveryEngine::new(test_settings()).unwrap();
    engine
        .register_handler(Arc::new(
            StubHandler::new("fifo", "one", AssetType::Fqdn, log.clone())
                .with_priority(5)
                .with_max_instances(1)
                .with_delay(Duration::from_millis(10)),
        ))
        .unwrap();
    engine.start().unwrap();

    let session = engine.create_session(config_for_domain("example.com")).unwrap();
    for i in 0..5 {
        engine
            .ingest_asset(session, fqdn(&format!("h{}.example.com", i)))
            .unwrap();
    }
    engine.wait_for_quiescence(session).await.unwrap();

    let names: Vec<String> = log.entries().iter().map(|i| i.event.clone()).collect();
    let expected: Vec<String> = (0..5).map(|i| format!("fqdn:h{}.example.com", i)).collect();
    assert_eq!(names, expected, "serialized handler must observe enqueue order");

    engine.shutdown().await;
}

#[tokio::test]
async fn test_handler_error_does_not_abort_later_stages() {
    let log = InvocationLog::new();
    let engine = DiscoveryEngine::new(test_settings()).unwrap();
    engine
        .register_handler(Arc::new(
            StubHandler::new("flaky", "fails", AssetType::Fqdn, log.clone())
                .with_priority(2)
                .with_failure("upstream 500"),
        ))
        .unwrap();
    engine
        .register_handler(Arc::new(
            StubHandler::new("steady", "observes", AssetType::Fqdn, log.clone()).with_priority(7),
        ))
        .unwrap();
    engine.start().unwrap();

    let session = engine.create_session(config_for_domain("example.com")).unwrap();
    engine.ingest_asset(session, fqdn("example.com")).unwrap();
    engine.wait_for_quiescence(session).await.unwrap();

    // The later stage still ran, and the event completed exactly once,
    // tallied as errored.
    assert_eq!(log.count_for("steady/observes"), 1);
    let stats = engine.session_stats(session).unwrap();
    assert_eq!(stats.done, 1);
    assert_eq!(stats.errored, 1);
    assert_eq!(stats.in_process, 0);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_handler_panic_is_recovered() {
    let log = InvocationLog::new();
    let engine = DiscoveryEngine::new(test_settings()).unwrap();
    engine
        .register_handler(Arc::new(
            StubHandler::new("chaos", "panics", AssetType::Fqdn, log.clone()).with_priority(5),
        ))
        .unwrap();
    engine
        .register_handler(Arc::new(
            StubHandler::new("chaos", "boom", AssetType::Fqdn, log.clone())
                .with_priority(3)
                .with_panic(),
        ))
        .unwrap();
    engine.start().unwrap();

    let session = engine.create_session(config_for_domain("example.com")).unwrap();
    engine.ingest_asset(session, fqdn("one.example.com")).unwrap();
    engine.ingest_asset(session, fqdn("two.example.com")).unwrap();
    engine.wait_for_quiescence(session).await.unwrap();

    // Both events completed despite the panic at priority 3, and the
    // priority-5 handler still observed both.
    let stats = engine.session_stats(session).unwrap();
    assert_eq!(stats.done, 2);
    assert_eq!(stats.errored, 2);
    assert_eq!(log.count_for("chaos/panics"), 2);

    engine.shutdown().await;
}
