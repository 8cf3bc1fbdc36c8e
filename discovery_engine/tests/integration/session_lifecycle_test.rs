// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Session Lifecycle Tests
//!
//! Validates session creation, scope admission, cancellation propagation,
//! in-flight accounting, and the idle notification on the log bus.

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

use discovery_engine::DiscoveryEngine;
use discovery_engine_domain::entities::asset::AssetType;
use discovery_engine_domain::entities::session_config::SessionConfig;
use discovery_engine_domain::events::log_record::LogPayload;
use discovery_engine_domain::value_objects::{Scope, SessionId};
use discovery_engine_domain::EngineError;

use crate::common::{config_for_domain, fqdn, test_settings, InvocationLog, StubHandler};

#[tokio::test]
async fn test_unknown_session_rejected() {
    let engine = DiscoveryEngine::new(test_settings()).unwrap();
    engine.start().unwrap();

    let err = engine.ingest_asset(SessionId::new(), fqdn("example.com")).unwrap_err();
    assert!(matches!(err, EngineError::SessionNotFound(_)));

    let err = engine.session_stats(SessionId::new()).unwrap_err();
    assert!(matches!(err, EngineError::SessionNotFound(_)));

    assert!(engine.shutdown().await, "idle engine must drain within the grace period");
}

#[tokio::test]
async fn test_empty_scope_drops_every_asset() {
    let log = InvocationLog::new();
    let engine = DiscoveryEngine::new(test_settings()).unwrap();
    engine
        .register_handler(Arc::new(StubHandler::new("dns", "any", AssetType::Fqdn, log.clone())))
        .unwrap();
    engine.start().unwrap();

    let session = engine
        .create_session(SessionConfig::with_scope(Scope::new()))
        .unwrap();

    let err = engine.ingest_asset(session, fqdn("example.com")).unwrap_err();
    assert!(matches!(err, EngineError::NotInScope(_)));

    engine.wait_for_quiescence(session).await.unwrap();
    assert_eq!(log.count(), 0, "no handler may observe an out-of-scope asset");
    let stats = engine.session_stats(session).unwrap();
    assert_eq!(stats.received, 0);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_in_flight_counter_balances_exactly_once() {
    let log = InvocationLog::new();
    let engine = DiscoveryEngine::new(test_settings()).unwrap();
    engine
        .register_handler(Arc::new(
            StubHandler::new("dns", "nop", AssetType::Fqdn, log.clone()).with_priority(4),
        ))
        .unwrap();
    engine.start().unwrap();

    let (session_id, session) = engine.create_session_handle(config_for_domain("example.com")).unwrap();
    for i in 0..20 {
        engine
            .ingest_asset(session_id, fqdn(&format!("h{}.example.com", i)))
            .unwrap();
    }
    engine.wait_for_quiescence(session_id).await.unwrap();

    let stats = session.stats_snapshot();
    assert_eq!(stats.received, 20);
    assert_eq!(stats.done, 20);
    assert_eq!(stats.in_process, 0);
    assert_eq!(stats.work_items_total, 20);
    assert_eq!(stats.work_items_completed, 20);
    assert_eq!(session.in_flight(), 0);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_cancelled_session_rejects_dispatch_and_drains() {
    let log = InvocationLog::new();
    let engine = DiscoveryEngine::new(test_settings()).unwrap();
    engine
        .register_handler(Arc::new(
            StubHandler::new("dns", "slow", AssetType::Fqdn, log.clone())
                .with_max_instances(1)
                .with_delay(Duration::from_millis(10)),
        ))
        .unwrap();
    engine.start().unwrap();

    let (session_id, session) = engine.create_session_handle(config_for_domain("example.com")).unwrap();
    for i in 0..100 {
        engine
            .ingest_asset(session_id, fqdn(&format!("h{}.example.com", i)))
            .unwrap();
    }

    // Let some work complete before pulling the plug.
    loop {
        if session.stats_snapshot().done >= 10 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    engine.terminate_session(session_id).unwrap();

    // Dispatch is rejected promptly after cancellation.
    let err = engine.ingest_asset(session_id, fqdn("late.example.com")).unwrap_err();
    assert!(matches!(err, EngineError::SessionCancelled(_)));

    // The in-flight counter drains to zero within bounded time.
    tokio::time::timeout(Duration::from_secs(5), async {
        while session.in_flight() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("in-flight events must drain after cancellation");

    let stats = session.stats_snapshot();
    assert_eq!(stats.received, 100);
    assert!(stats.done >= 10, "work completed before cancel stays counted");
    assert_eq!(stats.done + stats.cancelled, 100);
    assert_eq!(stats.in_process, 0);

    // Cancellation is idempotent.
    engine.terminate_session(session_id).unwrap();
    assert!(session.is_done());

    // With everything drained, shutdown completes inside the grace period.
    assert!(engine.shutdown().await);
}

#[tokio::test]
async fn test_idle_notification_published_on_log_bus() {
    let log = InvocationLog::new();
    let engine = DiscoveryEngine::new(test_settings()).unwrap();
    engine
        .register_handler(Arc::new(StubHandler::new("dns", "nop", AssetType::Fqdn, log.clone())))
        .unwrap();
    engine.start().unwrap();

    let session = engine.create_session(config_for_domain("example.com")).unwrap();
    let mut stream = engine.subscribe_log(session).unwrap();
    engine.ingest_asset(session, fqdn("example.com")).unwrap();

    // The idle monitor publishes an Idle record (and a stats snapshot)
    // once the quiescence window elapses.
    let idle_seen = tokio::time::timeout(Duration::from_secs(3), async {
        while let Some(record) = stream.next().await {
            match record.payload {
                LogPayload::Idle => return true,
                LogPayload::Stats { snapshot } => {
                    assert_eq!(snapshot.in_process, 0);
                }
                _ => {}
            }
        }
        false
    })
    .await
    .expect("idle record expected within the timeout");
    assert!(idle_seen);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_cancellation_record_published_once() {
    let engine = DiscoveryEngine::new(test_settings()).unwrap();
    engine.start().unwrap();

    let session = engine.create_session(config_for_domain("example.com")).unwrap();
    let mut stream = engine.subscribe_log(session).unwrap();

    engine.terminate_session(session).unwrap();
    engine.terminate_session(session).unwrap();

    let record = tokio::time::timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("cancellation record expected")
        .expect("stream open");
    assert!(matches!(record.payload, LogPayload::Cancelled));

    // No second cancellation record arrives for the duplicate terminate.
    let extra = tokio::time::timeout(Duration::from_millis(200), async {
        loop {
            match stream.next().await {
                Some(record) if matches!(record.payload, LogPayload::Cancelled) => return true,
                Some(_) => continue,
                None => return false,
            }
        }
    })
    .await;
    assert!(extra.is_err(), "duplicate terminate must not publish again");

    engine.shutdown().await;
}

#[tokio::test]
async fn test_session_still_retrievable_after_cancel() {
    let engine = DiscoveryEngine::new(test_settings()).unwrap();
    engine.start().unwrap();

    let session_id = engine.create_session(config_for_domain("example.com")).unwrap();
    engine.terminate_session(session_id).unwrap();

    // Graceful drainage: the handle survives cancellation.
    let session = engine.session(session_id).unwrap();
    assert!(session.is_done());
    assert_eq!(engine.session_stats(session_id).unwrap().received, 0);

    engine.shutdown().await;
}
