// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # End-to-End Discovery Expansion Tests
//!
//! Drives the full loop: ingest a seed FQDN, let a stubbed apex handler
//! emit nameserver targets, and verify the emitted events complete, the
//! cache holds the closure, relations deduplicate, and graph writes reach
//! the collaborator.

use std::sync::Arc;
use std::time::Duration;

use discovery_engine::infrastructure::repositories::InMemoryGraphRepository;
use discovery_engine::DiscoveryEngine;
use discovery_engine_domain::entities::asset::AssetType;
use discovery_engine_domain::entities::relation::RelationQuery;
use discovery_engine_domain::services::cache_service::AssetCacheService;

use crate::common::{config_for_domain, fqdn, test_settings, InvocationLog, StubHandler};

#[tokio::test]
async fn test_fqdn_expansion_reaches_transitive_closure() {
    let log = InvocationLog::new();
    let engine = DiscoveryEngine::new(test_settings()).unwrap();

    // The stubbed apex handler discovers two nameservers for the seed
    // domain and nothing for anything else.
    engine
        .register_handler(Arc::new(
            StubHandler::new("dns", "apex_lookup", AssetType::Fqdn, log.clone())
                .with_priority(9)
                .with_emissions("example.com", &["ns1.example.com", "ns2.example.com"]),
        ))
        .unwrap();
    engine.start().unwrap();

    let (session_id, session) = engine.create_session_handle(config_for_domain("example.com")).unwrap();
    engine.ingest_asset(session_id, fqdn("example.com")).unwrap();
    engine.wait_for_quiescence(session_id).await.unwrap();

    // Seed plus both emitted nameservers were dispatched and completed.
    let stats = session.stats_snapshot();
    assert_eq!(stats.work_items_total, 3);
    assert_eq!(stats.work_items_completed, 3);
    assert_eq!(stats.done, 3);
    assert_eq!(stats.errored, 0);

    // The cache holds the transitive closure.
    let cached = session.cache().assets_by_type(AssetType::Fqdn);
    let mut names: Vec<String> = cached.iter().map(|r| r.asset.canonical_key()).collect();
    names.sort();
    assert_eq!(names, vec!["example.com", "ns1.example.com", "ns2.example.com"]);

    // Both ns_record edges exist, one logical edge each.
    let edges = session.cache().get_relations(
        &RelationQuery::any()
            .with_type("ns_record")
            .with_from(fqdn("example.com").key()),
    );
    assert_eq!(edges.len(), 2);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_reingesting_known_assets_dedupes_in_cache() {
    let log = InvocationLog::new();
    let engine = DiscoveryEngine::new(test_settings()).unwrap();
    engine
        .register_handler(Arc::new(StubHandler::new("dns", "cache", AssetType::Fqdn, log.clone())))
        .unwrap();
    engine.start().unwrap();

    let (session_id, session) = engine.create_session_handle(config_for_domain("a.com")).unwrap();
    for _ in 0..3 {
        engine.ingest_asset(session_id, fqdn("a.com")).unwrap();
    }
    engine.wait_for_quiescence(session_id).await.unwrap();

    // Three events processed, one cached record.
    assert_eq!(session.stats_snapshot().done, 3);
    assert_eq!(session.cache().assets_by_type(AssetType::Fqdn).len(), 1);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_graph_writes_reach_the_collaborator() {
    let log = InvocationLog::new();
    let repository = Arc::new(InMemoryGraphRepository::new());
    let engine = DiscoveryEngine::with_repository(test_settings(), repository.clone()).unwrap();

    // A handler that persists what it sees.
    struct Persisting {
        inner: StubHandler,
    }

    use async_trait::async_trait;
    use discovery_engine_domain::entities::asset::AssetRecord;
    use discovery_engine_domain::events::discovery_event::DiscoveryEvent;
    use discovery_engine_domain::services::asset_handler::{AssetHandler, HandlerContext};
    use discovery_engine_domain::value_objects::{HandlerId, Priority};
    use discovery_engine_domain::EngineError;

    #[async_trait]
    impl AssetHandler for Persisting {
        fn id(&self) -> HandlerId {
            self.inner.id()
        }
        fn asset_type(&self) -> AssetType {
            self.inner.asset_type()
        }
        fn priority(&self) -> Priority {
            self.inner.priority()
        }
        async fn invoke(&self, event: &DiscoveryEvent, ctx: &HandlerContext) -> Result<(), EngineError> {
            self.inner.invoke(event, ctx).await?;
            ctx.db()
                .upsert_asset(event.session_id(), &AssetRecord::new(event.asset().clone()))
                .await?;
            ctx.db().flush().await
        }
    }

    engine
        .register_handler(Arc::new(Persisting {
            inner: StubHandler::new("graph", "writer", AssetType::Fqdn, log.clone()),
        }))
        .unwrap();
    engine.start().unwrap();

    let session_id = engine.create_session(config_for_domain("example.com")).unwrap();
    engine.ingest_asset(session_id, fqdn("www.example.com")).unwrap();
    engine.ingest_asset(session_id, fqdn("mail.example.com")).unwrap();
    engine.wait_for_quiescence(session_id).await.unwrap();

    assert_eq!(repository.asset_count(session_id), 2);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_emitted_out_of_scope_assets_are_dropped() {
    let log = InvocationLog::new();
    let engine = DiscoveryEngine::new(test_settings()).unwrap();
    engine
        .register_handler(Arc::new(
            StubHandler::new("dns", "apex_lookup", AssetType::Fqdn, log.clone())
                .with_priority(9)
                .with_emissions("example.com", &["ns1.example.com"]),
        ))
        .unwrap();
    engine.start().unwrap();

    // Scope admits example.com only: the out-of-scope seed below is
    // rejected at dispatch and never reaches a handler.
    let (session_id, session) = engine.create_session_handle(config_for_domain("example.com")).unwrap();
    assert!(engine.ingest_asset(session_id, fqdn("other.net")).is_err());
    engine.ingest_asset(session_id, fqdn("example.com")).unwrap();
    engine.wait_for_quiescence(session_id).await.unwrap();

    let stats = session.stats_snapshot();
    assert_eq!(stats.received, 2);
    assert_eq!(stats.done, 2);
    assert_eq!(
        log.entries()
            .iter()
            .filter(|i| i.event.contains("other.net"))
            .count(),
        0
    );

    engine.shutdown().await;
}

#[tokio::test]
async fn test_quiescence_follows_cascading_emissions() {
    let log = InvocationLog::new();
    let engine = DiscoveryEngine::new(test_settings()).unwrap();

    // Two levels of expansion: the seed discovers a child, the child
    // discovers a grandchild.
    engine
        .register_handler(Arc::new(
            StubHandler::new("dns", "level1", AssetType::Fqdn, log.clone())
                .with_priority(3)
                .with_delay(Duration::from_millis(20))
                .with_emissions("example.com", &["child.example.com"]),
        ))
        .unwrap();
    engine
        .register_handler(Arc::new(
            StubHandler::new("dns", "level2", AssetType::Fqdn, log.clone())
                .with_priority(6)
                .with_delay(Duration::from_millis(20))
                .with_emissions("child.example.com", &["grandchild.example.com"]),
        ))
        .unwrap();
    engine.start().unwrap();

    let (session_id, session) = engine.create_session_handle(config_for_domain("example.com")).unwrap();
    engine.ingest_asset(session_id, fqdn("example.com")).unwrap();
    engine.wait_for_quiescence(session_id).await.unwrap();

    // Quiescence was only declared after the whole cascade drained.
    let stats = session.stats_snapshot();
    assert_eq!(stats.work_items_total, 3);
    assert_eq!(stats.work_items_completed, 3);
    assert_eq!(session.cache().assets_by_type(AssetType::Fqdn).len(), 3);

    engine.shutdown().await;
}
