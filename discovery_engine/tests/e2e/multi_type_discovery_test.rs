// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Multi-Type Discovery Tests
//!
//! Drives the engine across asset types (FQDN -> IP address -> netblock)
//! and across concurrent sessions, verifying that pipelines for different
//! types run independently and that session state stays isolated.

use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;

use discovery_engine::infrastructure::filters::plan_sweep;
use discovery_engine::DiscoveryEngine;
use discovery_engine_domain::entities::asset::{Asset, AssetType, IpAddress, Netblock};
use discovery_engine_domain::entities::relation::{Relation, RelationQuery};
use discovery_engine_domain::events::discovery_event::DiscoveryEvent;
use discovery_engine_domain::services::asset_handler::{AssetHandler, HandlerContext};
use discovery_engine_domain::services::cache_service::AssetCacheService;
use discovery_engine_domain::value_objects::{HandlerId, Priority, Scope};
use discovery_engine_domain::EngineError;

use crate::common::{config_for_domain, fqdn, test_settings, InvocationLog, StubHandler};

/// Resolves the seed FQDN to a fixed address and emits it as a new event.
struct ResolveHandler {
    log: InvocationLog,
    address: IpAddr,
}

#[async_trait]
impl AssetHandler for ResolveHandler {
    fn id(&self) -> HandlerId {
        HandlerId::new("dns", "a_record").unwrap()
    }

    fn asset_type(&self) -> AssetType {
        AssetType::Fqdn
    }

    fn priority(&self) -> Priority {
        Priority::new(2)
    }

    fn output_types(&self) -> Vec<AssetType> {
        vec![AssetType::IpAddress]
    }

    async fn invoke(&self, event: &DiscoveryEvent, ctx: &HandlerContext) -> Result<(), EngineError> {
        self.log.record(&self.id(), event);
        let name = event.asset().as_fqdn()?;

        // Respect the session's transformation permissions.
        let admitted = ctx.check_transformations(AssetType::Fqdn, &self.output_types(), Some("dns"));
        if admitted.is_empty() {
            return Err(EngineError::transformation_mismatch(format!(
                "fqdn -> ip_address not requested for {}",
                name.name()
            )));
        }

        ctx.cache().set_asset(event.asset().clone());
        let ip = Asset::IpAddress(IpAddress::new(self.address));
        ctx.cache().set_asset(ip.clone());
        ctx.cache()
            .set_relation(Relation::new("a_record", event.asset().key(), ip.key())?)?;
        ctx.dispatch(DiscoveryEvent::new(event.session_id(), ip))
    }
}

/// Consumes IP address events: caches the surrounding netblock and plans a
/// reverse sweep over the neighborhood.
struct SweepHandler {
    log: InvocationLog,
}

#[async_trait]
impl AssetHandler for SweepHandler {
    fn id(&self) -> HandlerId {
        HandlerId::new("dns", "reverse_sweep").unwrap()
    }

    fn asset_type(&self) -> AssetType {
        AssetType::IpAddress
    }

    fn priority(&self) -> Priority {
        Priority::new(5)
    }

    async fn invoke(&self, event: &DiscoveryEvent, ctx: &HandlerContext) -> Result<(), EngineError> {
        self.log.record(&self.id(), event);
        let ip = event.asset().as_ip_address()?;

        ctx.cache().set_asset(event.asset().clone());
        let block = Asset::Netblock(Netblock::parse("10.0.0.0/29")?);
        ctx.cache().set_asset(block.clone());
        ctx.cache()
            .set_relation(Relation::new("contains", block.key(), event.asset().key())?)?;

        // The cached /29 governs the sweep: at most seven neighbors exist
        // inside it, and every candidate stays within the block.
        let sweep = plan_sweep(ip.address(), ctx.cache(), ctx.config().active);
        let cidr = block.as_netblock()?.cidr();
        if sweep.len() > 7 || sweep.iter().any(|candidate| !cidr.contains(candidate)) {
            return Err(EngineError::internal_error(format!(
                "sweep escaped its netblock: {} candidates",
                sweep.len()
            )));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_discovery_crosses_asset_types() {
    let log = InvocationLog::new();
    let engine = DiscoveryEngine::new(test_settings()).unwrap();
    engine
        .register_handler(Arc::new(ResolveHandler {
            log: log.clone(),
            address: "10.0.0.5".parse().unwrap(),
        }))
        .unwrap();
    engine
        .register_handler(Arc::new(SweepHandler { log: log.clone() }))
        .unwrap();
    engine.start().unwrap();

    let config = discovery_engine_domain::entities::session_config::SessionConfig::with_scope(
        Scope::new()
            .add_domain("example.com")
            .add_cidr("10.0.0.0/16".parse().unwrap()),
    );
    let (session_id, session) = engine.create_session_handle(config).unwrap();
    engine.ingest_asset(session_id, fqdn("www.example.com")).unwrap();
    engine.wait_for_quiescence(session_id).await.unwrap();

    // Both pipelines ran: the FQDN resolver and the IP sweep handler.
    assert_eq!(log.count_for("dns/a_record"), 1);
    assert_eq!(log.count_for("dns/reverse_sweep"), 1);

    let stats = session.stats_snapshot();
    assert_eq!(stats.work_items_total, 2);
    assert_eq!(stats.work_items_completed, 2);
    assert_eq!(stats.errored, 0);

    // The cache holds the cross-type closure with its relations.
    assert_eq!(session.cache().assets_by_type(AssetType::Fqdn).len(), 1);
    assert_eq!(session.cache().assets_by_type(AssetType::IpAddress).len(), 1);
    assert_eq!(session.cache().assets_by_type(AssetType::Netblock).len(), 1);

    let a_records = session
        .cache()
        .get_relations(&RelationQuery::any().with_type("a_record"));
    assert_eq!(a_records.len(), 1);
    let contains = session
        .cache()
        .get_relations(&RelationQuery::any().with_type("contains"));
    assert_eq!(contains.len(), 1);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_sessions_stay_isolated() {
    let log = InvocationLog::new();
    let engine = DiscoveryEngine::new(test_settings()).unwrap();
    engine
        .register_handler(Arc::new(
            StubHandler::new("dns", "apex", AssetType::Fqdn, log.clone())
                .with_emissions("alpha.test", &["ns1.alpha.test"]),
        ))
        .unwrap();
    engine.start().unwrap();

    let (alpha_id, alpha) = engine.create_session_handle(config_for_domain("alpha.test")).unwrap();
    let (beta_id, beta) = engine.create_session_handle(config_for_domain("beta.test")).unwrap();

    engine.ingest_asset(alpha_id, fqdn("alpha.test")).unwrap();
    engine.ingest_asset(beta_id, fqdn("beta.test")).unwrap();
    engine.wait_for_quiescence(alpha_id).await.unwrap();
    engine.wait_for_quiescence(beta_id).await.unwrap();

    // Alpha expanded (seed + emitted nameserver); beta stayed a single
    // event, and neither cache saw the other's assets.
    assert_eq!(alpha.stats_snapshot().done, 2);
    assert_eq!(beta.stats_snapshot().done, 1);
    assert_eq!(alpha.cache().assets_by_type(AssetType::Fqdn).len(), 2);
    assert_eq!(beta.cache().assets_by_type(AssetType::Fqdn).len(), 1);

    // Cancelling one session leaves the other dispatchable.
    engine.terminate_session(alpha_id).unwrap();
    assert!(engine.ingest_asset(alpha_id, fqdn("late.alpha.test")).is_err());
    engine.ingest_asset(beta_id, fqdn("www.beta.test")).unwrap();
    engine.wait_for_quiescence(beta_id).await.unwrap();
    assert_eq!(beta.stats_snapshot().done, 2);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_transformation_mismatch_is_not_an_error() {
    let log = InvocationLog::new();
    let engine = DiscoveryEngine::new(test_settings()).unwrap();
    engine
        .register_handler(Arc::new(ResolveHandler {
            log: log.clone(),
            address: "10.0.0.5".parse().unwrap(),
        }))
        .unwrap();
    engine.start().unwrap();

    // The configuration requests fqdn -> netblock only, so the resolver's
    // fqdn -> ip_address offer is not admitted and it returns without work.
    use discovery_engine_domain::value_objects::transformation::{Transformation, TransformationSet};
    let mut config = config_for_domain("example.com");
    config.transformations = TransformationSet::from_entries(vec![Transformation {
        from: Some(AssetType::Fqdn),
        to: [AssetType::Netblock].into_iter().collect(),
        ..Default::default()
    }]);

    let (session_id, session) = engine.create_session_handle(config).unwrap();
    engine.ingest_asset(session_id, fqdn("www.example.com")).unwrap();
    engine.wait_for_quiescence(session_id).await.unwrap();

    let stats = session.stats_snapshot();
    assert_eq!(stats.done, 1);
    // The mismatch is an admission rejection, not a handler failure.
    assert_eq!(stats.errored, 0);
    // No IP address was emitted.
    assert!(session.cache().assets_by_type(AssetType::IpAddress).is_empty());

    engine.shutdown().await;
}
