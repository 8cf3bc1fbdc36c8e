// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Basic Discovery Example
//!
//! Demonstrates the engine lifecycle end to end with a stubbed apex
//! handler: construct the engine, register handlers, open a session,
//! ingest a seed FQDN, wait for quiescence, and read back the discovered
//! closure.
//!
//! Run with:
//!
//! ```bash
//! cargo run --example basic_discovery
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use discovery_engine::{DiscoveryEngine, EngineSettings};
use discovery_engine_domain::entities::asset::{Asset, AssetType, Fqdn};
use discovery_engine_domain::entities::relation::Relation;
use discovery_engine_domain::entities::session_config::SessionConfig;
use discovery_engine_domain::events::discovery_event::DiscoveryEvent;
use discovery_engine_domain::services::asset_handler::{AssetHandler, HandlerContext};
use discovery_engine_domain::services::cache_service::AssetCacheService;
use discovery_engine_domain::value_objects::{HandlerId, Priority, Scope};
use discovery_engine_domain::EngineError;

/// Stubbed apex discovery: "resolves" two nameservers for the seed domain.
struct ApexLookup;

#[async_trait]
impl AssetHandler for ApexLookup {
    fn id(&self) -> HandlerId {
        HandlerId::new("demo", "apex_lookup").expect("valid id")
    }

    fn asset_type(&self) -> AssetType {
        AssetType::Fqdn
    }

    fn priority(&self) -> Priority {
        Priority::new(9)
    }

    fn output_types(&self) -> Vec<AssetType> {
        vec![AssetType::Fqdn]
    }

    async fn invoke(&self, event: &DiscoveryEvent, ctx: &HandlerContext) -> Result<(), EngineError> {
        let name = event.asset().as_fqdn()?;
        ctx.cache().set_asset(event.asset().clone());

        // Only the apex gets expanded in this demo.
        if name.parent().map(|p| p.name().contains('.')).unwrap_or(true) {
            return Ok(());
        }

        for ns in ["ns1", "ns2"] {
            let target = Asset::Fqdn(Fqdn::new(format!("{}.{}", ns, name.name()))?);
            ctx.cache().set_asset(target.clone());
            ctx.cache()
                .set_relation(Relation::new("ns_record", event.asset().key(), target.key())?)?;
            ctx.dispatch(DiscoveryEvent::new(event.session_id(), target))?;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), EngineError> {
    discovery_engine_bootstrap::init_tracing("info");

    let settings = EngineSettings {
        quiescence_window: Duration::from_millis(500),
        ..Default::default()
    };
    let engine = DiscoveryEngine::new(settings)?;
    engine.register_handler(Arc::new(ApexLookup))?;
    engine.start()?;

    // ctrl-c / SIGTERM initiate the engine's grace-bounded shutdown.
    discovery_engine_bootstrap::spawn_signal_listener(engine.shutdown_coordinator());
    let interrupted = engine.shutdown_coordinator().token();

    let config = SessionConfig::with_scope(Scope::new().add_domain("example.com"));
    let (session_id, session) = engine.create_session_handle(config)?;

    println!("session {} created", session_id);
    engine.ingest_asset(session_id, Asset::Fqdn(Fqdn::new("example.com")?))?;

    tokio::select! {
        result = engine.wait_for_quiescence(session_id) => result?,
        _ = interrupted.cancelled() => println!("interrupted; shutting down"),
    }

    let stats = session.stats_snapshot();
    println!(
        "work items: {}/{} (errored: {})",
        stats.work_items_completed, stats.work_items_total, stats.errored
    );
    for record in session.cache().assets_by_type(AssetType::Fqdn) {
        println!("discovered: {}", record.asset);
    }

    if !engine.shutdown().await {
        println!("shutdown grace period expired; exiting anyway");
    }
    Ok(())
}
