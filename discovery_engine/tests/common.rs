// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Common Test Helpers
//!
//! Shared stub handlers and fixtures for the integration suites. The stub
//! handler records every invocation (with timestamps and a concurrency
//! gauge) and can cache assets, emit follow-up FQDNs, fail, sleep, or
//! panic on demand, which covers the behaviors the engine contracts care
//! about.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use discovery_engine::EngineSettings;
use discovery_engine_domain::entities::asset::{Asset, AssetType, Fqdn};
use discovery_engine_domain::entities::relation::Relation;
use discovery_engine_domain::entities::session_config::SessionConfig;
use discovery_engine_domain::events::discovery_event::DiscoveryEvent;
use discovery_engine_domain::services::asset_handler::{AssetHandler, HandlerContext};
use discovery_engine_domain::value_objects::{HandlerId, Priority, Scope};
use discovery_engine_domain::EngineError;

/// One recorded handler invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    pub handler: String,
    pub event: String,
    pub started: Instant,
}

/// Shared invocation log across all stub handlers of a test
#[derive(Clone, Default)]
pub struct InvocationLog {
    entries: Arc<Mutex<Vec<Invocation>>>,
}

impl InvocationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, handler: &HandlerId, event: &DiscoveryEvent) {
        self.entries.lock().push(Invocation {
            handler: handler.to_string(),
            event: event.name().to_string(),
            started: Instant::now(),
        });
    }

    pub fn entries(&self) -> Vec<Invocation> {
        self.entries.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn count_for(&self, handler: &str) -> usize {
        self.entries.lock().iter().filter(|i| i.handler == handler).count()
    }

    pub fn first_start(&self, handler: &str) -> Option<Instant> {
        self.entries
            .lock()
            .iter()
            .filter(|i| i.handler == handler)
            .map(|i| i.started)
            .min()
    }
}

/// Tracks current and peak concurrency across invocations of one handler
#[derive(Clone, Default)]
pub struct ConcurrencyGauge {
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ConcurrencyGauge {
    pub fn new() -> Self {
        Self::default()
    }

    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Configurable stub handler used by every integration suite.
pub struct StubHandler {
    id: HandlerId,
    asset_type: AssetType,
    priority: Priority,
    max_instances: usize,
    delay: Duration,
    /// Cache the incoming asset on entry (the common handler shape)
    cache_input: bool,
    /// Emit these FQDNs (with `ns_record` relations) when the incoming
    /// asset's canonical key matches `emit_for`
    emit_names: Vec<String>,
    emit_for: Option<String>,
    fail_with: Option<String>,
    should_panic: bool,
    log: InvocationLog,
    gauge: ConcurrencyGauge,
}

impl StubHandler {
    pub fn new(plugin: &str, name: &str, asset_type: AssetType, log: InvocationLog) -> Self {
        Self {
            id: HandlerId::new(plugin, name).expect("valid handler id"),
            asset_type,
            priority: Priority::DEFAULT,
            max_instances: 0,
            delay: Duration::ZERO,
            cache_input: true,
            emit_names: Vec::new(),
            emit_for: None,
            fail_with: None,
            should_panic: false,
            log,
            gauge: ConcurrencyGauge::new(),
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Priority::new(priority);
        self
    }

    pub fn with_max_instances(mut self, max_instances: usize) -> Self {
        self.max_instances = max_instances;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Emit `names` (as FQDN events and `ns_record` relations) whenever the
    /// incoming asset's canonical key equals `trigger`.
    pub fn with_emissions(mut self, trigger: &str, names: &[&str]) -> Self {
        self.emit_for = Some(trigger.to_string());
        self.emit_names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_failure(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    pub fn with_panic(mut self) -> Self {
        self.should_panic = true;
        self
    }

    pub fn gauge(&self) -> ConcurrencyGauge {
        self.gauge.clone()
    }
}

#[async_trait]
impl AssetHandler for StubHandler {
    fn id(&self) -> HandlerId {
        self.id.clone()
    }

    fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn max_instances(&self) -> usize {
        self.max_instances
    }

    fn output_types(&self) -> Vec<AssetType> {
        if self.emit_names.is_empty() {
            Vec::new()
        } else {
            vec![AssetType::Fqdn]
        }
    }

    async fn invoke(&self, event: &DiscoveryEvent, ctx: &HandlerContext) -> Result<(), EngineError> {
        self.gauge.enter();
        self.log.record(&self.id, event);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.should_panic {
            // The gauge leaks its slot here on purpose; the pipeline must
            // recover regardless.
            panic!("stub handler panic for {}", event.name());
        }

        if let Some(message) = &self.fail_with {
            self.gauge.exit();
            return Err(EngineError::external_service(message.clone()));
        }

        if self.cache_input {
            ctx.cache().set_asset(event.asset().clone());
        }

        if self
            .emit_for
            .as_deref()
            .is_some_and(|trigger| trigger == event.asset().canonical_key())
        {
            for name in &self.emit_names {
                let fqdn = Fqdn::new(name).expect("valid emitted fqdn");
                let asset = Asset::Fqdn(fqdn);
                ctx.cache().set_asset(asset.clone());
                ctx.cache()
                    .set_relation(
                        Relation::new("ns_record", event.asset().key(), asset.key())
                            .expect("valid relation"),
                    )
                    .expect("both endpoints cached");
                ctx.dispatch(DiscoveryEvent::new(event.session_id(), asset))?;
            }
        }

        self.gauge.exit();
        Ok(())
    }
}

/// Engine settings tuned for fast tests: a short quiescence window
pub fn test_settings() -> EngineSettings {
    EngineSettings {
        quiescence_window: Duration::from_millis(200),
        ..Default::default()
    }
}

/// Session configuration scoped to one domain
pub fn config_for_domain(domain: &str) -> SessionConfig {
    SessionConfig::with_scope(Scope::new().add_domain(domain))
}

/// Convenience FQDN asset constructor
pub fn fqdn(name: &str) -> Asset {
    Asset::Fqdn(Fqdn::new(name).expect("valid fqdn"))
}
