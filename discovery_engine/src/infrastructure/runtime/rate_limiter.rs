// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Data-Source Rate Limiting
//!
//! Per-plugin leaky buckets gating outbound calls to third-party services.
//! The bucket registry is a process-wide singleton created at engine init
//! and shared by all sessions, so a service's rate budget holds across
//! concurrent sessions. Handlers call `take` before each outbound request
//! and block until a token drips in.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default budget applied to plugins without a configured rate hint
pub const DEFAULT_RATE_PER_MINUTE: u32 = 60;

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Leaky-bucket limiter: tokens drip in at a fixed rate, up to a burst
/// capacity of one second's worth.
pub struct LeakyBucket {
    refill_per_sec: f64,
    capacity: f64,
    state: Mutex<BucketState>,
}

impl LeakyBucket {
    /// Creates a bucket from a per-minute budget; the bucket starts full
    pub fn new(rate_per_minute: u32) -> Self {
        let refill_per_sec = f64::from(rate_per_minute.max(1)) / 60.0;
        let capacity = refill_per_sec.max(1.0);
        Self {
            refill_per_sec,
            capacity,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Takes one token, waiting for the bucket to refill when empty
    pub async fn take(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock();
                let elapsed = state.last_refill.elapsed().as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
                state.last_refill = Instant::now();

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                Duration::from_secs_f64((1.0 - state.tokens) / self.refill_per_sec)
            };
            tokio::time::sleep(wait).await;
        }
    }

    /// Attempts to take a token without waiting
    pub fn try_take(&self) -> bool {
        let mut state = self.state.lock();
        let elapsed = state.last_refill.elapsed().as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = Instant::now();
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Process-wide registry of per-plugin buckets.
pub struct RateLimiterRegistry {
    buckets: RwLock<HashMap<String, Arc<LeakyBucket>>>,
    default_rate_per_minute: u32,
}

impl RateLimiterRegistry {
    /// Creates a registry with the default per-plugin budget
    pub fn new() -> Self {
        Self::with_default_rate(DEFAULT_RATE_PER_MINUTE)
    }

    /// Creates a registry with an explicit default budget
    pub fn with_default_rate(default_rate_per_minute: u32) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            default_rate_per_minute,
        }
    }

    /// Returns the bucket for a plugin, creating it on first use.
    ///
    /// `rate_hint` comes from the session's data-source configuration; the
    /// first caller to name a plugin fixes its budget.
    pub fn limiter_for(&self, plugin: &str, rate_hint: Option<u32>) -> Arc<LeakyBucket> {
        if let Some(bucket) = self.buckets.read().get(plugin) {
            return bucket.clone();
        }
        let mut buckets = self.buckets.write();
        buckets
            .entry(plugin.to_string())
            .or_insert_with(|| {
                Arc::new(LeakyBucket::new(
                    rate_hint.unwrap_or(self.default_rate_per_minute),
                ))
            })
            .clone()
    }

    /// Returns the number of live buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.read().len()
    }
}

impl Default for RateLimiterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
