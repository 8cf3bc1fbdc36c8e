// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Guess Admission Filter
//!
//! Probabilistic admission filter bounding speculative FQDN expansion.
//! Handlers that generate a large candidate surface (alteration and
//! wordlist-style generators) push every candidate through this filter and
//! only promote accepted names to full DNS verification.
//!
//! ## Behavior
//!
//! - A bloom filter with ~1% false-positive tolerance remembers names seen
//!   so far; a name the filter reports as seen is rejected.
//! - An attempt budget (default 10 000) bounds the filter's lifetime: when
//!   the counter exceeds the budget the filter resets, trading a burst of
//!   re-admitted duplicates for bounded memory and recovered accuracy.
//! - The filter is engine-global, bounding speculative load across all
//!   concurrent sessions.
//!
//! False positives reject a never-seen name (≈1% of fresh candidates);
//! false negatives are impossible, so a name is never verified twice within
//! one filter generation.

use parking_lot::Mutex;
use probabilistic_collections::bloom::BloomFilter;

/// Default attempt budget before the filter resets
pub const DEFAULT_ATTEMPT_BUDGET: u64 = 10_000;

/// Default false-positive tolerance
pub const DEFAULT_FALSE_POSITIVE_RATE: f64 = 0.01;

struct FilterInner {
    filter: BloomFilter<String>,
    attempts: u64,
    resets: u64,
}

/// Bloom-backed admission filter for speculative name candidates.
pub struct GuessFilter {
    inner: Mutex<FilterInner>,
    capacity: usize,
    false_positive_rate: f64,
    attempt_budget: u64,
}

impl GuessFilter {
    /// Creates a filter with the default budget and tolerance
    pub fn new() -> Self {
        Self::with_parameters(DEFAULT_ATTEMPT_BUDGET, DEFAULT_FALSE_POSITIVE_RATE)
    }

    /// Creates a filter with an explicit attempt budget and tolerance.
    ///
    /// The bloom capacity is sized to the budget so the configured
    /// false-positive rate holds for a full filter generation.
    pub fn with_parameters(attempt_budget: u64, false_positive_rate: f64) -> Self {
        let capacity = attempt_budget.max(1) as usize;
        Self {
            inner: Mutex::new(FilterInner {
                filter: BloomFilter::new(capacity, false_positive_rate),
                attempts: 0,
                resets: 0,
            }),
            capacity,
            false_positive_rate,
            attempt_budget,
        }
    }

    /// Admits or rejects a candidate name.
    ///
    /// Returns `true` when the name has not been seen this generation; the
    /// name is recorded as seen either way.
    pub fn accept(&self, name: &str) -> bool {
        let name = name.trim_end_matches('.').to_lowercase();
        let mut inner = self.inner.lock();

        inner.attempts += 1;
        if inner.attempts > self.attempt_budget {
            inner.filter = BloomFilter::new(self.capacity, self.false_positive_rate);
            inner.attempts = 1;
            inner.resets += 1;
        }

        if inner.filter.contains(&name) {
            return false;
        }
        inner.filter.insert(&name);
        true
    }

    /// Returns attempts made in the current filter generation
    pub fn attempts(&self) -> u64 {
        self.inner.lock().attempts
    }

    /// Returns how many times the budget forced a reset
    pub fn resets(&self) -> u64 {
        self.inner.lock().resets
    }
}

impl Default for GuessFilter {
    fn default() -> Self {
        Self::new()
    }
}
