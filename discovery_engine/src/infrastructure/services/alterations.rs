// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Name Alteration Generation
//!
//! This module generates speculative FQDN candidates from a discovered
//! name. Handlers that expand the name surface (guess generators) use it to
//! derive plausible siblings of a resolved name, then promote only
//! filter-admitted candidates to full DNS verification.
//!
//! ## Overview
//!
//! Three alteration families are generated from the first label of the
//! input name:
//!
//! - **Affixes**: configured prefixes and suffixes joined with `-`
//!   (`www` -> `dev-www`, `www-01`)
//! - **Numeric neighbors**: when the label carries a trailing number, the
//!   span of nearby numbers (`web3` -> `web1`, `web2`, `web4`, `web5`)
//! - **Numeric appends**: plain numbered variants for bare labels
//!   (`api` -> `api1`, `api2`)
//!
//! Every candidate passes through the global [`GuessFilter`] before it is
//! returned, so a name already attempted anywhere in the engine is not
//! handed out twice, and the filter's attempt budget bounds the total
//! speculative surface.

use std::sync::Arc;

use discovery_engine_domain::entities::asset::Fqdn;

use crate::infrastructure::filters::GuessFilter;

/// Default prefixes/suffixes mirroring common infrastructure naming
const DEFAULT_AFFIXES: &[&str] = &["dev", "stage", "test", "api", "internal", "new", "old"];

/// Tuning for the alteration generator.
#[derive(Debug, Clone)]
pub struct AlterationConfig {
    /// Words joined before the first label (`dev-www`)
    pub prefixes: Vec<String>,
    /// Words joined after the first label (`www-dev`)
    pub suffixes: Vec<String>,
    /// How far numeric neighbors range around a trailing number
    pub number_span: u32,
    /// Upper bound on candidates returned per input name
    pub max_candidates: usize,
}

impl Default for AlterationConfig {
    fn default() -> Self {
        let affixes: Vec<String> = DEFAULT_AFFIXES.iter().map(|s| s.to_string()).collect();
        Self {
            prefixes: affixes.clone(),
            suffixes: affixes,
            number_span: 2,
            max_candidates: 50,
        }
    }
}

/// Speculative FQDN candidate generator gated by the guess filter.
pub struct NameAlterations {
    config: AlterationConfig,
    filter: Arc<GuessFilter>,
}

impl NameAlterations {
    /// Creates a generator over the engine's global guess filter
    pub fn new(filter: Arc<GuessFilter>) -> Self {
        Self::with_config(AlterationConfig::default(), filter)
    }

    /// Creates a generator with explicit tuning
    pub fn with_config(config: AlterationConfig, filter: Arc<GuessFilter>) -> Self {
        Self { config, filter }
    }

    /// Generates filter-admitted candidate names derived from `name`.
    ///
    /// Single-label names produce nothing: altering a bare registered
    /// domain guesses other registrations, not other hosts.
    pub fn generate(&self, name: &Fqdn) -> Vec<Fqdn> {
        let Some((label, parent)) = name.name().split_once('.') else {
            return Vec::new();
        };

        let mut candidates = Vec::new();
        for variant in self.label_variants(label) {
            if candidates.len() >= self.config.max_candidates {
                break;
            }
            let candidate = format!("{}.{}", variant, parent);
            if candidate == name.name() {
                continue;
            }
            if !self.filter.accept(&candidate) {
                continue;
            }
            if let Ok(fqdn) = Fqdn::new(&candidate) {
                candidates.push(fqdn);
            }
        }
        candidates
    }

    fn label_variants(&self, label: &str) -> Vec<String> {
        let mut variants = Vec::new();

        for prefix in &self.config.prefixes {
            variants.push(format!("{}-{}", prefix, label));
        }
        for suffix in &self.config.suffixes {
            variants.push(format!("{}-{}", label, suffix));
        }

        match split_trailing_number(label) {
            Some((stem, number)) => {
                let span = self.config.number_span;
                let low = number.saturating_sub(span);
                for n in low..=number.saturating_add(span) {
                    if n != number {
                        variants.push(format!("{}{}", stem, n));
                    }
                }
            }
            None => {
                for n in 1..=self.config.number_span {
                    variants.push(format!("{}{}", label, n));
                }
            }
        }

        variants
    }
}

/// Splits a label into its stem and trailing decimal number, if any
fn split_trailing_number(label: &str) -> Option<(&str, u32)> {
    let digits = label.chars().rev().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let (stem, number) = label.split_at(label.len() - digits);
    number.parse().ok().map(|n| (stem, n))
}
