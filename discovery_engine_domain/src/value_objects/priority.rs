// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Handler Priority
//!
//! Priority value object controlling the order of handler execution within a
//! per-asset-type pipeline. Lower priorities run earlier; handlers sharing a
//! priority form one parallel stage.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Handler execution priority within a pipeline, bounded to `[1..9]`.
///
/// Priority expresses "cheap/authoritative first, expensive/speculative
/// last". A CNAME resolution handler registers at a low priority so that an
/// A-record handler at a higher priority can short-circuit when the name
/// turns out to be an alias; apex discovery (NS/MX) runs late, at priority 9,
/// to observe accumulated context.
///
/// # Clamping Rules
///
/// Construction never fails; out-of-range requests are normalized instead:
///
/// - `0` is treated as "unspecified" and becomes the default (`5`)
/// - values below the range clamp to `1`
/// - values above the range clamp to `9`
///
/// # Examples
///
/// ```
/// use discovery_engine_domain::value_objects::Priority;
///
/// assert_eq!(Priority::new(3).value(), 3);
/// assert_eq!(Priority::new(0).value(), 5); // unspecified -> default
/// assert_eq!(Priority::new(99).value(), 9); // clamped
/// assert_eq!(Priority::from_signed(-1).value(), 1); // clamped
/// ```
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    /// Lowest (earliest-running) priority
    pub const MIN: Priority = Priority(1);

    /// Highest (latest-running) priority
    pub const MAX: Priority = Priority(9);

    /// Default priority assigned when a handler does not declare one
    pub const DEFAULT: Priority = Priority(5);

    /// Creates a priority from an unsigned value, applying the clamping rules
    pub fn new(value: u8) -> Self {
        match value {
            0 => Self::DEFAULT,
            v if v > 9 => Self::MAX,
            v => Priority(v),
        }
    }

    /// Creates a priority from a signed value, applying the clamping rules.
    ///
    /// Negative values clamp to [`Priority::MIN`]; zero becomes the default.
    pub fn from_signed(value: i32) -> Self {
        if value < 0 {
            Self::MIN
        } else {
            Self::new(value.min(u8::MAX as i32) as u8)
        }
    }

    /// Returns the numeric priority value in `[1..9]`
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Iterates all priorities in execution order (1 through 9)
    pub fn all() -> impl Iterator<Item = Priority> {
        (1..=9).map(Priority)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for Priority {
    fn from(value: u8) -> Self {
        Priority::new(value)
    }
}
