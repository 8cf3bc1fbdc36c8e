// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Speculative expansion filters: reverse-DNS sweep planning and the
//! bloom-backed guess admission filter.

pub mod address_sweep;
pub mod guess_filter;

pub use address_sweep::{plan_sweep, ACTIVE_SWEEP_SIZE, DEFAULT_SWEEP_SIZE, MAX_SWEEP_SIZE};
pub use guess_filter::GuessFilter;
