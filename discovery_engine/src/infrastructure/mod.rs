// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Layer
//!
//! Concrete implementations behind the domain ports: the runtime (registry,
//! pipelines, dispatcher, rate limiter, graph write queue), the session
//! cache, the log bus, speculative expansion filters, metrics, repository
//! adapters, and configuration loading.

pub mod bus;
pub mod cache;
pub mod config;
pub mod filters;
pub mod metrics;
pub mod repositories;
pub mod runtime;
pub mod services;
