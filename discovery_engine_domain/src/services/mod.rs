// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Services and Ports
//!
//! The handler capability trait plus the narrow ports the engine implements
//! for handlers: cache access, log publishing, dispatch, and the session
//! done signal. Ports that touch I/O are async; the cache and log ports are
//! synchronous by design (mutex-guarded maps and a broadcast send).

pub mod asset_handler;
pub mod cache_service;
pub mod log_service;

pub use asset_handler::{AssetHandler, DoneSignal, EventDispatch, HandlerContext, DEFAULT_HANDLER_TIMEOUT};
pub use cache_service::{AssetCacheService, CacheHit};
pub use log_service::LogPublisher;
