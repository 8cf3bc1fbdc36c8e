// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! In-core services available to handlers: speculative name alteration
//! generation gated by the guess filter.

pub mod alterations;

pub use alterations::{AlterationConfig, NameAlterations};
