// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Signal Handling
//!
//! Connects OS termination signals to the engine's shutdown coordinator.
//! Embedding binaries call [`spawn_signal_listener`] with the coordinator
//! the engine exposes; the first SIGINT/SIGTERM initiates shutdown, and
//! the coordinator's grace period bounds the drain from there.

use crate::shutdown::ShutdownCoordinator;

/// Spawns a background task that initiates shutdown on the first
/// termination signal.
///
/// Subsequent signals are ignored by this listener; the grace period in the
/// coordinator bounds how long a stuck drain can hold the process.
pub fn spawn_signal_listener(coordinator: ShutdownCoordinator) {
    tokio::spawn(async move {
        wait_for_termination_signal().await;
        coordinator.initiate();
    });
}

#[cfg(unix)]
async fn wait_for_termination_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to install SIGTERM handler: {}", e);
            // Fall back to ctrl-c only.
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT");
        }
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_termination_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_listener_spawns_without_firing() {
        let coordinator = ShutdownCoordinator::default();
        spawn_signal_listener(coordinator.clone());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!coordinator.is_shutting_down());
    }
}
