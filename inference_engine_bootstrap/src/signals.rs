// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Signal handling
//!
//! Wires SIGTERM/SIGINT/SIGHUP (Ctrl-C on Windows) into a
//! [`crate::shutdown::ShutdownCoordinator`]. Runs as a spawned task for the
//! lifetime of the process; `main` awaits the coordinator rather than this
//! task directly.

use crate::shutdown::ShutdownCoordinator;

/// Spawns a task that initiates `coordinator`'s shutdown on the first
/// termination signal received.
#[cfg(unix)]
pub fn spawn_signal_handler(coordinator: ShutdownCoordinator) -> tokio::task::JoinHandle<()> {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                return;
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("failed to install SIGINT handler: {e}");
                return;
            }
        };
        let mut sighup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("failed to install SIGHUP handler: {e}");
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => tracing::info!("received SIGTERM"),
            _ = sigint.recv() => tracing::info!("received SIGINT"),
            _ = sighup.recv() => tracing::info!("received SIGHUP"),
        }
        coordinator.initiate_shutdown();
    })
}

#[cfg(windows)]
pub fn spawn_signal_handler(coordinator: ShutdownCoordinator) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl-C handler: {e}");
            return;
        }
        tracing::info!("received Ctrl-C");
        coordinator.initiate_shutdown();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn handler_task_starts_without_panicking() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(50));
        let handle = spawn_signal_handler(coordinator.clone());
        assert!(!handle.is_finished());
        handle.abort();
    }
}
