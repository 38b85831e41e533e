// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Structured logging
//!
//! Initializes the global `tracing` subscriber: JSON output in production,
//! human-readable in development, level controlled by `RUST_LOG` with a
//! configurable default. Hot paths (`ModelInstance::infer`, executor
//! dispatch, registry diff application) carry `#[tracing::instrument]` and
//! structured fields for model name/version/request id rather than ad hoc
//! `format!` strings.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, for local development.
    Pretty,
    /// Newline-delimited JSON, for log aggregation in production.
    Json,
}

/// Installs the global `tracing` subscriber. Must be called once, early in
/// `main`, before any other code logs.
pub fn init_logging(default_level: &str, format: LogFormat) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match format {
        LogFormat::Json => Registry::default().with(filter).with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => Registry::default().with(filter).with(tracing_subscriber::fmt::layer().pretty()).try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_and_json_formats_are_distinct() {
        assert_ne!(LogFormat::Pretty, LogFormat::Json);
    }
}
