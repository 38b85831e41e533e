// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap configuration
//!
//! Settings the composition root needs before the application layer's polled
//! [`EngineConfig`](inference_engine_domain::repositories::config_source::EngineConfig)
//! even exists: shutdown grace period, metrics bind address, log format.
//! Derived from `ValidatedCli` with environment variable overrides; distinct
//! from the model/pipeline config the engine polls at runtime.

use std::time::Duration;

use crate::cli::{LogFormatArg, ValidatedCli, ValidatedCommand};

const DEFAULT_METRICS_BIND_ADDRESS: &str = "0.0.0.0:9090";

/// Bootstrap-level settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub grace_period: Duration,
    pub metrics_bind_address: String,
    pub log_format: LogFormatArg,
    pub verbose: bool,
}

impl BootstrapConfig {
    /// Resolves settings from the validated CLI, falling back to
    /// `MODEL_SERVER_GRACE_PERIOD_SECS` / `MODEL_SERVER_METRICS_BIND` env
    /// vars and then built-in defaults.
    pub fn from_validated_cli(cli: &ValidatedCli) -> Self {
        let bind_address = match &cli.command {
            ValidatedCommand::Serve { bind_address: Some(addr), .. } => addr.clone(),
            _ => std::env::var("MODEL_SERVER_METRICS_BIND")
                .unwrap_or_else(|_| DEFAULT_METRICS_BIND_ADDRESS.to_string()),
        };

        let grace_period = std::env::var("MODEL_SERVER_GRACE_PERIOD_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(crate::shutdown::DEFAULT_GRACE_PERIOD_SECS));

        Self { grace_period, metrics_bind_address: bind_address, log_format: cli.log_format, verbose: cli.verbose }
    }
}
