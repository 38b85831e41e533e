// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Runtime configuration
//!
//! Process-wide settings that are not part of the polled model/pipeline
//! config (`infrastructure::repositories::config_source`): the REST bind
//! address, per-call timeouts, and the poll interval itself. Loaded once
//! from an optional file plus `INFERENCE_ENGINE_*` environment overrides,
//! and held behind a `OnceLock` for the lifetime of the process.

use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub bind_address: String,
    pub config_poll_interval_secs: u64,
    pub slot_acquire_timeout_ms: u64,
    pub infer_timeout_ms: u64,
    pub sequence_idle_timeout_secs: u64,
    pub sequence_sweep_interval_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9001".to_string(),
            config_poll_interval_secs: 1,
            slot_acquire_timeout_ms: 500,
            infer_timeout_ms: 10_000,
            sequence_idle_timeout_secs: 3600,
            sequence_sweep_interval_secs: 60,
        }
    }
}

impl RuntimeConfig {
    pub fn slot_acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.slot_acquire_timeout_ms)
    }

    pub fn infer_timeout(&self) -> Duration {
        Duration::from_millis(self.infer_timeout_ms)
    }

    pub fn sequence_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.sequence_idle_timeout_secs)
    }

    pub fn sequence_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sequence_sweep_interval_secs)
    }

    /// Loads defaults, then an optional file, then `INFERENCE_ENGINE_*`
    /// environment overrides (e.g. `INFERENCE_ENGINE_BIND_ADDRESS`).
    pub fn load(file_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder().add_source(config::Config::try_from(&Self::default())?);
        if let Some(path) = file_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder
            .add_source(config::Environment::with_prefix("INFERENCE_ENGINE").separator("_"))
            .build()?
            .try_deserialize()
    }
}

static RUNTIME_CONFIG: OnceLock<RuntimeConfig> = OnceLock::new();

/// Initializes the process-wide runtime config. Must be called once, early
/// in `main`, before anything calls [`runtime_config`].
pub fn init_runtime_config(config: RuntimeConfig) -> Result<(), RuntimeConfig> {
    RUNTIME_CONFIG.set(config)
}

/// # Panics
/// Panics if [`init_runtime_config`] was never called.
pub fn runtime_config() -> &'static RuntimeConfig {
    RUNTIME_CONFIG.get().expect("runtime config not initialized; call init_runtime_config() in main()")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_internally_consistent() {
        let config = RuntimeConfig::default();
        assert_eq!(config.slot_acquire_timeout(), Duration::from_millis(500));
        assert_eq!(config.infer_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn load_with_no_file_falls_back_to_defaults() {
        let config = RuntimeConfig::load(None).unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }
}
