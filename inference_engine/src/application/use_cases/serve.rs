// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Serve use case
//!
//! `model_server serve <file>`: the long-lived process. Wires a
//! [`FileConfigSource`] into a poll loop (§6) that drives [`ModelRegistry`]
//! and [`PipelineRegistry`] (C6/C10), starts the Prometheus [`MetricsEndpoint`]
//! and [`SequenceJanitor`] as background tasks, and serves until the
//! supplied [`CancellationToken`] fires.
//!
//! The wire protocol that would sit in front of
//! [`PredictUseCase`](crate::application::use_cases::predict::PredictUseCase)
//! (gRPC, REST, or a native client SDK) is out of scope; `serve` brings the
//! engine up to "ready to execute pipelines" and keeps it converged with
//! polled config, the way the domain's C6/C10/C12 components are specified.
//! A front end embeds `ModelRegistry`/`PipelineRegistry`/`PredictUseCase`
//! the same way this module's tests do.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info, warn};

use inference_engine_bootstrap::shutdown::CancellationToken;
use inference_engine_domain::repositories::config_source::ConfigSource;

use crate::application::services::{ModelRegistry, PipelineRegistry};
use crate::infrastructure::backend::DummyBackend;
use crate::infrastructure::config::runtime_config;
use crate::infrastructure::metrics::{MetricsEndpoint, MetricsService};
use crate::infrastructure::repositories::{FileConfigSource, LocalFileSystemAdapter};
use crate::infrastructure::runtime::{SequenceJanitor, TokioSlotPoolFactory};

pub struct ServeUseCase;

impl ServeUseCase {
    pub fn new() -> Self {
        Self
    }

    /// Runs the serve loop until `shutdown` is cancelled. Returns once every
    /// background task has been told to stop; does not itself wait out a
    /// grace period (the caller's `ShutdownCoordinator` owns that).
    pub async fn execute(&self, model_config_path: PathBuf, bind_address: Option<String>, shutdown: CancellationToken) -> Result<()> {
        let config = runtime_config();
        let bind_address = bind_address.unwrap_or_else(|| config.bind_address.clone());

        let config_source = FileConfigSource::new(model_config_path, Duration::from_secs(config.config_poll_interval_secs));
        let model_registry = Arc::new(ModelRegistry::new(
            Arc::new(LocalFileSystemAdapter::new()),
            Arc::new(DummyBackend),
            Arc::new(TokioSlotPoolFactory),
        ));
        let pipeline_registry = Arc::new(PipelineRegistry::new(config.slot_acquire_timeout()));

        let metrics_service = Arc::new(MetricsService::new().map_err(|err| anyhow::anyhow!(err))?);
        let metrics_endpoint = MetricsEndpoint::new(metrics_service.clone(), bind_address.clone());
        let metrics_handle = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                tokio::select! {
                    result = metrics_endpoint.start() => {
                        if let Err(err) = result {
                            error!(%err, "metrics endpoint stopped");
                        }
                    }
                    _ = shutdown.cancelled() => {
                        info!("metrics endpoint shutting down");
                    }
                }
            })
        };

        let janitor = Arc::new(SequenceJanitor::new(config.sequence_idle_timeout(), config.sequence_sweep_interval()));
        let janitor_handle = janitor.clone().spawn();

        info!(%bind_address, "inference engine serving");

        let mut interval = tokio::time::interval(config_source.poll_interval());
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(err) = self.poll_and_apply(&config_source, &model_registry, &pipeline_registry).await {
                        error!(%err, "config poll failed, retrying next interval");
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("serve loop received shutdown signal");
                    break;
                }
            }
        }

        janitor_handle.abort();
        metrics_handle.abort();
        Ok(())
    }

    async fn poll_and_apply(
        &self,
        config_source: &FileConfigSource,
        model_registry: &Arc<ModelRegistry>,
        pipeline_registry: &Arc<PipelineRegistry>,
    ) -> Result<()> {
        let engine_config = config_source.poll().await?;

        // Models subscribed by a still-live pipeline, computed before this poll's
        // model pass - a requests_dynamic_params entry also in this set is
        // deferred rather than applied (§4.6's registry-side gating).
        let subscribed = pipeline_registry.referenced_models();
        let model_diff = model_registry.apply_config(&engine_config.models, &subscribed).await?;
        if !model_diff.is_empty() {
            info!(
                started = model_diff.start.len(),
                reloaded = model_diff.reload.len(),
                retired = model_diff.retire.len(),
                "applied model config"
            );
        }

        for name in model_diff.start.iter().chain(model_diff.reload.iter()).chain(model_diff.retire.iter()) {
            pipeline_registry.on_model_changed(name, model_registry.as_ref());
        }

        let pipeline_diff = pipeline_registry.apply_config(&engine_config.pipelines, model_registry.as_ref());
        if !pipeline_diff.is_empty() {
            info!(
                created = pipeline_diff.create.len(),
                reloaded = pipeline_diff.reload.len(),
                retired = pipeline_diff.retire.len(),
                "applied pipeline config"
            );
        }

        if engine_config.models.is_empty() && engine_config.pipelines.is_empty() {
            warn!("polled configuration has no models or pipelines configured");
        }

        Ok(())
    }
}

impl Default for ServeUseCase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_engine_bootstrap::shutdown::ShutdownCoordinator;
    use crate::infrastructure::config::{init_runtime_config, RuntimeConfig};

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("inference_engine_serve_test_{}_{name}", std::process::id()))
    }

    #[tokio::test]
    async fn shutdown_token_stops_the_serve_loop() {
        let _ = init_runtime_config(RuntimeConfig { config_poll_interval_secs: 1, ..Default::default() });

        let path = scratch_path("empty.yaml");
        std::fs::write(&path, "models: []\npipelines: []\ncustom_loaders: []\n").unwrap();

        let use_case = ServeUseCase::new();
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(1));
        let token = coordinator.token();
        let token_clone = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token_clone.cancel();
        });

        let result = tokio::time::timeout(Duration::from_secs(5), use_case.execute(path.clone(), Some("127.0.0.1:0".to_string()), token)).await;
        assert!(result.is_ok());
        let _ = std::fs::remove_file(&path);
    }
}
