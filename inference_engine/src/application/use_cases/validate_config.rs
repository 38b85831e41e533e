// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Validate-config use case
//!
//! `model_server validate-config <file>`: parses the file as an
//! [`EngineConfig`] and structurally validates every pipeline entry against
//! a [`ConfiguredModelCatalog`], without starting a backend or touching the
//! filesystem model directories. Reports every pipeline's validation
//! outcome rather than stopping at the first failure, so one bad entry
//! doesn't hide problems in the rest.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use inference_engine_domain::aggregates::PipelineDefinition;
use inference_engine_domain::repositories::config_source::EngineConfig;

use crate::application::services::pipeline_registry::ConfiguredModelCatalog;

pub struct ValidateConfigUseCase;

impl ValidateConfigUseCase {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(&self, config_path: PathBuf) -> Result<()> {
        info!(path = %config_path.display(), "validating configuration");

        let engine_config = load_engine_config(&config_path).await?;
        println!("Configuration: {}", config_path.display());
        println!("  {} model(s), {} pipeline(s), {} custom loader(s)",
            engine_config.models.len(), engine_config.pipelines.len(), engine_config.custom_loaders.len());

        let catalog = ConfiguredModelCatalog::new(&engine_config.models);
        let mut failures = 0usize;

        for entry in &engine_config.pipelines {
            let definition = PipelineDefinition::new(entry.name.clone(), entry.nodes.clone(), entry.connections.clone());
            match definition.validate(&catalog) {
                Ok(()) => println!("  pipeline '{}': OK", entry.name),
                Err(err) => {
                    failures += 1;
                    println!("  pipeline '{}': INVALID - {}", entry.name, err);
                }
            }
        }

        if failures > 0 {
            anyhow::bail!("{failures} of {} pipeline(s) failed validation", engine_config.pipelines.len());
        }

        println!("\nconfiguration is valid");
        Ok(())
    }
}

impl Default for ValidateConfigUseCase {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a YAML/TOML/JSON file into an [`EngineConfig`] on a blocking
/// thread, same parsing path as [`crate::infrastructure::repositories::config_source::FileConfigSource`]
/// but a single one-shot read rather than a poll loop.
pub(crate) async fn load_engine_config(path: &Path) -> Result<EngineConfig> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        config::Config::builder()
            .add_source(config::File::from(path.clone()))
            .build()
            .map_err(|err| anyhow::anyhow!("loading '{}': {err}", path.display()))?
            .try_deserialize::<EngineConfig>()
            .map_err(|err| anyhow::anyhow!("parsing '{}': {err}", path.display()))
    })
    .await
    .map_err(|err| anyhow::anyhow!("config load task panicked: {err}"))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("inference_engine_validate_config_test_{}_{name}", std::process::id()))
    }

    #[tokio::test]
    async fn empty_config_is_valid() {
        let path = scratch_path("empty.yaml");
        std::fs::write(&path, "models: []\npipelines: []\ncustom_loaders: []\n").unwrap();
        let use_case = ValidateConfigUseCase::new();
        assert!(use_case.execute(path.clone()).await.is_ok());
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let use_case = ValidateConfigUseCase::new();
        assert!(use_case.execute(PathBuf::from("/does/not/exist.yaml")).await.is_err());
    }

    #[tokio::test]
    async fn pipeline_with_no_exit_node_fails_validation() {
        let path = scratch_path("bad_pipeline.yaml");
        std::fs::write(
            &path,
            "models: []\npipelines:\n  - name: p\n    inputs: [x]\n    nodes:\n      - kind: Entry\n        name: e\n        model_name: null\n        model_version: null\n        output_aliases: {}\n        demultiply_count: null\n        gather_from: null\n    connections: []\n    outputs: []\ncustom_loaders: []\n",
        )
        .unwrap();
        let use_case = ValidateConfigUseCase::new();
        assert!(use_case.execute(path.clone()).await.is_err());
        let _ = std::fs::remove_file(&path);
    }
}
