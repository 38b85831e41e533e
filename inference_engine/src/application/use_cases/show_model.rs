// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Show-model use case
//!
//! `model_server show-model <name> <file>`: parses the config file, finds
//! the named model entry, discovers its on-disk version directories through
//! the same [`LocalFileSystemAdapter`] a running [`ModelRegistry`] would use,
//! and reports which versions its [`VersionPolicy`] would select. One-shot;
//! does not compile anything through a backend, so it carries no load
//! status (that only exists once a live registry has run `apply_config`).
//!
//! [`ModelRegistry`]: crate::application::services::model_registry::ModelRegistry

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use inference_engine_domain::repositories::filesystem_adapter::FileSystemAdapter;

use crate::application::use_cases::validate_config::load_engine_config;
use crate::infrastructure::repositories::filesystem_adapter::LocalFileSystemAdapter;

pub struct ShowModelUseCase;

impl ShowModelUseCase {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(&self, model_name: String, config_path: PathBuf) -> Result<()> {
        info!(model = %model_name, path = %config_path.display(), "showing model");

        let engine_config = load_engine_config(&config_path).await?;
        let entry = engine_config
            .models
            .iter()
            .find(|m| m.name.as_str() == model_name)
            .ok_or_else(|| anyhow::anyhow!("model '{model_name}' not found in '{}'", config_path.display()))?;

        println!("\n=== Model '{}' ===", entry.name);
        println!("Base path: {}", entry.base_path);
        println!("Device: {}", entry.device);
        println!("Batch: {:?}", entry.batch);
        println!("Nireq: {}", entry.nireq.get());
        println!("Stateful: {}", entry.stateful);
        println!("Version policy: {:?}", entry.version_policy);

        let fs = LocalFileSystemAdapter::new();
        let discovered: std::collections::BTreeSet<_> = fs
            .list_subdirs(&entry.base_path)
            .await?
            .iter()
            .filter_map(|s| s.parse::<u64>().ok())
            .map(inference_engine_domain::value_objects::ModelVersion::new)
            .collect();
        let selected = entry.version_policy.apply(&discovered);

        println!("\nDiscovered versions: {}", discovered.iter().map(|v| v.get().to_string()).collect::<Vec<_>>().join(", "));
        println!("Selected by policy:  {}", selected.iter().map(|v| v.get().to_string()).collect::<Vec<_>>().join(", "));

        Ok(())
    }
}

impl Default for ShowModelUseCase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("inference_engine_show_model_test_{}_{name}", std::process::id()))
    }

    #[tokio::test]
    async fn unknown_model_name_is_an_error() {
        let path = scratch_path("empty.yaml");
        std::fs::write(&path, "models: []\npipelines: []\ncustom_loaders: []\n").unwrap();
        let use_case = ShowModelUseCase::new();
        assert!(use_case.execute("nope".to_string(), path.clone()).await.is_err());
        let _ = std::fs::remove_file(&path);
    }
}
