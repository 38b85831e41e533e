// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File-backed config source (§6)
//!
//! Polls a single YAML/TOML/JSON file on disk, re-parsing it on every
//! `poll()` call. The caller (the application layer's registry services)
//! decides what to do with a changed snapshot; this adapter has no notion of
//! diffing.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use inference_engine_domain::repositories::config_source::{ConfigSource, EngineConfig};
use inference_engine_domain::EngineError;

pub struct FileConfigSource {
    path: PathBuf,
    poll_interval: Duration,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self { path: path.into(), poll_interval }
    }
}

#[async_trait]
impl ConfigSource for FileConfigSource {
    async fn poll(&self) -> Result<EngineConfig, EngineError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            config::Config::builder()
                .add_source(config::File::from(path.clone()))
                .build()
                .map_err(|err| EngineError::InvalidConfiguration(format!("loading '{}': {err}", path.display())))?
                .try_deserialize::<EngineConfig>()
                .map_err(|err| EngineError::InvalidConfiguration(format!("parsing '{}': {err}", path.display())))
        })
        .await
        .map_err(|err| EngineError::internal_error(format!("config poll task panicked: {err}")))?
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("inference_engine_config_source_test_{}_{name}", std::process::id()))
    }

    #[tokio::test]
    async fn polls_a_minimal_yaml_config() {
        let path = scratch_path("minimal.yaml");
        std::fs::write(&path, "models: []\npipelines: []\ncustom_loaders: []\n").unwrap();
        let source = FileConfigSource::new(&path, Duration::from_secs(1));
        let config = source.poll().await.unwrap();
        assert!(config.models.is_empty());
        assert_eq!(source.poll_interval(), Duration::from_secs(1));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_file_is_a_configuration_error() {
        let source = FileConfigSource::new("/does/not/exist.yaml", Duration::from_secs(1));
        assert!(matches!(source.poll().await, Err(EngineError::InvalidConfiguration(_))));
    }
}
