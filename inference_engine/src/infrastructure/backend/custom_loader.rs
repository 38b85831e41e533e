// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Custom-loader-backed backend
//!
//! Wraps a [`BackendRuntime`] so model staging is resolved through a named
//! [`CustomLoader`] instead of the default filesystem layout, the way a
//! config entry naming a `custom_loader_config` routes a model version
//! through a plugin before compilation. The dynamic-library ABI itself is
//! out of scope; [`NoopCustomLoader`] is the stand-in that always defers to
//! the path already on the config.

use async_trait::async_trait;
use inference_engine_domain::repositories::backend::{BackendConfig, BackendModel, BackendRuntime};
use inference_engine_domain::repositories::custom_loader::{CustomLoader, CustomLoaderRegistry};
use inference_engine_domain::value_objects::{ModelName, ModelVersion};
use inference_engine_domain::EngineError;

/// A [`CustomLoader`] that performs no resolution of its own; it passes the
/// config's `base_path` straight through. Exists so a configured
/// `custom_loader` entry with no matching native plugin still loads.
pub struct NoopCustomLoader;

impl CustomLoader for NoopCustomLoader {
    fn resolve_version(&self, _model_name: &ModelName, _version: ModelVersion) -> Result<String, EngineError> {
        Err(EngineError::InvalidConfiguration(
            "NoopCustomLoader does not resolve versions; register a real loader or omit custom_loader_config".to_string(),
        ))
    }
}

/// Resolves a model version's staged path through a named [`CustomLoader`]
/// before delegating compilation to `inner`.
pub struct CustomLoaderBackend {
    registry: std::sync::Arc<dyn CustomLoaderRegistry>,
    loader_name: String,
    model_name: ModelName,
    version: ModelVersion,
    inner: Box<dyn BackendRuntime>,
}

impl CustomLoaderBackend {
    pub fn new(
        registry: std::sync::Arc<dyn CustomLoaderRegistry>,
        loader_name: impl Into<String>,
        model_name: ModelName,
        version: ModelVersion,
        inner: Box<dyn BackendRuntime>,
    ) -> Self {
        Self { registry, loader_name: loader_name.into(), model_name, version, inner }
    }
}

#[async_trait]
impl BackendRuntime for CustomLoaderBackend {
    async fn load(&self, config: &BackendConfig) -> Result<Box<dyn BackendModel>, EngineError> {
        let loader = self.registry.get(&self.loader_name).ok_or_else(|| {
            EngineError::InvalidConfiguration(format!("custom loader '{}' is not registered", self.loader_name))
        })?;
        let staged_path = loader.resolve_version(&self.model_name, self.version)?;
        let mut config = config.clone();
        config.base_path = staged_path;
        self.inner.load(&config).await
    }
}
