// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ModelRegistry (C6, §4.6)
//!
//! Owns every live [`Model`] and drives the start/reload/retire side effects
//! [`diff_models`] decides on. Discovers the on-disk version set through a
//! [`FileSystemAdapter`], filters it through each entry's `VersionPolicy`,
//! then loads/reloads/retires individual [`ModelInstance`]s to match.
//!
//! Also implements [`ModelCatalog`] (so [`PipelineDefinition::validate`] can
//! query live models without a back-reference) and
//! [`ModelLookup`] (so the executor loop can resolve a DL node's binding).

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use inference_engine_domain::aggregates::{Model, ModelCatalog, ModelInstance};
use inference_engine_domain::entities::ModelVersionStatus;
use inference_engine_domain::repositories::backend::{BackendConfig, BackendRuntime, ShapeMode};
use inference_engine_domain::repositories::config_source::ModelConfigEntry;
use inference_engine_domain::repositories::filesystem_adapter::FileSystemAdapter;
use inference_engine_domain::repositories::slot_pool::SlotPoolFactory;
use inference_engine_domain::services::{diff_models, ModelDiff};
use inference_engine_domain::value_objects::{ModelName, ModelVersion, TensorInfo};
use inference_engine_domain::EngineError;
use parking_lot::{Mutex, RwLock};

#[derive(Debug, Clone)]
pub struct ModelVersionSummary {
    pub version: ModelVersion,
    pub status: ModelVersionStatus,
    pub in_flight: u64,
}

pub struct ModelRegistry {
    models: RwLock<BTreeMap<ModelName, Arc<Model>>>,
    current_config: Mutex<BTreeMap<ModelName, ModelConfigEntry>>,
    fs: Arc<dyn FileSystemAdapter>,
    backend: Arc<dyn BackendRuntime>,
    slot_factory: Arc<dyn SlotPoolFactory>,
}

impl ModelRegistry {
    pub fn new(
        fs: Arc<dyn FileSystemAdapter>,
        backend: Arc<dyn BackendRuntime>,
        slot_factory: Arc<dyn SlotPoolFactory>,
    ) -> Self {
        Self { models: RwLock::new(BTreeMap::new()), current_config: Mutex::new(BTreeMap::new()), fs, backend, slot_factory }
    }

    /// Applies a freshly polled model config set (§4.6), returning the diff
    /// that was actually acted on so the caller can re-validate dependent
    /// pipelines.
    ///
    /// `subscribed_models` is the set of model names a live (non-retired)
    /// pipeline currently references (`PipelineRegistry::referenced_models`).
    /// A start/reload entry that both `requests_dynamic_params` and appears
    /// in that set is deferred rather than applied — §4.6 makes this gating
    /// the registry's responsibility, not `PipelineDefinition::validate`'s.
    /// A deferred entry is left out of the recorded config, so it reappears
    /// in `diff_models`'s start/reload sets on the next poll and is retried
    /// once the pipeline pass has had a chance to drop the subscription.
    #[tracing::instrument(skip(self, requested, subscribed_models))]
    pub async fn apply_config(
        &self,
        requested: &[ModelConfigEntry],
        subscribed_models: &BTreeSet<ModelName>,
    ) -> Result<ModelDiff, EngineError> {
        let requested_map: BTreeMap<ModelName, ModelConfigEntry> =
            requested.iter().map(|e| (e.name.clone(), e.clone())).collect();
        let current_map = self.current_config.lock().clone();
        let diff = diff_models(&current_map, &requested_map);

        let mut applied_map = current_map.clone();
        let mut applied = ModelDiff { start: BTreeSet::new(), reload: BTreeSet::new(), retire: diff.retire.clone() };

        // Every requested model is reconciled every poll, not just ones whose
        // top-level entry changed: §4.5/§4.6 reconcile each model's version
        // set (discovered-on-disk ∩ version policy) per poll, and a new
        // version can appear under an unchanged base_path without its entry
        // ever landing in `diff.start`/`diff.reload`.
        for (name, entry) in requested_map.iter() {
            let is_start_or_reload = diff.start.contains(name) || diff.reload.contains(name);
            if is_start_or_reload && self.requests_dynamic_params_locked(entry) && subscribed_models.contains(name) {
                tracing::warn!(
                    model = %name,
                    error = %EngineError::RequestedDynamicParametersOnSubscribedModel(name.to_string()),
                    "deferring model apply: requests dynamic params while referenced by a live pipeline"
                );
                continue;
            }

            // One entry's failure must not block its siblings, and must not
            // leave them stuck reapplying every subsequent poll: record
            // success into `applied_map` per entry rather than only once the
            // whole loop finishes, and skip (not abort) a failing one.
            if let Err(err) = self.apply_model_entry(entry, is_start_or_reload).await {
                tracing::warn!(model = %name, %err, "model apply failed, leaving previous state in place");
                continue;
            }
            applied_map.insert(name.clone(), entry.clone());
            if diff.start.contains(name) {
                applied.start.insert(name.clone());
            } else if diff.reload.contains(name) {
                applied.reload.insert(name.clone());
            }
        }

        for name in &diff.retire {
            if let Some(model) = self.models.read().get(name).cloned() {
                let mut retire_failed = false;
                for version in model.versions() {
                    if let Err(err) = self.retire_instance(model.clone(), version).await {
                        tracing::warn!(model = %name, %version, %err, "model retire failed, leaving it in current_config");
                        retire_failed = true;
                    }
                }
                if retire_failed {
                    continue;
                }
            }
            applied_map.remove(name);
        }

        *self.current_config.lock() = applied_map;
        Ok(applied)
    }

    /// Reconciles one model's desired version set (discovered-on-disk ∩
    /// version policy) against what's currently registered, loading newly
    /// discovered versions and retiring dropped ones every poll. Reloading an
    /// already-loaded version only happens when `config_changed` - otherwise
    /// a model whose top-level entry is untouched between polls would still
    /// pay a full drain-and-reload every poll just for version reconciliation.
    async fn apply_model_entry(&self, entry: &ModelConfigEntry, config_changed: bool) -> Result<(), EngineError> {
        let model = {
            let mut models = self.models.write();
            models.entry(entry.name.clone()).or_insert_with(|| Arc::new(Model::new(entry.name.clone()))).clone()
        };

        let discovered = self.discover_versions(entry).await?;
        let desired = entry.version_policy.apply(&discovered);
        let existing: BTreeSet<ModelVersion> = model.versions().into_iter().collect();

        for version in desired.difference(&existing) {
            let instance = Arc::new(ModelInstance::new(entry.name.clone(), *version));
            model.register(instance.clone());
            let config = self.backend_config(entry, *version);
            instance.load(self.fs.as_ref(), self.backend.as_ref(), self.slot_factory.as_ref(), config).await?;
        }

        if config_changed {
            for version in existing.intersection(&desired) {
                if let Some(instance) = model.instance(*version) {
                    let config = self.backend_config(entry, *version);
                    self.reload_instance(instance, config).await?;
                }
            }
        }

        for version in existing.difference(&desired) {
            self.retire_instance(model.clone(), *version).await?;
        }

        Ok(())
    }

    async fn discover_versions(&self, entry: &ModelConfigEntry) -> Result<BTreeSet<ModelVersion>, EngineError> {
        let subdirs = self.fs.list_subdirs(&entry.base_path).await?;
        Ok(subdirs.iter().filter_map(|s| s.parse::<u64>().ok()).map(ModelVersion::new).collect())
    }

    fn backend_config(&self, entry: &ModelConfigEntry, version: ModelVersion) -> BackendConfig {
        let version_path = format!("{}/{}", entry.base_path.trim_end_matches('/'), version.get());
        BackendConfig {
            base_path: version_path,
            device: entry.device.clone(),
            batch: entry.batch.clone(),
            shape_overrides: entry.shape_overrides.clone(),
            layout_overrides: entry.layout_overrides.clone(),
            plugin_config: entry.plugin_config.clone(),
            nireq: entry.nireq,
        }
    }

    /// Runs `instance.reload` on a blocking-pool thread rather than inline:
    /// `reload` drains in-flight work with a blocking bounded poll (§5, §9),
    /// which would otherwise park a tokio worker for the drain window.
    async fn reload_instance(&self, instance: Arc<ModelInstance>, config: BackendConfig) -> Result<(), EngineError> {
        let fs = self.fs.clone();
        let backend = self.backend.clone();
        let slot_factory = self.slot_factory.clone();
        tokio::task::spawn_blocking(move || {
            tokio::runtime::Handle::current()
                .block_on(instance.reload(fs.as_ref(), backend.as_ref(), slot_factory.as_ref(), config))
        })
        .await
        .map_err(|e| EngineError::internal_error(e.to_string()))?
    }

    /// Same blocking-pool dispatch as [`Self::reload_instance`], for the
    /// request-triggered reshape path (`PredictUseCase`).
    pub async fn reshape_instance(
        &self,
        instance: &Arc<ModelInstance>,
        shape_overrides: BTreeMap<String, ShapeMode>,
    ) -> Result<(), EngineError> {
        let instance = instance.clone();
        let fs = self.fs.clone();
        let backend = self.backend.clone();
        let slot_factory = self.slot_factory.clone();
        tokio::task::spawn_blocking(move || {
            tokio::runtime::Handle::current()
                .block_on(instance.reshape(fs.as_ref(), backend.as_ref(), slot_factory.as_ref(), shape_overrides))
        })
        .await
        .map_err(|e| EngineError::internal_error(e.to_string()))?
    }

    /// Runs `Model::retire_version` (itself a blocking bounded-poll drain) on
    /// a blocking-pool thread for the same reason as [`Self::reload_instance`].
    async fn retire_instance(&self, model: Arc<Model>, version: ModelVersion) -> Result<(), EngineError> {
        tokio::task::spawn_blocking(move || model.retire_version(version, true))
            .await
            .map_err(|e| EngineError::internal_error(e.to_string()))
    }

    pub fn get(&self, name: &ModelName) -> Option<Arc<Model>> {
        self.models.read().get(name).cloned()
    }

    /// Per-version status, for the `show-model` CLI command.
    pub fn show(&self, name: &ModelName) -> Option<Vec<ModelVersionSummary>> {
        let model = self.models.read().get(name)?.clone();
        Some(
            model
                .versions()
                .into_iter()
                .filter_map(|v| {
                    let instance = model.instance(v)?;
                    Some(ModelVersionSummary { version: v, status: instance.status(), in_flight: instance.in_flight_count() })
                })
                .collect(),
        )
    }

    /// `(shape_auto_inputs, batch_auto)` for `name`'s current config, as
    /// `RequestValidator::validate_request` needs them. Empty/`false` for a
    /// model with no recorded config (shouldn't be reachable from a resolved
    /// `ModelInstance`, but safe either way).
    pub fn validation_params(&self, name: &ModelName) -> (Vec<String>, bool) {
        match self.current_config.lock().get(name) {
            Some(entry) => {
                let shape_auto_inputs: Vec<String> = entry
                    .shape_overrides
                    .iter()
                    .filter(|(_, mode)| matches!(mode, ShapeMode::Auto))
                    .map(|(name, _)| name.clone())
                    .collect();
                let batch_auto = matches!(entry.batch, inference_engine_domain::repositories::backend::BatchMode::Auto);
                (shape_auto_inputs, batch_auto)
            }
            None => (Vec::new(), false),
        }
    }

    /// `name`'s currently configured per-input shape overrides, as a base to
    /// merge a single reshaped input into (`ModelInstance::reshape` replaces
    /// the whole map, so siblings must be carried forward).
    pub fn shape_overrides_for(&self, name: &ModelName) -> BTreeMap<String, ShapeMode> {
        self.current_config.lock().get(name).map(|e| e.shape_overrides.clone()).unwrap_or_default()
    }

    fn requests_dynamic_params_locked(&self, entry: &ModelConfigEntry) -> bool {
        matches!(entry.batch, inference_engine_domain::repositories::backend::BatchMode::Auto)
            || entry.shape_overrides.values().any(|mode| matches!(mode, ShapeMode::Auto))
    }
}

impl ModelCatalog for ModelRegistry {
    fn has_available_version(&self, name: &ModelName) -> bool {
        self.models.read().get(name).and_then(|m| m.default_version()).is_some()
    }

    fn requests_dynamic_params(&self, name: &ModelName) -> bool {
        self.current_config.lock().get(name).map(|entry| self.requests_dynamic_params_locked(entry)).unwrap_or(false)
    }

    fn tensor_info(&self, name: &ModelName, version: ModelVersion) -> Option<(Vec<TensorInfo>, Vec<TensorInfo>)> {
        let model = self.models.read().get(name)?.clone();
        let instance = model.get(version)?;
        Some((instance.inputs(), instance.outputs()))
    }
}

impl crate::infrastructure::runtime::executor_loop::ModelLookup for ModelRegistry {
    fn resolve(&self, name: &ModelName, version: ModelVersion) -> Option<Arc<ModelInstance>> {
        self.models.read().get(name)?.get(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::backend::dummy::DummyBackend;
    use crate::infrastructure::repositories::filesystem_adapter::LocalFileSystemAdapter;
    use crate::infrastructure::runtime::slot_pool::TokioSlotPoolFactory;
    use inference_engine_domain::repositories::backend::BatchMode;
    use inference_engine_domain::value_objects::{Nireq, VersionPolicy};

    fn registry() -> ModelRegistry {
        ModelRegistry::new(Arc::new(LocalFileSystemAdapter::new()), Arc::new(DummyBackend), Arc::new(TokioSlotPoolFactory))
    }

    fn scratch_model_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("inference_engine_model_registry_test_{}", std::process::id()));
        std::fs::create_dir_all(dir.join("1")).unwrap();
        dir
    }

    fn entry(base_path: &str) -> ModelConfigEntry {
        ModelConfigEntry {
            name: ModelName::new("dummy").unwrap(),
            base_path: base_path.to_string(),
            device: "CPU".to_string(),
            batch: BatchMode::Fixed(1),
            nireq: Nireq::default(),
            shape_overrides: BTreeMap::new(),
            layout_overrides: BTreeMap::new(),
            plugin_config: BTreeMap::new(),
            version_policy: VersionPolicy::default(),
            stateful: false,
        }
    }

    #[tokio::test]
    async fn applying_a_new_entry_loads_its_default_version() {
        let dir = scratch_model_dir();
        let registry = registry();
        registry.apply_config(&[entry(dir.to_str().unwrap())], &BTreeSet::new()).await.unwrap();
        let model_name = ModelName::new("dummy").unwrap();
        assert!(registry.has_available_version(&model_name));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn an_unchanged_entry_still_discovers_a_version_added_between_polls() {
        let dir = scratch_model_dir();
        let registry = registry();
        let mut keep_all = entry(dir.to_str().unwrap());
        keep_all.version_policy = VersionPolicy::All;

        registry.apply_config(&[keep_all.clone()], &BTreeSet::new()).await.unwrap();
        let model_name = ModelName::new("dummy").unwrap();
        let versions_before: BTreeSet<_> = registry.get(&model_name).unwrap().versions().into_iter().collect();
        assert_eq!(versions_before, [ModelVersion::new(1)].into_iter().collect());

        std::fs::create_dir_all(dir.join("2")).unwrap();
        registry.apply_config(&[keep_all], &BTreeSet::new()).await.unwrap();
        let versions_after: BTreeSet<_> = registry.get(&model_name).unwrap().versions().into_iter().collect();
        assert_eq!(versions_after, [ModelVersion::new(1), ModelVersion::new(2)].into_iter().collect());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn retiring_an_entry_removes_its_availability() {
        let dir = scratch_model_dir();
        let registry = registry();
        registry.apply_config(&[entry(dir.to_str().unwrap())], &BTreeSet::new()).await.unwrap();
        registry.apply_config(&[], &BTreeSet::new()).await.unwrap();
        let model_name = ModelName::new("dummy").unwrap();
        assert!(!registry.has_available_version(&model_name));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn a_dynamic_params_entry_subscribed_by_a_pipeline_is_deferred() {
        let dir = scratch_model_dir();
        let registry = registry();
        let mut dynamic_entry = entry(dir.to_str().unwrap());
        dynamic_entry.batch = BatchMode::Auto;
        let model_name = dynamic_entry.name.clone();
        let mut subscribed = BTreeSet::new();
        subscribed.insert(model_name.clone());

        let diff = registry.apply_config(&[dynamic_entry], &subscribed).await.unwrap();
        assert!(diff.start.is_empty());
        assert!(!registry.has_available_version(&model_name));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn the_same_entry_applies_once_no_longer_subscribed() {
        let dir = scratch_model_dir();
        let registry = registry();
        let mut dynamic_entry = entry(dir.to_str().unwrap());
        dynamic_entry.batch = BatchMode::Auto;
        let model_name = dynamic_entry.name.clone();
        let mut subscribed = BTreeSet::new();
        subscribed.insert(model_name.clone());

        registry.apply_config(&[dynamic_entry.clone()], &subscribed).await.unwrap();
        assert!(!registry.has_available_version(&model_name));

        let diff = registry.apply_config(&[dynamic_entry], &BTreeSet::new()).await.unwrap();
        assert_eq!(diff.start.len(), 1);
        assert!(registry.has_available_version(&model_name));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
