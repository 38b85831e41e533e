// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # PipelineRegistry (C10, §4.10)
//!
//! Owns every live [`PipelineDefinition`], applies polled config through
//! [`diff_pipelines`], and re-validates definitions that reference a model
//! whose availability just changed (`on_model_changed`). Reloaded/retired
//! definitions stay in the map under RETIRED/new status rather than being
//! dropped, mirroring [`Model::retire_version`]'s "entry survives its
//! instance" rule — in-flight [`Pipeline`]s built from a retired definition
//! hold their own node snapshot and are unaffected (I5).

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use inference_engine_domain::aggregates::{ModelCatalog, Pipeline, PipelineDefinition};
use inference_engine_domain::entities::PipelineDefinitionStatus;
use inference_engine_domain::repositories::config_source::PipelineConfigEntry;
use inference_engine_domain::services::{diff_pipelines, PipelineDiff};
use inference_engine_domain::value_objects::{ModelName, PipelineName};
use inference_engine_domain::EngineError;
use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub name: PipelineName,
    pub status: PipelineDefinitionStatus,
    pub node_count: usize,
}

pub struct PipelineRegistry {
    definitions: RwLock<BTreeMap<PipelineName, Arc<PipelineDefinition>>>,
    current_config: Mutex<BTreeMap<PipelineName, PipelineConfigEntry>>,
    create_deadline: Duration,
}

impl PipelineRegistry {
    pub fn new(create_deadline: Duration) -> Self {
        Self { definitions: RwLock::new(BTreeMap::new()), current_config: Mutex::new(BTreeMap::new()), create_deadline }
    }

    /// Applies a freshly polled pipeline config set against a model catalog
    /// (§4.10), validating each created/reloaded definition immediately.
    /// Validation failures do not abort the apply — they leave that one
    /// definition in LOADING_PRECONDITION_FAILED, same as an individual
    /// model load failure does not block its siblings.
    #[tracing::instrument(skip(self, requested, catalog))]
    pub fn apply_config(&self, requested: &[PipelineConfigEntry], catalog: &dyn ModelCatalog) -> PipelineDiff {
        let requested_map: BTreeMap<PipelineName, PipelineConfigEntry> =
            requested.iter().map(|e| (e.name.clone(), e.clone())).collect();
        let current_map = self.current_config.lock().clone();
        let diff = diff_pipelines(&current_map, &requested_map);

        for name in diff.create.iter().chain(diff.reload.iter()) {
            let entry = &requested_map[name];
            let definition = Arc::new(PipelineDefinition::new(entry.name.clone(), entry.nodes.clone(), entry.connections.clone()));
            let _ = definition.validate(catalog);
            self.definitions.write().insert(name.clone(), definition);
        }
        for name in &diff.retire {
            if let Some(definition) = self.definitions.read().get(name).cloned() {
                definition.retire();
            }
        }

        *self.current_config.lock() = requested_map;
        diff
    }

    /// Re-validates every definition that references `model_name` (§4.9
    /// `UsedModelChanged`), called after [`ModelRegistry::apply_config`]
    /// reports a start/reload/retire for that model.
    ///
    /// [`ModelRegistry::apply_config`]: super::model_registry::ModelRegistry::apply_config
    #[tracing::instrument(skip(self, catalog))]
    pub fn on_model_changed(&self, model_name: &ModelName, catalog: &dyn ModelCatalog) {
        let affected: Vec<Arc<PipelineDefinition>> = self
            .definitions
            .read()
            .values()
            .filter(|def| def.nodes().iter().any(|n| n.model_name.as_ref() == Some(model_name)))
            .cloned()
            .collect();

        for definition in affected {
            if definition.status() == PipelineDefinitionStatus::Retired {
                continue;
            }
            definition.on_used_model_changed();
            let _ = definition.validate(catalog);
        }
    }

    /// Blocks up to the registry's create deadline for `name` to leave a
    /// transient validation state, then builds a fresh [`Pipeline`] instance.
    pub fn create_pipeline(&self, name: &PipelineName) -> Result<Pipeline, EngineError> {
        let definition = self
            .definitions
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::PipelineDefinitionNotLoadedAnymore(name.to_string()))?;
        definition.create(self.create_deadline)
    }

    pub fn get(&self, name: &PipelineName) -> Option<Arc<PipelineDefinition>> {
        self.definitions.read().get(name).cloned()
    }

    /// Status summary for the `show-pipeline` CLI command.
    pub fn show(&self, name: &PipelineName) -> Option<PipelineSummary> {
        let definition = self.definitions.read().get(name)?.clone();
        Some(PipelineSummary { name: definition.name().clone(), status: definition.status(), node_count: definition.nodes().len() })
    }

    /// Every model name referenced by a non-retired definition (§4.6): the
    /// "subscribed" set `ModelRegistry::apply_config` gates
    /// `requests_dynamic_params` entries against. Computed from the
    /// pre-this-poll live state, so it reflects the pipeline pass as it
    /// stood before the current model-config poll is applied.
    pub fn referenced_models(&self) -> std::collections::BTreeSet<ModelName> {
        self.definitions
            .read()
            .values()
            .filter(|def| def.status() != PipelineDefinitionStatus::Retired)
            .flat_map(|def| def.nodes().iter().filter_map(|n| n.model_name.clone()).collect::<Vec<_>>())
            .collect()
    }
}

/// Lightweight [`ModelCatalog`] for one-shot CLI validation (`validate-config`,
/// `show-pipeline`) that has no live, backend-loaded [`ModelRegistry`] to
/// query. Reports every configured model as available with no tensor
/// metadata, which `PipelineDefinition::validate_inner` treats as "skip the
/// input-completeness and shape-intersection checks" rather than an error —
/// so structural DAG validation still runs without a running backend.
///
/// [`ModelRegistry`]: super::model_registry::ModelRegistry
pub struct ConfiguredModelCatalog {
    models: std::collections::BTreeSet<ModelName>,
}

impl ConfiguredModelCatalog {
    pub fn new(entries: &[inference_engine_domain::repositories::config_source::ModelConfigEntry]) -> Self {
        Self { models: entries.iter().map(|e| e.name.clone()).collect() }
    }
}

impl ModelCatalog for ConfiguredModelCatalog {
    fn has_available_version(&self, name: &ModelName) -> bool {
        self.models.contains(name)
    }

    fn requests_dynamic_params(&self, _name: &ModelName) -> bool {
        false
    }

    fn tensor_info(
        &self,
        _name: &ModelName,
        _version: inference_engine_domain::value_objects::ModelVersion,
    ) -> Option<(Vec<inference_engine_domain::value_objects::TensorInfo>, Vec<inference_engine_domain::value_objects::TensorInfo>)> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_engine_domain::entities::NodeInfo;
    use inference_engine_domain::value_objects::NodeName;

    fn linear_entry(name: &str) -> PipelineConfigEntry {
        PipelineConfigEntry {
            name: PipelineName::new(name).unwrap(),
            inputs: vec!["x".to_string()],
            nodes: vec![NodeInfo::entry(NodeName::new("e").unwrap()), NodeInfo::exit(NodeName::new("x").unwrap())],
            connections: vec![inference_engine_domain::entities::Connection {
                to_node: NodeName::new("x").unwrap(),
                from_node: NodeName::new("e").unwrap(),
                from_output: "a".to_string(),
                to_input: "b".to_string(),
            }],
            outputs: vec![],
        }
    }

    #[test]
    fn applying_a_valid_entry_makes_it_creatable() {
        let registry = PipelineRegistry::new(Duration::from_millis(50));
        let catalog = ConfiguredModelCatalog::new(&[]);
        registry.apply_config(&[linear_entry("p")], &catalog);
        let pipeline_name = PipelineName::new("p").unwrap();
        assert!(registry.create_pipeline(&pipeline_name).is_ok());
    }

    #[test]
    fn retiring_an_entry_blocks_further_creation() {
        let registry = PipelineRegistry::new(Duration::from_millis(50));
        let catalog = ConfiguredModelCatalog::new(&[]);
        registry.apply_config(&[linear_entry("p")], &catalog);
        registry.apply_config(&[], &catalog);
        let pipeline_name = PipelineName::new("p").unwrap();
        assert!(registry.create_pipeline(&pipeline_name).is_err());
    }
}
