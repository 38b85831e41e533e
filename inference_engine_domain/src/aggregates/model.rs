// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Model (C5)
//!
//! All versions of one name (§4.5): a map `version -> ModelInstance`, a
//! version-policy filter, and default-version election (numerically
//! greatest AVAILABLE version).

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::aggregates::model_instance::ModelInstance;
use crate::entities::ModelVersionStatus;
use crate::value_objects::{ModelName, ModelVersion};

pub struct Model {
    name: ModelName,
    versions: RwLock<BTreeMap<ModelVersion, Arc<ModelInstance>>>,
}

impl Model {
    pub fn new(name: ModelName) -> Self {
        Self { name, versions: RwLock::new(BTreeMap::new()) }
    }

    pub fn name(&self) -> &ModelName {
        &self.name
    }

    /// Inserts a freshly constructed instance if `version` is not already
    /// registered; the caller drives its `load()` separately (§4.6's diff
    /// only decides *which* versions to start/reload/retire, not how).
    pub fn register(&self, instance: Arc<ModelInstance>) {
        self.versions.write().unwrap().entry(instance.version()).or_insert(instance);
    }

    pub fn versions(&self) -> Vec<ModelVersion> {
        self.versions.read().unwrap().keys().copied().collect()
    }

    /// `0` means default: the numerically greatest AVAILABLE version.
    /// Returns `None` if no AVAILABLE version exists.
    pub fn get(&self, version: ModelVersion) -> Option<Arc<ModelInstance>> {
        let versions = self.versions.read().unwrap();
        if version.is_default_sentinel() {
            return self.default_version_locked(&versions);
        }
        versions.get(&version).filter(|i| i.status() == ModelVersionStatus::Available).cloned()
    }

    pub fn default_version(&self) -> Option<ModelVersion> {
        self.default_version_locked(&self.versions.read().unwrap()).map(|i| i.version())
    }

    /// Unfiltered accessor: returns the instance regardless of status, for
    /// callers (the engine's model registry) that need to drive a
    /// `load`/`reload`/`retire` transition rather than serve inference.
    pub fn instance(&self, version: ModelVersion) -> Option<Arc<ModelInstance>> {
        self.versions.read().unwrap().get(&version).cloned()
    }

    fn default_version_locked(
        &self,
        versions: &BTreeMap<ModelVersion, Arc<ModelInstance>>,
    ) -> Option<Arc<ModelInstance>> {
        versions
            .values()
            .filter(|i| i.status() == ModelVersionStatus::Available)
            .max_by_key(|i| i.version())
            .cloned()
    }

    /// A retired version stays in the map with status END until its config
    /// changes again (§4.5); `retire` alone never removes the entry.
    pub fn retire_version(&self, version: ModelVersion, permanent: bool) {
        if let Some(instance) = self.versions.read().unwrap().get(&version) {
            instance.retire(permanent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_version_is_none_when_nothing_available() {
        let model = Model::new(ModelName::new("dummy").unwrap());
        model.register(Arc::new(ModelInstance::new(ModelName::new("dummy").unwrap(), ModelVersion::new(1))));
        assert_eq!(model.default_version(), None);
    }

    #[test]
    fn get_zero_resolves_default_sentinel() {
        let model = Model::new(ModelName::new("dummy").unwrap());
        model.register(Arc::new(ModelInstance::new(ModelName::new("dummy").unwrap(), ModelVersion::new(1))));
        assert!(model.get(ModelVersion::DEFAULT).is_none());
    }
}
