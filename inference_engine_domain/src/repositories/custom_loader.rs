// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Custom-loader plugin ABI (§6, supplemented from original_source/)
//!
//! Custom loaders are opaque native plugins that resolve a model version to
//! a local path (or veto it) independent of the default filesystem-layout
//! convention. The registry is process-wide per the "global registries"
//! design note (§9); the engine crate owns the concrete plugin-loading
//! mechanism (dlopen or a statically linked table).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::repositories::config_source::CustomLoaderEntry;
use crate::value_objects::{ModelName, ModelVersion};
use crate::EngineError;

/// One loaded plugin instance, named by `loader_name` in a
/// [`CustomLoaderEntry`].
pub trait CustomLoader: Send + Sync {
    /// Resolves `(model_name, version)` to a local path, or rejects the
    /// version entirely (the plugin may veto versions the default filesystem
    /// layout would otherwise have offered).
    fn resolve_version(&self, model_name: &ModelName, version: ModelVersion) -> Result<String, EngineError>;
}

/// Process-wide table of named custom loaders (§9 "global registries" note).
pub trait CustomLoaderRegistry: Send + Sync {
    fn register(&self, entry: &CustomLoaderEntry, loader: Arc<dyn CustomLoader>) -> Result<(), EngineError>;
    fn get(&self, loader_name: &str) -> Option<Arc<dyn CustomLoader>>;
    fn unregister(&self, loader_name: &str);
}

/// Default in-process [`CustomLoaderRegistry`]. The engine crate decides how
/// plugins are actually opened (dlopen, a statically linked table, or - for
/// tests - a hand-built [`CustomLoader`]); this registry just tracks what's
/// named.
#[derive(Default)]
pub struct InMemoryCustomLoaderRegistry {
    loaders: RwLock<HashMap<String, Arc<dyn CustomLoader>>>,
}

impl InMemoryCustomLoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CustomLoaderRegistry for InMemoryCustomLoaderRegistry {
    fn register(&self, entry: &CustomLoaderEntry, loader: Arc<dyn CustomLoader>) -> Result<(), EngineError> {
        let mut loaders = self.loaders.write().unwrap();
        if loaders.contains_key(&entry.loader_name) {
            return Err(EngineError::InvalidConfiguration(format!(
                "custom loader '{}' already registered",
                entry.loader_name
            )));
        }
        loaders.insert(entry.loader_name.clone(), loader);
        Ok(())
    }

    fn get(&self, loader_name: &str) -> Option<Arc<dyn CustomLoader>> {
        self.loaders.read().unwrap().get(loader_name).cloned()
    }

    fn unregister(&self, loader_name: &str) {
        self.loaders.write().unwrap().remove(loader_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubLoader;

    impl CustomLoader for StubLoader {
        fn resolve_version(&self, _model_name: &ModelName, _version: ModelVersion) -> Result<String, EngineError> {
            Ok("/staged/path".to_string())
        }
    }

    fn entry(name: &str) -> CustomLoaderEntry {
        CustomLoaderEntry { loader_name: name.to_string(), library_path: String::new(), config_file: String::new() }
    }

    #[test]
    fn registers_and_resolves_a_loader() {
        let registry = InMemoryCustomLoaderRegistry::new();
        registry.register(&entry("ocv"), Arc::new(StubLoader)).unwrap();
        assert!(registry.get("ocv").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = InMemoryCustomLoaderRegistry::new();
        registry.register(&entry("ocv"), Arc::new(StubLoader)).unwrap();
        assert!(registry.register(&entry("ocv"), Arc::new(StubLoader)).is_err());
    }

    #[test]
    fn unregister_removes_the_loader() {
        let registry = InMemoryCustomLoaderRegistry::new();
        registry.register(&entry("ocv"), Arc::new(StubLoader)).unwrap();
        registry.unregister("ocv");
        assert!(registry.get("ocv").is_none());
    }
}
