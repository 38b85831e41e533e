// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ModelRegistry reload diff (C6, §4.6)
//!
//! Pure function: given the currently-served config set and a freshly
//! polled one, compute the start/reload/retire sets. The registry that
//! applies this diff (serially per model, concurrently across models) lives
//! in the engine crate; this is deliberately side-effect free so it can be
//! unit-tested and re-run idempotently (§8 property 5).

use std::collections::{BTreeMap, BTreeSet};

use crate::repositories::config_source::ModelConfigEntry;
use crate::value_objects::ModelName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDiff {
    pub start: BTreeSet<ModelName>,
    pub reload: BTreeSet<ModelName>,
    pub retire: BTreeSet<ModelName>,
}

impl ModelDiff {
    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.reload.is_empty() && self.retire.is_empty()
    }
}

/// `current`/`requested` are keyed by name; only one config per name is
/// meaningful because a model's registration is its name (distinct versions
/// are handled inside `Model::apply_versions`, not at this layer).
pub fn diff_models(
    current: &BTreeMap<ModelName, ModelConfigEntry>,
    requested: &BTreeMap<ModelName, ModelConfigEntry>,
) -> ModelDiff {
    let current_names: BTreeSet<ModelName> = current.keys().cloned().collect();
    let requested_names: BTreeSet<ModelName> = requested.keys().cloned().collect();

    let start = requested_names.difference(&current_names).cloned().collect();
    let retire = current_names.difference(&requested_names).cloned().collect();
    let reload = current_names
        .intersection(&requested_names)
        .filter(|name| {
            let a = &current[name];
            let b = &requested[name];
            shape_affecting_changed(a, b)
        })
        .cloned()
        .collect();

    ModelDiff { start, reload, retire }
}

fn shape_affecting_changed(a: &ModelConfigEntry, b: &ModelConfigEntry) -> bool {
    a.base_path != b.base_path
        || a.device != b.device
        || a.batch != b.batch
        || a.shape_overrides != b.shape_overrides
        || a.layout_overrides != b.layout_overrides
        || a.plugin_config != b.plugin_config
        || a.version_policy != b.version_policy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::backend::BatchMode;
    use crate::value_objects::{Nireq, VersionPolicy};

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

    #[test]
    fn unchanged_config_yields_empty_diff() {
        let mut map = BTreeMap::new();
        map.insert(ModelName::new("dummy").unwrap(), entry("/models/dummy"));
        let diff = diff_models(&map, &map.clone());
        assert!(diff.is_empty());
    }

    #[test]
    fn new_entry_is_a_start() {
        let current = BTreeMap::new();
        let mut requested = BTreeMap::new();
        requested.insert(ModelName::new("dummy").unwrap(), entry("/models/dummy"));
        let diff = diff_models(&current, &requested);
        assert_eq!(diff.start.len(), 1);
        assert!(diff.reload.is_empty());
        assert!(diff.retire.is_empty());
    }

    #[test]
    fn removed_entry_is_a_retire() {
        let mut current = BTreeMap::new();
        current.insert(ModelName::new("dummy").unwrap(), entry("/models/dummy"));
        let requested = BTreeMap::new();
        let diff = diff_models(&current, &requested);
        assert_eq!(diff.retire.len(), 1);
    }

    #[test]
    fn changed_base_path_is_a_reload() {
        let mut current = BTreeMap::new();
        current.insert(ModelName::new("dummy").unwrap(), entry("/models/dummy/1"));
        let mut requested = BTreeMap::new();
        requested.insert(ModelName::new("dummy").unwrap(), entry("/models/dummy/2"));
        let diff = diff_models(&current, &requested);
        assert_eq!(diff.reload.len(), 1);
    }
}
