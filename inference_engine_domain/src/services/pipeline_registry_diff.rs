// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # PipelineRegistry reload diff (C10, §4.10)
//!
//! Same shape as [`crate::services::model_registry_diff`]: create/reload/
//! retire sets computed from the currently-registered and freshly-requested
//! pipeline configs. On reload the old definition is retired and in-flight
//! pipelines built from it continue to completion (I5); that lifecycle
//! handling belongs to the engine's `application::services::pipeline_registry`,
//! not here.

use std::collections::{BTreeMap, BTreeSet};

use crate::repositories::config_source::PipelineConfigEntry;
use crate::value_objects::PipelineName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDiff {
    pub create: BTreeSet<PipelineName>,
    pub reload: BTreeSet<PipelineName>,
    pub retire: BTreeSet<PipelineName>,
}

impl PipelineDiff {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.reload.is_empty() && self.retire.is_empty()
    }
}

pub fn diff_pipelines(
    current: &BTreeMap<PipelineName, PipelineConfigEntry>,
    requested: &BTreeMap<PipelineName, PipelineConfigEntry>,
) -> PipelineDiff {
    let current_names: BTreeSet<PipelineName> = current.keys().cloned().collect();
    let requested_names: BTreeSet<PipelineName> = requested.keys().cloned().collect();

    let create = requested_names.difference(&current_names).cloned().collect();
    let retire = current_names.difference(&requested_names).cloned().collect();
    let reload = current_names
        .intersection(&requested_names)
        .filter(|name| current[name] != requested[name])
        .cloned()
        .collect();

    PipelineDiff { create, reload, retire }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, connection_count: usize) -> PipelineConfigEntry {
        PipelineConfigEntry {
            name: PipelineName::new(name).unwrap(),
            inputs: vec!["x".to_string()],
            nodes: vec![],
            connections: vec![crate::entities::Connection {
                to_node: crate::value_objects::NodeName::new("a").unwrap(),
                from_node: crate::value_objects::NodeName::new("b").unwrap(),
                from_output: "o".to_string(),
                to_input: format!("i{connection_count}"),
            }],
            outputs: vec![],
        }
    }

    #[test]
    fn reapplying_same_config_is_idempotent() {
        let mut map = BTreeMap::new();
        map.insert(PipelineName::new("p").unwrap(), entry("p", 0));
        let diff = diff_pipelines(&map, &map.clone());
        assert!(diff.is_empty());
    }

    #[test]
    fn connection_change_is_a_reload() {
        let mut current = BTreeMap::new();
        current.insert(PipelineName::new("p").unwrap(), entry("p", 0));
        let mut requested = BTreeMap::new();
        requested.insert(PipelineName::new("p").unwrap(), entry("p", 1));
        let diff = diff_pipelines(&current, &requested);
        assert_eq!(diff.reload.len(), 1);
    }
}
