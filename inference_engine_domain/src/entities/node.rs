// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Node
//!
//! An immutable DAG vertex (§4.7, §9 "Virtual hierarchy of Node /
//! NodeSession"). Rather than a class hierarchy, this is a tagged variant
//! over a behavior table (`Entry | Dl | Exit`), with the shared shape
//! (dependencies, dependants) computed once from a `PipelineDefinition`'s
//! connections and baked into each variant.

use crate::entities::node_info::{DemultiplyCount, NodeInfo, NodeKind};
use crate::value_objects::{ModelName, ModelVersion, NodeName};

/// A dependency edge resolved from a `Connection`: which upstream node, which
/// of its outputs, bound to which of this node's inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBinding {
    pub to_input: String,
    pub from_node: NodeName,
    pub from_output: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: NodeName,
    pub kind: NodeKind,
    pub model_name: Option<ModelName>,
    pub model_version: Option<ModelVersion>,
    pub inputs: Vec<InputBinding>,
    pub dependants: Vec<NodeName>,
    pub demultiply_count: Option<DemultiplyCount>,
    pub gather_from: Option<Vec<NodeName>>,
}

impl Node {
    pub fn from_info(info: &NodeInfo, inputs: Vec<InputBinding>, dependants: Vec<NodeName>) -> Self {
        Self {
            name: info.name.clone(),
            kind: info.kind,
            model_name: info.model_name.clone(),
            model_version: info.model_version,
            inputs,
            dependants,
            demultiply_count: info.demultiply_count,
            gather_from: info.gather_from.clone(),
        }
    }

    /// Distinct upstream node names this node waits on before it can execute.
    pub fn dependencies(&self) -> Vec<&NodeName> {
        let mut deps: Vec<&NodeName> = self.inputs.iter().map(|b| &b.from_node).collect();
        deps.sort();
        deps.dedup();
        deps
    }

    /// Number of inputs that must arrive before a (non-gather) session is
    /// ready to execute.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_entry(&self) -> bool {
        matches!(self.kind, NodeKind::Entry)
    }

    pub fn is_exit(&self) -> bool {
        matches!(self.kind, NodeKind::Exit)
    }

    pub fn is_dl(&self) -> bool {
        matches!(self.kind, NodeKind::Dl)
    }

    pub fn is_demultiplex(&self) -> bool {
        self.demultiply_count.is_some()
    }

    pub fn is_gather(&self) -> bool {
        self.gather_from.is_some()
    }
}
