// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # NodeInfo & Connection
//!
//! Compile-time (config-time) descriptors of a pipeline's DAG (§3), grounded
//! on OVMS's `NodeInfo`/`NodeKind{ENTRY,DL,EXIT}` but expressed as a plain
//! data record rather than a mutable struct with an embedded `gather_from`
//! `std::unordered_set`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::value_objects::{ModelName, ModelVersion, NodeName};

/// How many shards a demultiplex node produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemultiplyCount {
    Fixed(u64),
    /// Read at runtime from a named output's leading dimension (§3).
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Entry,
    Dl,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub kind: NodeKind,
    pub name: NodeName,
    pub model_name: Option<ModelName>,
    pub model_version: Option<ModelVersion>,
    /// alias -> real output/input name on the bound model.
    pub output_aliases: BTreeMap<String, String>,
    pub demultiply_count: Option<DemultiplyCount>,
    pub gather_from: Option<Vec<NodeName>>,
}

impl NodeInfo {
    pub fn entry(name: NodeName) -> Self {
        Self {
            kind: NodeKind::Entry,
            name,
            model_name: None,
            model_version: None,
            output_aliases: BTreeMap::new(),
            demultiply_count: None,
            gather_from: None,
        }
    }

    pub fn exit(name: NodeName) -> Self {
        Self {
            kind: NodeKind::Exit,
            name,
            model_name: None,
            model_version: None,
            output_aliases: BTreeMap::new(),
            demultiply_count: None,
            gather_from: None,
        }
    }

    pub fn dl(name: NodeName, model_name: ModelName, model_version: ModelVersion) -> Self {
        Self {
            kind: NodeKind::Dl,
            name,
            model_name: Some(model_name),
            model_version: Some(model_version),
            output_aliases: BTreeMap::new(),
            demultiply_count: None,
            gather_from: None,
        }
    }

    pub fn with_demultiply(mut self, count: DemultiplyCount) -> Self {
        self.demultiply_count = Some(count);
        self
    }

    pub fn with_gather_from(mut self, sources: Vec<NodeName>) -> Self {
        self.gather_from = Some(sources);
        self
    }

    pub fn is_demultiplex(&self) -> bool {
        self.demultiply_count.is_some()
    }

    pub fn is_gather(&self) -> bool {
        self.gather_from.is_some()
    }
}

/// `(to_node, from_node, from_output, to_input)` (§3). Graph-wide: at most one
/// source per `(to_node, to_input)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub to_node: NodeName,
    pub from_node: NodeName,
    pub from_output: String,
    pub to_input: String,
}
