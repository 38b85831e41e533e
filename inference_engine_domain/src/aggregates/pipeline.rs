// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline (C8)
//!
//! One execution instance of a DAG (§4.8). Holds its own copy of every
//! `Node` it was built from — not a pointer into its `PipelineDefinition` —
//! so retiring the definition never frees state an in-flight pipeline still
//! needs (I5, §9 "pipeline instances outliving their definitions").
//!
//! The actual event-driven progression (§4.12, C12) runs in the engine
//! crate's executor loop, which owns the shared `(node, session_key)` queue
//! and the live `ModelInstance`s; this aggregate only exposes the static
//! shape the loop walks (entry, exit, per-node dependencies/dependants).

use std::collections::HashMap;

use crate::entities::node::InputBinding;
use crate::entities::{Connection, Node, NodeInfo};
use crate::value_objects::{NodeName, PipelineName};
use crate::EngineError;

pub struct Pipeline {
    name: PipelineName,
    nodes: Vec<Node>,
    entry: NodeName,
    exit: NodeName,
}

impl Pipeline {
    /// Resolves `connections` into per-node [`InputBinding`]s and reverse
    /// dependants, then snapshots each [`NodeInfo`] into an owned [`Node`].
    pub fn from_definition(name: PipelineName, node_infos: &[NodeInfo], connections: &[Connection]) -> Self {
        let mut dependants: HashMap<&str, Vec<NodeName>> = HashMap::new();
        for conn in connections {
            dependants.entry(conn.from_node.as_str()).or_default().push(conn.to_node.clone());
        }

        let mut entry = None;
        let mut exit = None;
        let nodes = node_infos
            .iter()
            .map(|info| {
                if info.kind == crate::entities::NodeKind::Entry {
                    entry = Some(info.name.clone());
                }
                if info.kind == crate::entities::NodeKind::Exit {
                    exit = Some(info.name.clone());
                }
                let inputs: Vec<InputBinding> = connections
                    .iter()
                    .filter(|c| c.to_node == info.name)
                    .map(|c| InputBinding {
                        to_input: c.to_input.clone(),
                        from_node: c.from_node.clone(),
                        from_output: c.from_output.clone(),
                    })
                    .collect();
                let mut deps = dependants.get(info.name.as_str()).cloned().unwrap_or_default();
                deps.sort();
                deps.dedup();
                Node::from_info(info, inputs, deps)
            })
            .collect();

        Self {
            name,
            nodes,
            entry: entry.expect("PipelineDefinition::validate guarantees exactly one entry node"),
            exit: exit.expect("PipelineDefinition::validate guarantees exactly one exit node"),
        }
    }

    pub fn name(&self) -> &PipelineName {
        &self.name
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, name: &NodeName) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.name == name)
    }

    pub fn entry(&self) -> &Node {
        self.node(&self.entry).expect("entry node always present")
    }

    pub fn exit(&self) -> &Node {
        self.node(&self.exit).expect("exit node always present")
    }

    /// Used by the executor loop to decide when a node's dependencies have
    /// all published outputs for a given session key (§4.12 ordering
    /// guarantee).
    pub fn dependencies_of(&self, name: &NodeName) -> Result<Vec<&NodeName>, EngineError> {
        self.node(name)
            .map(|n| n.dependencies())
            .ok_or_else(|| EngineError::PipelineNodeReferingToMissingNode(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::NodeInfo;
    use crate::value_objects::{ModelName, ModelVersion};

    fn conn(to: &str, from: &str) -> Connection {
        Connection {
            to_node: NodeName::new(to).unwrap(),
            from_node: NodeName::new(from).unwrap(),
            from_output: "a".to_string(),
            to_input: "b".to_string(),
        }
    }

    #[test]
    fn entry_and_exit_resolve_for_a_linear_dag() {
        let nodes = vec![
            NodeInfo::entry(NodeName::new("e").unwrap()),
            NodeInfo::dl(NodeName::new("d").unwrap(), ModelName::new("dummy").unwrap(), ModelVersion::DEFAULT),
            NodeInfo::exit(NodeName::new("x").unwrap()),
        ];
        let connections = vec![conn("d", "e"), conn("x", "d")];
        let pipeline = Pipeline::from_definition(PipelineName::new("p").unwrap(), &nodes, &connections);

        assert_eq!(pipeline.entry().name, NodeName::new("e").unwrap());
        assert_eq!(pipeline.exit().name, NodeName::new("x").unwrap());
        assert_eq!(pipeline.dependencies_of(&NodeName::new("d").unwrap()).unwrap(), vec![&NodeName::new("e").unwrap()]);
    }
}
