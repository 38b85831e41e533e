// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # PipelineDefinition (C9)
//!
//! The validated template + lifecycle state machine (§4.9); factory of
//! [`crate::aggregates::pipeline::Pipeline`] instances. Immutable after
//! validation (`name`, `nodes`, `connections`); the dynamic part is `status`
//! plus an implicit subscription to every referenced model (modeled here as
//! a query against a [`ModelCatalog`] the caller supplies, rather than a
//! back-reference, per the arena-and-indices redesign note in §9).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::aggregates::pipeline::Pipeline;
use crate::entities::{Connection, NodeInfo, NodeKind, PipelineDefinitionEvent, PipelineDefinitionStatus};
use crate::value_objects::{ModelName, ModelVersion, PipelineName, TensorInfo};
use crate::EngineError;

/// Read-only query surface `validate`/`create` need from whichever registry
/// of live models the engine maintains. Kept as a trait so this crate never
/// depends on the concrete `ModelRegistry` (domain(diff) + engine(apply) per
/// the module map).
pub trait ModelCatalog {
    fn has_available_version(&self, name: &ModelName) -> bool;
    fn requests_dynamic_params(&self, name: &ModelName) -> bool;
    fn tensor_info(&self, name: &ModelName, version: ModelVersion) -> Option<(Vec<TensorInfo>, Vec<TensorInfo>)>;
}

pub struct PipelineDefinition {
    name: PipelineName,
    nodes: Vec<NodeInfo>,
    connections: Vec<Connection>,
    status: Mutex<PipelineDefinitionStatus>,
    status_cv: Condvar,
}

impl PipelineDefinition {
    pub fn new(name: PipelineName, nodes: Vec<NodeInfo>, connections: Vec<Connection>) -> Self {
        Self {
            name,
            nodes,
            connections,
            status: Mutex::new(PipelineDefinitionStatus::Begin),
            status_cv: Condvar::new(),
        }
    }

    pub fn name(&self) -> &PipelineName {
        &self.name
    }

    pub fn nodes(&self) -> &[NodeInfo] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn status(&self) -> PipelineDefinitionStatus {
        *self.status.lock().unwrap()
    }

    fn apply_event(&self, event: PipelineDefinitionEvent) {
        let mut guard = self.status.lock().unwrap();
        if let Some(next) = guard.apply(event) {
            *guard = next;
            self.status_cv.notify_all();
        }
    }

    /// §4.9 checks 1-8. Begins validation if currently in BEGIN.
    pub fn validate(&self, catalog: &dyn ModelCatalog) -> Result<(), EngineError> {
        {
            let mut guard = self.status.lock().unwrap();
            if *guard == PipelineDefinitionStatus::Begin {
                if let Some(next) = guard.begin_validation() {
                    *guard = next;
                }
            }
        }

        let result = self.validate_inner(catalog);
        self.apply_event(if result.is_ok() {
            PipelineDefinitionEvent::ValidationPassed
        } else {
            PipelineDefinitionEvent::ValidationFailed
        });
        result
    }

    fn validate_inner(&self, catalog: &dyn ModelCatalog) -> Result<(), EngineError> {
        let by_name: HashMap<&str, &NodeInfo> = self.nodes.iter().map(|n| (n.name.as_str(), n)).collect();
        if by_name.len() != self.nodes.len() {
            return Err(EngineError::PipelineNodeNameDuplicate(self.name.to_string()));
        }

        let entries: Vec<&NodeInfo> = self.nodes.iter().filter(|n| n.kind == NodeKind::Entry).collect();
        let exits: Vec<&NodeInfo> = self.nodes.iter().filter(|n| n.kind == NodeKind::Exit).collect();
        if entries.len() > 1 {
            return Err(EngineError::PipelineMultipleEntryNodes(self.name.to_string()));
        }
        if exits.len() > 1 {
            return Err(EngineError::PipelineMultipleExitNodes(self.name.to_string()));
        }
        if entries.is_empty() || exits.is_empty() {
            return Err(EngineError::PipelineMissingEntryOrExit(self.name.to_string()));
        }

        for conn in &self.connections {
            let to = by_name
                .get(conn.to_node.as_str())
                .ok_or_else(|| EngineError::PipelineNodeReferingToMissingNode(conn.to_node.to_string()))?;
            let from = by_name
                .get(conn.from_node.as_str())
                .ok_or_else(|| EngineError::PipelineNodeReferingToMissingNode(conn.from_node.to_string()))?;
            if from.kind == NodeKind::Exit {
                return Err(EngineError::PipelineNodeReferingToMissingDataSource(format!(
                    "{} cannot depend on exit node {}",
                    to.name, from.name
                )));
            }
        }

        let mut inbound_count: HashMap<(&str, &str), u32> = HashMap::new();
        for conn in &self.connections {
            *inbound_count.entry((conn.to_node.as_str(), conn.to_input.as_str())).or_insert(0) += 1;
        }
        if inbound_count.values().any(|&c| c > 1) {
            return Err(EngineError::PipelineModelInputConnectedToMultipleDataSources(self.name.to_string()));
        }

        for node in &self.nodes {
            if node.kind != NodeKind::Dl {
                continue;
            }
            let model_name = node
                .model_name
                .as_ref()
                .ok_or_else(|| EngineError::PipelineNodeReferingToMissingModel(node.name.to_string()))?;
            if !catalog.has_available_version(model_name) {
                return Err(EngineError::PipelineNodeReferingToMissingModel(model_name.to_string()));
            }
            if catalog.requests_dynamic_params(model_name) {
                return Err(EngineError::RequestedDynamicParametersOnSubscribedModel(model_name.to_string()));
            }

            if let Some((inputs, _outputs)) = catalog.tensor_info(model_name, node.model_version.unwrap_or(ModelVersion::DEFAULT)) {
                let connected: BTreeSet<&str> = self
                    .connections
                    .iter()
                    .filter(|c| c.to_node == node.name)
                    .map(|c| c.to_input.as_str())
                    .collect();
                for input in &inputs {
                    if !connected.contains(input.name.as_str()) {
                        return Err(EngineError::PipelineNotAllInputsConnected(format!(
                            "{}::{}",
                            node.name, input.name
                        )));
                    }
                }
            }
        }

        for conn in &self.connections {
            let from = by_name[conn.from_node.as_str()];
            let to = by_name[conn.to_node.as_str()];
            let (producer_info, consumer_info) = match (
                from.model_name.as_ref().and_then(|m| catalog.tensor_info(m, from.model_version.unwrap_or(ModelVersion::DEFAULT))),
                to.model_name.as_ref().and_then(|m| catalog.tensor_info(m, to.model_version.unwrap_or(ModelVersion::DEFAULT))),
            ) {
                (Some((_, outs)), Some((ins, _))) => (outs, ins),
                _ => continue,
            };
            let producer_tensor = producer_info.iter().find(|t| t.name == conn.from_output);
            let consumer_tensor = consumer_info.iter().find(|t| t.name == conn.to_input);
            if let (Some(p), Some(c)) = (producer_tensor, consumer_tensor) {
                if p.intersection(c).is_err() {
                    return Err(EngineError::InvalidShape(format!(
                        "{}::{} incompatible with {}::{}",
                        from.name, conn.from_output, to.name, conn.to_input
                    )));
                }
            }
        }

        self.check_acyclic(&by_name)?;
        self.check_demultiplex_gather_balance(&by_name)?;
        Ok(())
    }

    fn check_acyclic(&self, by_name: &HashMap<&str, &NodeInfo>) -> Result<(), EngineError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Grey,
            Black,
        }
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for conn in &self.connections {
            adjacency.entry(conn.from_node.as_str()).or_default().push(conn.to_node.as_str());
        }
        let mut colors: HashMap<&str, Color> = by_name.keys().map(|&n| (n, Color::White)).collect();

        fn visit<'a>(
            node: &'a str,
            adjacency: &HashMap<&'a str, Vec<&'a str>>,
            colors: &mut HashMap<&'a str, Color>,
        ) -> bool {
            colors.insert(node, Color::Grey);
            if let Some(neighbors) = adjacency.get(node) {
                for &next in neighbors {
                    match colors.get(next).copied().unwrap_or(Color::White) {
                        Color::Grey => return true,
                        Color::White => {
                            if visit(next, adjacency, colors) {
                                return true;
                            }
                        }
                        Color::Black => {}
                    }
                }
            }
            colors.insert(node, Color::Black);
            false
        }

        let names: Vec<&str> = by_name.keys().copied().collect();
        for name in names {
            if colors.get(name).copied() == Some(Color::White) && visit(name, &adjacency, &mut colors) {
                return Err(EngineError::PipelineCycleFound(self.name.to_string()));
            }
        }
        Ok(())
    }

    /// Every demultiplex node must be gathered before Exit, unless nothing
    /// downstream of it is ever used (§4.9 check 8).
    fn check_demultiplex_gather_balance(&self, by_name: &HashMap<&str, &NodeInfo>) -> Result<(), EngineError> {
        let gathered: BTreeSet<&str> = self
            .nodes
            .iter()
            .filter_map(|n| n.gather_from.as_ref())
            .flat_map(|sources| sources.iter().map(|s| s.as_str()))
            .collect();

        for node in &self.nodes {
            if !node.is_demultiplex() {
                continue;
            }
            if gathered.contains(node.name.as_str()) {
                continue;
            }
            let has_downstream = self.connections.iter().any(|c| c.from_node == node.name);
            if has_downstream {
                return Err(EngineError::PipelineInconsistentShardDimensions(format!(
                    "demultiplex node {} has downstream consumers but is never gathered",
                    node.name
                )));
            }
            let _ = by_name;
        }
        Ok(())
    }

    /// Blocks up to `deadline` on `status` leaving a transient state (§4.9).
    pub fn create(&self, deadline: Duration) -> Result<Pipeline, EngineError> {
        let start = Instant::now();
        let mut guard = self.status.lock().unwrap();
        loop {
            match *guard {
                PipelineDefinitionStatus::Available => {
                    return Ok(Pipeline::from_definition(self.name.clone(), &self.nodes, &self.connections));
                }
                PipelineDefinitionStatus::Retired => {
                    return Err(EngineError::PipelineDefinitionNotLoadedAnymore(self.name.to_string()));
                }
                _ => {}
            }
            let elapsed = start.elapsed();
            if elapsed >= deadline {
                return Err(EngineError::PipelineDefinitionNotLoadedYet(self.name.to_string()));
            }
            let (g, timeout_result) = self.status_cv.wait_timeout(guard, deadline - elapsed).unwrap();
            guard = g;
            if timeout_result.timed_out() {
                return Err(EngineError::PipelineDefinitionNotLoadedYet(self.name.to_string()));
            }
        }
    }

    /// Transitions to RETIRED; does not wait for in-flight pipelines (I5) —
    /// those hold their own node copies via `Pipeline::from_definition`.
    pub fn retire(&self) {
        self.apply_event(PipelineDefinitionEvent::RetireRequested);
    }

    pub fn on_used_model_changed(&self) {
        self.apply_event(PipelineDefinitionEvent::UsedModelChanged);
    }
}

pub type ModelCatalogMap = Arc<BTreeMap<ModelName, Vec<TensorInfo>>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::NodeName;

    struct EmptyCatalog;
    impl ModelCatalog for EmptyCatalog {
        fn has_available_version(&self, _name: &ModelName) -> bool {
            true
        }
        fn requests_dynamic_params(&self, _name: &ModelName) -> bool {
            false
        }
        fn tensor_info(&self, _name: &ModelName, _version: ModelVersion) -> Option<(Vec<TensorInfo>, Vec<TensorInfo>)> {
            None
        }
    }

    fn conn(to: &str, from: &str) -> Connection {
        Connection {
            to_node: NodeName::new(to).unwrap(),
            from_node: NodeName::new(from).unwrap(),
            from_output: "a".to_string(),
            to_input: "b".to_string(),
        }
    }

    #[test]
    fn linear_entry_to_exit_validates() {
        let nodes = vec![NodeInfo::entry(NodeName::new("entry").unwrap()), NodeInfo::exit(NodeName::new("exit").unwrap())];
        let connections = vec![conn("exit", "entry")];
        let def = PipelineDefinition::new(PipelineName::new("p").unwrap(), nodes, connections);
        assert!(def.validate(&EmptyCatalog).is_ok());
        assert_eq!(def.status(), PipelineDefinitionStatus::Available);
    }

    #[test]
    fn cycle_is_rejected() {
        let nodes = vec![
            NodeInfo::entry(NodeName::new("e").unwrap()),
            NodeInfo::dl(NodeName::new("a").unwrap(), ModelName::new("m").unwrap(), ModelVersion::DEFAULT),
            NodeInfo::dl(NodeName::new("b").unwrap(), ModelName::new("m").unwrap(), ModelVersion::DEFAULT),
            NodeInfo::exit(NodeName::new("x").unwrap()),
        ];
        let connections = vec![conn("a", "e"), conn("b", "a"), conn("a", "b"), conn("x", "b")];
        let def = PipelineDefinition::new(PipelineName::new("p").unwrap(), nodes, connections);
        let err = def.validate(&EmptyCatalog).unwrap_err();
        assert!(matches!(err, EngineError::PipelineCycleFound(_)));
        assert_eq!(def.status(), PipelineDefinitionStatus::LoadingPreconditionFailed);
    }

    #[test]
    fn missing_exit_is_rejected() {
        let nodes = vec![NodeInfo::entry(NodeName::new("e").unwrap())];
        let def = PipelineDefinition::new(PipelineName::new("p").unwrap(), nodes, vec![]);
        assert!(matches!(def.validate(&EmptyCatalog).unwrap_err(), EngineError::PipelineMissingEntryOrExit(_)));
    }
}
