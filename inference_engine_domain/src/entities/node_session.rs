// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # NodeSession
//!
//! Per-request, per-demultiplex-frame mutable state on a `Node` (§4.7). Built
//! lazily when its first input arrives; releases once its dependants have
//! consumed its outputs. The actual dispatch against a backend (the DL
//! variant's slot acquisition + inference) is driven by the engine's executor
//! loop, which holds the `ModelInstance`/`ModelRegistry`; this type only
//! tracks readiness and owns collected tensors, keeping the domain free of
//! the async runtime.

use std::collections::BTreeMap;

use crate::entities::node_info::NodeKind;
use crate::entities::node_session_metadata::NodeSessionMetadata;
use crate::value_objects::{NodeName, Tensor};
use crate::EngineError;

/// Collects inputs by `(input_name, shard_id)` and reports readiness once
/// every expected input has arrived (§4.7). For a gather node, readiness
/// requires every shard from `gather_from` rather than a fixed input count.
#[derive(Debug, Clone, Default)]
pub struct NodeInputHandler {
    expected: usize,
    received: BTreeMap<(String, Option<u64>), Tensor>,
}

impl NodeInputHandler {
    pub fn new(expected: usize) -> Self {
        Self { expected, received: BTreeMap::new() }
    }

    /// Records one input; returns `true` if this arrival made the session
    /// ready.
    pub fn offer(&mut self, input_name: impl Into<String>, shard_id: Option<u64>, tensor: Tensor) -> bool {
        self.received.insert((input_name.into(), shard_id), tensor);
        self.is_ready()
    }

    pub fn is_ready(&self) -> bool {
        self.received.len() >= self.expected
    }

    pub fn inputs(&self) -> &BTreeMap<(String, Option<u64>), Tensor> {
        &self.received
    }

    pub fn into_inputs(self) -> BTreeMap<(String, Option<u64>), Tensor> {
        self.received
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSessionStatus {
    CollectingInputs,
    Ready,
    Dispatched,
    Completed,
    Failed,
}

/// Per-session state for one `Node` within one `Pipeline` execution.
#[derive(Debug, Clone)]
pub struct NodeSession {
    node_name: NodeName,
    metadata: NodeSessionMetadata,
    status: NodeSessionStatus,
    inputs: NodeInputHandler,
    outputs: Option<BTreeMap<String, Tensor>>,
    error: Option<EngineError>,
}

impl NodeSession {
    pub fn new(node_name: NodeName, metadata: NodeSessionMetadata, kind: NodeKind, expected_inputs: usize) -> Self {
        let expected = if matches!(kind, NodeKind::Entry) { 0 } else { expected_inputs };
        let status = if expected == 0 { NodeSessionStatus::Ready } else { NodeSessionStatus::CollectingInputs };
        Self { node_name, metadata, status, inputs: NodeInputHandler::new(expected), outputs: None, error: None }
    }

    pub fn session_key(&self) -> String {
        self.metadata.session_key()
    }

    pub fn metadata(&self) -> &NodeSessionMetadata {
        &self.metadata
    }

    pub fn status(&self) -> &NodeSessionStatus {
        &self.status
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.status, NodeSessionStatus::Ready)
    }

    /// Offers one input; transitions `CollectingInputs -> Ready` when the
    /// handler reports completeness.
    pub fn offer_input(&mut self, input_name: impl Into<String>, shard_id: Option<u64>, tensor: Tensor) {
        if self.inputs.offer(input_name, shard_id, tensor) && self.status == NodeSessionStatus::CollectingInputs {
            self.status = NodeSessionStatus::Ready;
        }
    }

    pub fn collected_inputs(&self) -> &BTreeMap<(String, Option<u64>), Tensor> {
        self.inputs.inputs()
    }

    /// Marks this session dispatched to a backend (DL nodes only); the
    /// executor loop calls this right before `infer_async` so a re-drained
    /// event does not double-dispatch.
    pub fn mark_dispatched(&mut self) {
        self.status = NodeSessionStatus::Dispatched;
    }

    pub fn complete(&mut self, outputs: BTreeMap<String, Tensor>) {
        self.outputs = Some(outputs);
        self.status = NodeSessionStatus::Completed;
    }

    pub fn fail(&mut self, err: EngineError) {
        self.error = Some(err);
        self.status = NodeSessionStatus::Failed;
    }

    pub fn outputs(&self) -> Option<&BTreeMap<String, Tensor>> {
        self.outputs.as_ref()
    }

    pub fn take_outputs(self) -> Option<BTreeMap<String, Tensor>> {
        self.outputs
    }

    pub fn error(&self) -> Option<&EngineError> {
        self.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{ElementType, RequestId};

    fn tensor() -> Tensor {
        Tensor::new(ElementType::Fp32, vec![1], vec![0, 0, 0, 0]).unwrap()
    }

    #[test]
    fn entry_session_starts_ready_with_no_inputs_expected() {
        let meta = NodeSessionMetadata::root(RequestId::new());
        let session = NodeSession::new(NodeName::new("entry").unwrap(), meta, NodeKind::Entry, 0);
        assert!(session.is_ready());
    }

    #[test]
    fn dl_session_becomes_ready_only_after_all_inputs_arrive() {
        let meta = NodeSessionMetadata::root(RequestId::new());
        let mut session = NodeSession::new(NodeName::new("dummy").unwrap(), meta, NodeKind::Dl, 2);
        assert!(!session.is_ready());
        session.offer_input("x", None, tensor());
        assert!(!session.is_ready());
        session.offer_input("y", None, tensor());
        assert!(session.is_ready());
    }

    #[test]
    fn complete_then_take_outputs_round_trips() {
        let meta = NodeSessionMetadata::root(RequestId::new());
        let mut session = NodeSession::new(NodeName::new("entry").unwrap(), meta, NodeKind::Entry, 0);
        let mut outputs = BTreeMap::new();
        outputs.insert("a".to_string(), tensor());
        session.complete(outputs.clone());
        assert_eq!(session.outputs(), Some(&outputs));
    }
}
