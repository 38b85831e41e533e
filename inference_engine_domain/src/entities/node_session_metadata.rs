// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # NodeSessionMetadata
//!
//! Each session carries a stack of `(node_name, shard_id, total_shards)`
//! frames tracking demultiplex nesting (§3). A demultiplex-N node spawns N
//! child sessions with an extra frame pushed; a gather node pops a frame and
//! verifies shard consistency.

use crate::value_objects::{NodeName, RequestId};
use crate::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemultiplexFrame {
    pub node_name: NodeName,
    pub shard_id: u64,
    pub total_shards: u64,
}

/// Identifies one `NodeSession` within a `Pipeline` execution: the root
/// request plus the demultiplex frame stack in effect at this point in the
/// DAG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSessionMetadata {
    request_id: RequestId,
    frames: Vec<DemultiplexFrame>,
}

impl NodeSessionMetadata {
    pub fn root(request_id: RequestId) -> Self {
        Self { request_id, frames: Vec::new() }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn frames(&self) -> &[DemultiplexFrame] {
        &self.frames
    }

    /// Used as a map key distinguishing sessions spawned by the same request
    /// across sibling demultiplex shards.
    pub fn session_key(&self) -> String {
        let mut key = self.request_id.to_string();
        for f in &self.frames {
            key.push('/');
            key.push_str(f.node_name.as_str());
            key.push(':');
            key.push_str(&f.shard_id.to_string());
        }
        key
    }

    /// Spawns one child session for shard `shard_id` of `total_shards`,
    /// extending the frame stack (§4.7, demultiplex).
    pub fn push_frame(&self, node_name: NodeName, shard_id: u64, total_shards: u64) -> Self {
        let mut frames = self.frames.clone();
        frames.push(DemultiplexFrame { node_name, shard_id, total_shards });
        Self { request_id: self.request_id.clone(), frames }
    }

    /// Pops the innermost frame when a gather node joins shards back
    /// together, verifying it was produced by `expected_node` (§4.7).
    pub fn pop_frame(&self, expected_node: &NodeName) -> Result<(Self, DemultiplexFrame), EngineError> {
        let mut frames = self.frames.clone();
        let popped = frames.pop().ok_or_else(|| {
            EngineError::internal_error(format!("gather node '{expected_node}' has no demultiplex frame to pop"))
        })?;
        if &popped.node_name != expected_node {
            return Err(EngineError::internal_error(format!(
                "frame mismatch: gather '{expected_node}' popped frame from '{}'",
                popped.node_name
            )));
        }
        Ok((Self { request_id: self.request_id.clone(), frames }, popped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_pop_restores_parent_session() {
        let root = NodeSessionMetadata::root(RequestId::new());
        let node = NodeName::new("demux").unwrap();
        let child = root.push_frame(node.clone(), 0, 3);
        assert_eq!(child.frames().len(), 1);
        let (restored, frame) = child.pop_frame(&node).unwrap();
        assert_eq!(restored, root);
        assert_eq!(frame.shard_id, 0);
        assert_eq!(frame.total_shards, 3);
    }

    #[test]
    fn pop_rejects_mismatched_node() {
        let root = NodeSessionMetadata::root(RequestId::new());
        let child = root.push_frame(NodeName::new("demux").unwrap(), 0, 3);
        assert!(child.pop_frame(&NodeName::new("other").unwrap()).is_err());
    }

    #[test]
    fn session_keys_differ_per_shard() {
        let root = NodeSessionMetadata::root(RequestId::new());
        let node = NodeName::new("demux").unwrap();
        let a = root.push_frame(node.clone(), 0, 3);
        let b = root.push_frame(node, 1, 3);
        assert_ne!(a.session_key(), b.session_key());
    }
}
