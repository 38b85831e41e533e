// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Entities: mutable objects with identity but no independent lifecycle of
//! their own (they live inside an aggregate).

pub mod model_version_status;
pub mod node;
pub mod node_info;
pub mod node_session;
pub mod node_session_metadata;
pub mod pipeline_definition_status;

pub use model_version_status::ModelVersionStatus;
pub use node::Node;
pub use node_info::{Connection, DemultiplyCount, NodeInfo, NodeKind};
pub use node_session::{NodeInputHandler, NodeSession};
pub use node_session_metadata::{DemultiplexFrame, NodeSessionMetadata};
pub use pipeline_definition_status::{PipelineDefinitionEvent, PipelineDefinitionStatus};
