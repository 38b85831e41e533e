// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Status Code Value Object
//!
//! The externally visible status vocabulary of the engine (§6). Every
//! `Predict` response and every pipeline validation pass resolves to exactly
//! one of these codes. Kept separate from [`crate::EngineError`] because a
//! status code is also produced on the *success* path (`OK`) and is the
//! wire-stable surface a client depends on, while `EngineError` additionally
//! carries a human-readable message for logs.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Status codes exposed verbatim on the external response surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    Ok,
    InvalidPrecision,
    InvalidShape,
    InvalidBatchSize,
    InvalidMissingInput,
    InvalidNoOfInputs,
    InvalidValueCount,
    InvalidContentSize,
    ModelNameMissing,
    ModelVersionMissing,
    ModelVersionNotLoadedYet,
    ModelVersionNotLoadedAnymore,
    PipelineDefinitionNameMissing,
    PipelineDefinitionNotLoadedYet,
    PipelineDefinitionNotLoadedAnymore,
    PipelineCycleFound,
    PipelineMultipleEntryNodes,
    PipelineMultipleExitNodes,
    PipelineMissingEntryOrExit,
    PipelineNodeNameDuplicate,
    PipelineNodeReferingToMissingModel,
    PipelineNodeReferingToMissingNode,
    PipelineNodeReferingToMissingDataSource,
    PipelineNotAllInputsConnected,
    PipelineModelInputConnectedToMultipleDataSources,
    PipelineInconsistentShardDimensions,
    /// Registry-level: a reload entry both requires dynamic reshape and is
    /// referenced by a live pipeline; gated for retry after the pipeline pass.
    RequestedDynamicParametersOnSubscribedModel,
    InternalError,
}

impl StatusCode {
    /// True for the single success value.
    pub fn is_ok(&self) -> bool {
        matches!(self, StatusCode::Ok)
    }

    /// Caller errors: validation failures on the request, returned verbatim,
    /// no retry, no side effects (§7).
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            StatusCode::InvalidPrecision
                | StatusCode::InvalidShape
                | StatusCode::InvalidBatchSize
                | StatusCode::InvalidMissingInput
                | StatusCode::InvalidNoOfInputs
                | StatusCode::InvalidValueCount
                | StatusCode::InvalidContentSize
                | StatusCode::ModelNameMissing
                | StatusCode::ModelVersionMissing
                | StatusCode::PipelineDefinitionNameMissing
        )
    }

    /// Transient unavailability: caller may retry with backoff (§7).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StatusCode::ModelVersionNotLoadedYet | StatusCode::PipelineDefinitionNotLoadedYet
        )
    }

    /// Permanent unavailability: caller should re-resolve the target (§7).
    pub fn is_permanent_unavailability(&self) -> bool {
        matches!(
            self,
            StatusCode::ModelVersionNotLoadedAnymore | StatusCode::PipelineDefinitionNotLoadedAnymore
        )
    }
}

impl Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatusCode::Ok => "OK",
            StatusCode::InvalidPrecision => "INVALID_PRECISION",
            StatusCode::InvalidShape => "INVALID_SHAPE",
            StatusCode::InvalidBatchSize => "INVALID_BATCH_SIZE",
            StatusCode::InvalidMissingInput => "INVALID_MISSING_INPUT",
            StatusCode::InvalidNoOfInputs => "INVALID_NO_OF_INPUTS",
            StatusCode::InvalidValueCount => "INVALID_VALUE_COUNT",
            StatusCode::InvalidContentSize => "INVALID_CONTENT_SIZE",
            StatusCode::ModelNameMissing => "MODEL_NAME_MISSING",
            StatusCode::ModelVersionMissing => "MODEL_VERSION_MISSING",
            StatusCode::ModelVersionNotLoadedYet => "MODEL_VERSION_NOT_LOADED_YET",
            StatusCode::ModelVersionNotLoadedAnymore => "MODEL_VERSION_NOT_LOADED_ANYMORE",
            StatusCode::PipelineDefinitionNameMissing => "PIPELINE_DEFINITION_NAME_MISSING",
            StatusCode::PipelineDefinitionNotLoadedYet => "PIPELINE_DEFINITION_NOT_LOADED_YET",
            StatusCode::PipelineDefinitionNotLoadedAnymore => "PIPELINE_DEFINITION_NOT_LOADED_ANYMORE",
            StatusCode::PipelineCycleFound => "PIPELINE_CYCLE_FOUND",
            StatusCode::PipelineMultipleEntryNodes => "PIPELINE_MULTIPLE_ENTRY_NODES",
            StatusCode::PipelineMultipleExitNodes => "PIPELINE_MULTIPLE_EXIT_NODES",
            StatusCode::PipelineMissingEntryOrExit => "PIPELINE_MISSING_ENTRY_OR_EXIT",
            StatusCode::PipelineNodeNameDuplicate => "PIPELINE_NODE_NAME_DUPLICATE",
            StatusCode::PipelineNodeReferingToMissingModel => "PIPELINE_NODE_REFERING_TO_MISSING_MODEL",
            StatusCode::PipelineNodeReferingToMissingNode => "PIPELINE_NODE_REFERING_TO_MISSING_NODE",
            StatusCode::PipelineNodeReferingToMissingDataSource => "PIPELINE_NODE_REFERING_TO_MISSING_DATA_SOURCE",
            StatusCode::PipelineNotAllInputsConnected => "PIPELINE_NOT_ALL_INPUTS_CONNECTED",
            StatusCode::PipelineModelInputConnectedToMultipleDataSources => {
                "PIPELINE_MODEL_INPUT_CONNECTED_TO_MULTIPLE_DATA_SOURCES"
            }
            StatusCode::PipelineInconsistentShardDimensions => "PIPELINE_INCONSISTENT_SHARD_DIMENSIONS",
            StatusCode::RequestedDynamicParametersOnSubscribedModel => {
                "REQUESTED_DYNAMIC_PARAMETERS_ON_SUBSCRIBED_MODEL"
            }
            StatusCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_is_neither_caller_nor_transient() {
        assert!(StatusCode::Ok.is_ok());
        assert!(!StatusCode::Ok.is_caller_error());
        assert!(!StatusCode::Ok.is_transient());
    }

    #[test]
    fn not_loaded_yet_is_transient_not_permanent() {
        assert!(StatusCode::ModelVersionNotLoadedYet.is_transient());
        assert!(!StatusCode::ModelVersionNotLoadedYet.is_permanent_unavailability());
    }

    #[test]
    fn not_loaded_anymore_is_permanent() {
        assert!(StatusCode::ModelVersionNotLoadedAnymore.is_permanent_unavailability());
        assert!(StatusCode::PipelineDefinitionNotLoadedAnymore.is_permanent_unavailability());
    }

    #[test]
    fn display_matches_wire_vocabulary() {
        assert_eq!(StatusCode::PipelineCycleFound.to_string(), "PIPELINE_CYCLE_FOUND");
        assert_eq!(
            StatusCode::PipelineInconsistentShardDimensions.to_string(),
            "PIPELINE_INCONSISTENT_SHARD_DIMENSIONS"
        );
    }
}
