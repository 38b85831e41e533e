// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! A single, hierarchical error type for the engine domain. Every failure
//! mode in §6/§7 of the external-interfaces design is a first-class variant
//! here, each carrying a human-readable message for logs; [`EngineError::status_code`]
//! projects down to the wire-stable [`StatusCode`] a caller actually sees.

use thiserror::Error;

use crate::value_objects::status_code::StatusCode;

/// Domain-specific errors for the inference orchestration engine.
///
/// Every variant maps to exactly one external [`StatusCode`] via
/// [`EngineError::status_code`]; callers needing the wire vocabulary should
/// go through that projection rather than matching on this enum directly.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("invalid precision: {0}")]
    InvalidPrecision(String),

    #[error("invalid shape: {0}")]
    InvalidShape(String),

    #[error("invalid batch size: {0}")]
    InvalidBatchSize(String),

    #[error("missing required input: {0}")]
    InvalidMissingInput(String),

    #[error("wrong number of inputs: {0}")]
    InvalidNoOfInputs(String),

    #[error("invalid value count: {0}")]
    InvalidValueCount(String),

    #[error("invalid content size: {0}")]
    InvalidContentSize(String),

    #[error("model name missing")]
    ModelNameMissing,

    #[error("model version missing")]
    ModelVersionMissing,

    #[error("model version {0} not loaded yet")]
    ModelVersionNotLoadedYet(String),

    #[error("model version {0} not loaded anymore")]
    ModelVersionNotLoadedAnymore(String),

    #[error("pipeline definition name missing")]
    PipelineDefinitionNameMissing,

    #[error("pipeline definition {0} not loaded yet")]
    PipelineDefinitionNotLoadedYet(String),

    #[error("pipeline definition {0} not loaded anymore")]
    PipelineDefinitionNotLoadedAnymore(String),

    #[error("cycle found in pipeline: {0}")]
    PipelineCycleFound(String),

    #[error("multiple entry nodes: {0}")]
    PipelineMultipleEntryNodes(String),

    #[error("multiple exit nodes: {0}")]
    PipelineMultipleExitNodes(String),

    #[error("missing entry or exit node: {0}")]
    PipelineMissingEntryOrExit(String),

    #[error("duplicate node name: {0}")]
    PipelineNodeNameDuplicate(String),

    #[error("node refers to missing model: {0}")]
    PipelineNodeReferingToMissingModel(String),

    #[error("node refers to missing node: {0}")]
    PipelineNodeReferingToMissingNode(String),

    #[error("node refers to missing data source: {0}")]
    PipelineNodeReferingToMissingDataSource(String),

    #[error("not all inputs connected: {0}")]
    PipelineNotAllInputsConnected(String),

    #[error("model input connected to multiple data sources: {0}")]
    PipelineModelInputConnectedToMultipleDataSources(String),

    #[error("inconsistent shard dimensions: {0}")]
    PipelineInconsistentShardDimensions(String),

    #[error("model '{0}' requests dynamic reshape but is referenced by a live pipeline")]
    RequestedDynamicParametersOnSubscribedModel(String),

    #[error("backend error: {0}")]
    BackendError(String),

    #[error("configuration error: {0}")]
    InvalidConfiguration(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("timeout: {0}")]
    TimeoutError(String),

    #[error("io error: {0}")]
    IoError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl EngineError {
    pub fn invalid_shape(msg: impl Into<String>) -> Self {
        Self::InvalidShape(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    pub fn backend_error(msg: impl Into<String>) -> Self {
        Self::BackendError(msg.into())
    }

    /// True for transient/backend conditions a caller may retry (§7).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::TimeoutError(_)
                | EngineError::ResourceExhausted(_)
                | EngineError::IoError(_)
                | EngineError::ModelVersionNotLoadedYet(_)
                | EngineError::PipelineDefinitionNotLoadedYet(_)
        )
    }

    pub fn category(&self) -> &'static str {
        match self {
            EngineError::InvalidPrecision(_)
            | EngineError::InvalidShape(_)
            | EngineError::InvalidBatchSize(_)
            | EngineError::InvalidMissingInput(_)
            | EngineError::InvalidNoOfInputs(_)
            | EngineError::InvalidValueCount(_)
            | EngineError::InvalidContentSize(_) => "validation",
            EngineError::ModelNameMissing
            | EngineError::ModelVersionMissing
            | EngineError::ModelVersionNotLoadedYet(_)
            | EngineError::ModelVersionNotLoadedAnymore(_) => "model",
            EngineError::PipelineDefinitionNameMissing
            | EngineError::PipelineDefinitionNotLoadedYet(_)
            | EngineError::PipelineDefinitionNotLoadedAnymore(_)
            | EngineError::PipelineCycleFound(_)
            | EngineError::PipelineMultipleEntryNodes(_)
            | EngineError::PipelineMultipleExitNodes(_)
            | EngineError::PipelineMissingEntryOrExit(_)
            | EngineError::PipelineNodeNameDuplicate(_)
            | EngineError::PipelineNodeReferingToMissingModel(_)
            | EngineError::PipelineNodeReferingToMissingNode(_)
            | EngineError::PipelineNodeReferingToMissingDataSource(_)
            | EngineError::PipelineNotAllInputsConnected(_)
            | EngineError::PipelineModelInputConnectedToMultipleDataSources(_)
            | EngineError::PipelineInconsistentShardDimensions(_) => "pipeline",
            EngineError::RequestedDynamicParametersOnSubscribedModel(_) => "registry",
            EngineError::BackendError(_) => "backend",
            EngineError::InvalidConfiguration(_) => "configuration",
            EngineError::ResourceExhausted(_) => "resource",
            EngineError::TimeoutError(_) => "timeout",
            EngineError::IoError(_) => "io",
            EngineError::SerializationError(_) => "serialization",
            EngineError::InternalError(_) => "internal",
        }
    }

    /// Projects this error down to the wire-stable status code (§6).
    pub fn status_code(&self) -> StatusCode {
        match self {
            EngineError::InvalidPrecision(_) => StatusCode::InvalidPrecision,
            EngineError::InvalidShape(_) => StatusCode::InvalidShape,
            EngineError::InvalidBatchSize(_) => StatusCode::InvalidBatchSize,
            EngineError::InvalidMissingInput(_) => StatusCode::InvalidMissingInput,
            EngineError::InvalidNoOfInputs(_) => StatusCode::InvalidNoOfInputs,
            EngineError::InvalidValueCount(_) => StatusCode::InvalidValueCount,
            EngineError::InvalidContentSize(_) => StatusCode::InvalidContentSize,
            EngineError::ModelNameMissing => StatusCode::ModelNameMissing,
            EngineError::ModelVersionMissing => StatusCode::ModelVersionMissing,
            EngineError::ModelVersionNotLoadedYet(_) => StatusCode::ModelVersionNotLoadedYet,
            EngineError::ModelVersionNotLoadedAnymore(_) => StatusCode::ModelVersionNotLoadedAnymore,
            EngineError::PipelineDefinitionNameMissing => StatusCode::PipelineDefinitionNameMissing,
            EngineError::PipelineDefinitionNotLoadedYet(_) => StatusCode::PipelineDefinitionNotLoadedYet,
            EngineError::PipelineDefinitionNotLoadedAnymore(_) => StatusCode::PipelineDefinitionNotLoadedAnymore,
            EngineError::PipelineCycleFound(_) => StatusCode::PipelineCycleFound,
            EngineError::PipelineMultipleEntryNodes(_) => StatusCode::PipelineMultipleEntryNodes,
            EngineError::PipelineMultipleExitNodes(_) => StatusCode::PipelineMultipleExitNodes,
            EngineError::PipelineMissingEntryOrExit(_) => StatusCode::PipelineMissingEntryOrExit,
            EngineError::PipelineNodeNameDuplicate(_) => StatusCode::PipelineNodeNameDuplicate,
            EngineError::PipelineNodeReferingToMissingModel(_) => StatusCode::PipelineNodeReferingToMissingModel,
            EngineError::PipelineNodeReferingToMissingNode(_) => StatusCode::PipelineNodeReferingToMissingNode,
            EngineError::PipelineNodeReferingToMissingDataSource(_) => {
                StatusCode::PipelineNodeReferingToMissingDataSource
            }
            EngineError::PipelineNotAllInputsConnected(_) => StatusCode::PipelineNotAllInputsConnected,
            EngineError::PipelineModelInputConnectedToMultipleDataSources(_) => {
                StatusCode::PipelineModelInputConnectedToMultipleDataSources
            }
            EngineError::PipelineInconsistentShardDimensions(_) => StatusCode::PipelineInconsistentShardDimensions,
            EngineError::RequestedDynamicParametersOnSubscribedModel(_) => {
                StatusCode::RequestedDynamicParametersOnSubscribedModel
            }
            EngineError::BackendError(_)
            | EngineError::InvalidConfiguration(_)
            | EngineError::ResourceExhausted(_)
            | EngineError::TimeoutError(_)
            | EngineError::IoError(_)
            | EngineError::SerializationError(_)
            | EngineError::InternalError(_) => StatusCode::InternalError,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::SerializationError(err.to_string())
    }
}

// NOTE: TOML/YAML conversions intentionally absent - serialization format
// choice is an infrastructure concern, not a domain one.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_projection_covers_validation_family() {
        assert_eq!(
            EngineError::invalid_shape("rank mismatch").status_code(),
            StatusCode::InvalidShape
        );
    }

    #[test]
    fn recoverable_matches_transient_status_codes() {
        let e = EngineError::ModelVersionNotLoadedYet("dummy".into());
        assert!(e.is_recoverable());
        assert!(e.status_code().is_transient());
    }

    #[test]
    fn backend_and_internal_both_surface_as_internal_error() {
        assert_eq!(EngineError::backend_error("oom").status_code(), StatusCode::InternalError);
        assert_eq!(EngineError::internal_error("panic").status_code(), StatusCode::InternalError);
    }
}
