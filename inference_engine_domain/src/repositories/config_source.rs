// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Config source (§6)
//!
//! Polled configuration: model entries, pipeline entries, and custom-loader
//! entries. The domain defines the DTO shapes and the polling port;
//! file/YAML/cloud-source parsing is an infrastructure concern (engine
//! crate's `infrastructure::config`).

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entities::{Connection, NodeInfo};
use crate::repositories::backend::{BatchMode, ShapeMode};
use crate::value_objects::{Layout, ModelName, Nireq, PipelineName, VersionPolicy};
use crate::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfigEntry {
    pub name: ModelName,
    pub base_path: String,
    pub device: String,
    pub batch: BatchMode,
    pub nireq: Nireq,
    pub shape_overrides: BTreeMap<String, ShapeMode>,
    pub layout_overrides: BTreeMap<String, Layout>,
    pub plugin_config: BTreeMap<String, String>,
    pub version_policy: VersionPolicy,
    pub stateful: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOutputEntry {
    pub alias: String,
    pub source_node: crate::value_objects::NodeName,
    pub source_output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfigEntry {
    pub name: PipelineName,
    pub inputs: Vec<String>,
    pub nodes: Vec<NodeInfo>,
    pub connections: Vec<Connection>,
    pub outputs: Vec<PipelineOutputEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomLoaderEntry {
    pub loader_name: String,
    pub library_path: String,
    pub config_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    pub models: Vec<ModelConfigEntry>,
    pub pipelines: Vec<PipelineConfigEntry>,
    pub custom_loaders: Vec<CustomLoaderEntry>,
}

/// A polled source of [`EngineConfig`] snapshots. `poll_interval` is
/// configurable in whole seconds (§6).
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn poll(&self) -> Result<EngineConfig, EngineError>;
    fn poll_interval(&self) -> Duration;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_config_default_is_empty() {
        let cfg = EngineConfig::default();
        assert!(cfg.models.is_empty());
        assert!(cfg.pipelines.is_empty());
        assert!(cfg.custom_loaders.is_empty());
    }
}
