// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Show-pipeline use case
//!
//! `model_server show-pipeline <name> <file>`: parses the config file,
//! builds the named [`PipelineDefinition`] the same way [`PipelineRegistry`]
//! would, validates it against a [`ConfiguredModelCatalog`], and prints its
//! node/connection structure and resulting status. One-shot; does not touch
//! a live registry.

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use inference_engine_domain::aggregates::PipelineDefinition;

use crate::application::services::pipeline_registry::ConfiguredModelCatalog;
use crate::application::use_cases::validate_config::load_engine_config;

pub struct ShowPipelineUseCase;

impl ShowPipelineUseCase {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(&self, pipeline_name: String, config_path: PathBuf) -> Result<()> {
        info!(pipeline = %pipeline_name, path = %config_path.display(), "showing pipeline");

        let engine_config = load_engine_config(&config_path).await?;
        let entry = engine_config
            .pipelines
            .iter()
            .find(|p| p.name.as_str() == pipeline_name)
            .ok_or_else(|| anyhow::anyhow!("pipeline '{pipeline_name}' not found in '{}'", config_path.display()))?;

        let catalog = ConfiguredModelCatalog::new(&engine_config.models);
        let definition = PipelineDefinition::new(entry.name.clone(), entry.nodes.clone(), entry.connections.clone());
        let validation = definition.validate(&catalog);

        println!("\n=== Pipeline '{}' ===", entry.name);
        println!("Status: {:?}", definition.status());
        println!("Inputs: {}", entry.inputs.join(", "));

        println!("\nNodes ({}):", entry.nodes.len());
        for node in &entry.nodes {
            match (&node.model_name, node.model_version) {
                (Some(model_name), Some(version)) => {
                    println!("  {} ({:?}) -> {} v{}", node.name, node.kind, model_name, version.get())
                }
                _ => println!("  {} ({:?})", node.name, node.kind),
            }
            if node.is_demultiplex() {
                println!("    demultiplex: {:?}", node.demultiply_count);
            }
            if let Some(sources) = &node.gather_from {
                println!("    gathers from: {}", sources.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", "));
            }
        }

        println!("\nConnections ({}):", entry.connections.len());
        for connection in &entry.connections {
            println!("  {}.{} -> {}.{}", connection.from_node, connection.from_output, connection.to_node, connection.to_input);
        }

        match validation {
            Ok(()) => println!("\nvalidation: OK"),
            Err(err) => {
                println!("\nvalidation: FAILED - {err}");
                return Err(anyhow::anyhow!(err));
            }
        }

        Ok(())
    }
}

impl Default for ShowPipelineUseCase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("inference_engine_show_pipeline_test_{}_{name}", std::process::id()))
    }

    #[tokio::test]
    async fn unknown_pipeline_name_is_an_error() {
        let path = scratch_path("empty.yaml");
        std::fs::write(&path, "models: []\npipelines: []\ncustom_loaders: []\n").unwrap();
        let use_case = ShowPipelineUseCase::new();
        assert!(use_case.execute("nope".to_string(), path.clone()).await.is_err());
        let _ = std::fs::remove_file(&path);
    }
}
