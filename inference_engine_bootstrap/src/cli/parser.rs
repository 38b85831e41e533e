// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI structure (clap derive)
//!
//! `serve` is the primary mode (start the engine and poll its config
//! source); `validate-config`, `show-model`, `show-pipeline` are one-shot
//! utility commands that load a config file and report without serving.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "model_server", version, about = "Model-serving orchestration engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the engine's runtime settings file (bind address, timeouts).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Pretty)]
    pub log_format: LogFormatArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start serving: poll the model/pipeline config source, run the
    /// executor loop, the sequence janitor, and the metrics endpoint.
    Serve {
        /// Path to the polled model/pipeline config file (models, pipelines,
        /// custom loaders).
        #[arg(long)]
        model_config: PathBuf,

        /// Address the Prometheus metrics/health endpoint binds to.
        #[arg(long)]
        bind_address: Option<String>,
    },
    /// Parse and validate a model/pipeline config file without serving.
    ValidateConfig {
        #[arg(long)]
        model_config: PathBuf,
    },
    /// Print a model's discovered versions and their load status.
    ShowModel {
        name: String,
        #[arg(long)]
        model_config: PathBuf,
    },
    /// Print a pipeline definition's nodes, connections, and validation status.
    ShowPipeline {
        name: String,
        #[arg(long)]
        model_config: PathBuf,
    },
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_internally_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_requires_model_config() {
        let result = Cli::try_parse_from(["model_server", "serve"]);
        assert!(result.is_err());
    }

    #[test]
    fn serve_parses_with_model_config() {
        let cli = Cli::try_parse_from(["model_server", "serve", "--model-config", "config.yaml"]).unwrap();
        match cli.command {
            Commands::Serve { model_config, .. } => assert_eq!(model_config, PathBuf::from("config.yaml")),
            other => panic!("expected Serve, got {other:?}"),
        }
    }
}
