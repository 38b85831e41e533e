// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling with security-first design.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. parser::parse()                 │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validator::validate()           │  Security validation
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                    │  Safe, validated config
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `parser` - CLI structure and clap parsing
//! - `validator` - Security validation layer

pub mod parser;
pub mod validator;

pub use parser::{parse_cli, Cli, Commands, LogFormatArg};
pub use validator::{ParseError, SecureArgParser};

use std::path::PathBuf;

/// Validated CLI configuration: every path has been existence/injection
/// checked, every command-specific value range-checked.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub config: Option<PathBuf>,
    pub log_format: LogFormatArg,
}

#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Serve { model_config: PathBuf, bind_address: Option<String> },
    ValidateConfig { model_config: PathBuf },
    ShowModel { name: String, model_config: PathBuf },
    ShowPipeline { name: String, model_config: PathBuf },
}

pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = parse_cli();
    validate_cli(cli)
}

fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let config = if let Some(ref path) = cli.config {
        Some(SecureArgParser::validate_path(&path.to_string_lossy())?)
    } else {
        None
    };

    let command = match cli.command {
        Commands::Serve { model_config, bind_address } => {
            let validated_model_config = SecureArgParser::validate_path(&model_config.to_string_lossy())?;
            if let Some(ref addr) = bind_address {
                SecureArgParser::validate_argument(addr)?;
            }
            ValidatedCommand::Serve { model_config: validated_model_config, bind_address }
        }
        Commands::ValidateConfig { model_config } => {
            let validated = SecureArgParser::validate_path(&model_config.to_string_lossy())?;
            ValidatedCommand::ValidateConfig { model_config: validated }
        }
        Commands::ShowModel { name, model_config } => {
            SecureArgParser::validate_argument(&name)?;
            let validated = SecureArgParser::validate_path(&model_config.to_string_lossy())?;
            ValidatedCommand::ShowModel { name, model_config: validated }
        }
        Commands::ShowPipeline { name, model_config } => {
            SecureArgParser::validate_argument(&name)?;
            let validated = SecureArgParser::validate_path(&model_config.to_string_lossy())?;
            ValidatedCommand::ShowPipeline { name, model_config: validated }
        }
    };

    Ok(ValidatedCli { command, verbose: cli.verbose, config, log_format: cli.log_format })
}
