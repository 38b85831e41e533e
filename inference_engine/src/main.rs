// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `model_server`: parses and validates CLI args through
//! `inference_engine_bootstrap`, initializes logging and the process-wide
//! `RuntimeConfig`, then dispatches to one of the four use cases. `serve`
//! runs until a termination signal arrives, then waits out
//! `BootstrapConfig::grace_period` for a clean stop before returning; the
//! other three run once and exit.

use inference_engine::application::use_cases::{ServeUseCase, ShowModelUseCase, ShowPipelineUseCase, ValidateConfigUseCase};
use inference_engine::infrastructure::config::{init_runtime_config, RuntimeConfig};
use inference_engine::infrastructure::logging::{init_logging, LogFormat};
use inference_engine_bootstrap::cli::LogFormatArg;
use inference_engine_bootstrap::config::BootstrapConfig;
use inference_engine_bootstrap::shutdown::ShutdownCoordinator;
use inference_engine_bootstrap::signals::spawn_signal_handler;
use inference_engine_bootstrap::{bootstrap_cli, result_to_exit_code, ValidatedCommand};

/// Wraps an [`anyhow::Error`] so it can flow through
/// `inference_engine_bootstrap::result_to_exit_code`, which needs a
/// concrete `std::error::Error` type.
#[derive(Debug)]
struct AppError(anyhow::Error);

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let validated_cli = match bootstrap_cli() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("error: {err}");
            return std::process::ExitCode::from(64); // EX_USAGE
        }
    };

    let bootstrap_config = BootstrapConfig::from_validated_cli(&validated_cli);

    let log_format = match bootstrap_config.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Json => LogFormat::Json,
    };
    let default_level = if bootstrap_config.verbose { "debug" } else { "info" };
    if init_logging(default_level, log_format).is_err() {
        eprintln!("warning: tracing subscriber already initialized");
    }

    let runtime_config = match RuntimeConfig::load(validated_cli.config.as_ref().and_then(|p| p.to_str())) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: failed to load runtime config: {err}");
            return std::process::ExitCode::from(78); // EX_CONFIG
        }
    };
    if init_runtime_config(runtime_config).is_err() {
        eprintln!("warning: runtime config already initialized");
    }

    let result: Result<(), AppError> = run(validated_cli.command, &bootstrap_config).await.map_err(AppError::from);
    result_to_exit_code(result)
}

async fn run(command: ValidatedCommand, bootstrap_config: &BootstrapConfig) -> anyhow::Result<()> {
    match command {
        ValidatedCommand::Serve { model_config, .. } => {
            let coordinator = ShutdownCoordinator::new(bootstrap_config.grace_period);
            let signal_handle = spawn_signal_handler(coordinator.clone());

            // `execute` only returns once its own background tasks have been
            // told to stop, so there's nothing left to wait out here.
            let serve_result =
                ServeUseCase::new().execute(model_config, Some(bootstrap_config.metrics_bind_address.clone()), coordinator.token()).await;

            signal_handle.abort();
            serve_result
        }
        ValidatedCommand::ValidateConfig { model_config } => ValidateConfigUseCase::new().execute(model_config).await,
        ValidatedCommand::ShowModel { name, model_config } => ShowModelUseCase::new().execute(name, model_config).await,
        ValidatedCommand::ShowPipeline { name, model_config } => ShowPipelineUseCase::new().execute(name, model_config).await,
    }
}
