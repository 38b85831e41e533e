// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Use cases
//!
//! One module per CLI subcommand
//! (`inference_engine_bootstrap::cli::ValidatedCommand`), plus `predict`.
//! `serve` runs the long-lived server, keeping [`ModelRegistry`] and
//! [`PipelineRegistry`] converged with polled config;
//! `show_model`/`show_pipeline`/`validate_config` are one-shot inspections
//! against a config file, using
//! [`ConfiguredModelCatalog`](crate::application::services::pipeline_registry::ConfiguredModelCatalog)
//! so they need no live backend. `predict` has no CLI surface of its own -
//! it is the `Client -> RequestValidator -> (ModelInstance | Pipeline)` seam
//! a wire-protocol front end (out of scope here) would embed alongside
//! `serve`'s registries to call into.
//!
//! [`ModelRegistry`]: crate::application::services::ModelRegistry
//! [`PipelineRegistry`]: crate::application::services::PipelineRegistry

pub mod predict;
pub mod serve;
pub mod show_model;
pub mod show_pipeline;
pub mod validate_config;

pub use predict::PredictUseCase;
pub use serve::ServeUseCase;
pub use show_model::ShowModelUseCase;
pub use show_pipeline::ShowPipelineUseCase;
pub use validate_config::ValidateConfigUseCase;
