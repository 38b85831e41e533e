// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Inference Engine
//!
//! A model-serving orchestration engine: model-version lifecycle, a bounded
//! inference-slot pool, and a DAG pipeline executor with demultiplex/gather
//! support, fronted by an in-process dummy inference backend.
//!
//! ## Architecture Overview
//!
//! The engine follows Clean Architecture and Domain-Driven Design principles
//! across three crates:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              inference_engine_bootstrap                     │
//! │  (CLI parsing, signal handling, shutdown coordination)       │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Application Layer (this crate)              │
//! │  (Use Cases, ModelRegistry, PipelineRegistry)                │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │           inference_engine_domain (Domain Layer)             │
//! │  (Entities, Value Objects, Domain Services)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Infrastructure Layer (this crate)               │
//! │  (Backend, Config/Filesystem adapters, Runtime, Metrics)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Concepts
//!
//! ### Models
//! A model is a named, versioned unit the engine loads through a
//! [`inference_engine_domain::repositories::backend::BackendRuntime`]. Its
//! discovered on-disk versions are filtered through a
//! [`inference_engine_domain::value_objects::VersionPolicy`], and each
//! selected version transitions through
//! [`inference_engine_domain::entities::ModelVersionStatus`] as it loads,
//! serves, and is retired.
//!
//! ### Pipelines
//! A pipeline definition is a DAG of nodes (entry, inference, demultiplex,
//! gather, exit) connected by typed edges. [`PipelineExecutor`] drives
//! individual pipeline instances through that graph, resolving each
//! inference node's model binding through a
//! [`inference_engine_domain::repositories::backend::BackendRuntime`]-backed
//! [`ModelLookup`].
//!
//! [`PipelineExecutor`]: crate::infrastructure::runtime::PipelineExecutor
//! [`ModelLookup`]: crate::infrastructure::runtime::executor_loop::ModelLookup
//!
//! ### Inference slots
//! Concurrency into a loaded model is bounded by a slot pool
//! ([`inference_engine_domain::repositories::slot_pool::InferSlotPool`]);
//! requests that can't acquire a slot within the configured timeout fail
//! rather than queueing unbounded.
//!
//! ## Error Handling
//!
//! Domain operations return
//! [`inference_engine_domain::EngineError`]; the CLI use cases wrap that (and
//! any infrastructure failure) in `anyhow::Error`, and `model_server`'s
//! `main` maps the final result onto a `sysexits.h` exit code via
//! `inference_engine_bootstrap::result_to_exit_code`.
//!
//! ## Observability
//!
//! Structured logging goes through `tracing`
//! ([`infrastructure::logging::init_logging`]); Prometheus metrics are
//! served by [`infrastructure::metrics::MetricsEndpoint`] alongside a
//! `/health` check.

pub mod application;
pub mod infrastructure;

// Tests are organized as:
// - Unit tests: #[cfg(test)] modules within each source file
// - Integration tests: separate files in tests/ directory
