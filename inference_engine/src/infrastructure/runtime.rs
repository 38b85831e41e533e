// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Runtime
//!
//! The tokio-backed pieces the domain crate can only name as ports: the
//! bounded inference slot pool (C2), the DAG pipeline executor loop (C12),
//! and the sequence-state janitor that backs the streaming open question
//! in §9.

pub mod executor_loop;
pub mod sequence_janitor;
pub mod slot_pool;

pub use executor_loop::PipelineExecutor;
pub use sequence_janitor::SequenceJanitor;
pub use slot_pool::{TokioSlotPool, TokioSlotPoolFactory};
