// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Repositories / Ports
//!
//! Interfaces through which the domain reaches the outside world (§6):
//! backend compilation, slot pooling, polled configuration, filesystem
//! staging, custom-loader plugins, and binary-input decoding. Concrete
//! implementations live in the engine crate's `infrastructure` module; this
//! crate only specifies the contract.

pub mod backend;
pub mod config_source;
pub mod custom_loader;
pub mod filesystem_adapter;
pub mod image_decoder;
pub mod slot_pool;

pub use backend::{BackendConfig, BackendModel, BackendRuntime, BatchMode, Executor, ShapeMode};
pub use config_source::{ConfigSource, CustomLoaderEntry, EngineConfig, ModelConfigEntry, PipelineConfigEntry};
pub use custom_loader::{CustomLoader, CustomLoaderRegistry, InMemoryCustomLoaderRegistry};
pub use filesystem_adapter::FileSystemAdapter;
pub use image_decoder::ImageDecoder;
pub use slot_pool::{InferSlotPool, Slot, SlotPoolFactory};
