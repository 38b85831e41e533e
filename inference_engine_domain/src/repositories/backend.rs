// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Backend binding (C3)
//!
//! The opaque adapter onto the native inference engine: compiles a model,
//! produces slot-bound executors, exposes input/output metadata (§4.3). The
//! domain never sees device targeting, plugin configuration, or remote-tensor
//! contexts directly; those travel through [`BackendConfig::plugin_config`]
//! unexamined.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::value_objects::{Layout, Nireq, Shape, Tensor, TensorInfo};
use crate::EngineError;

/// Batch-size handling mode for a model entry (§6 config source).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchMode {
    Fixed(u64),
    Auto,
}

/// Shape handling mode for a single named input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeMode {
    Fixed(Shape),
    Auto,
}

/// Everything a [`BackendRuntime`] needs to compile a model version. Device
/// targeting and plugin-specific knobs are passed through as opaque strings;
/// the domain does not interpret them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_path: String,
    pub device: String,
    pub batch: BatchMode,
    pub shape_overrides: BTreeMap<String, ShapeMode>,
    pub layout_overrides: BTreeMap<String, Layout>,
    pub plugin_config: BTreeMap<String, String>,
    pub nireq: Nireq,
}

impl BackendConfig {
    /// True when any shape-affecting field differs, matching the
    /// `reload`-set predicate of §4.6.
    pub fn shape_affecting_diff(&self, other: &Self) -> bool {
        self.base_path != other.base_path
            || self.device != other.device
            || self.batch != other.batch
            || self.shape_overrides != other.shape_overrides
            || self.layout_overrides != other.layout_overrides
            || self.plugin_config != other.plugin_config
    }
}

/// A compiled model handle, bound to one `(name, version)`. Returned by
/// [`BackendRuntime::load`].
#[async_trait]
pub trait BackendModel: Send + Sync {
    fn inputs(&self) -> &[TensorInfo];
    fn outputs(&self) -> &[TensorInfo];

    /// Recompiles with new shapes (§4.3). A specialized reload; the caller
    /// (`ModelInstance::reshape`) is responsible for draining in-flight work
    /// first.
    async fn reshape(&self, overrides: &BTreeMap<String, Shape>) -> Result<(), EngineError>;

    /// Materializes `n` slot-bound executors, one per `InferSlotPool` slot.
    fn create_slots(&self, n: u32) -> Result<Vec<Box<dyn Executor>>, EngineError>;
}

/// One slot's worth of inference capability (§4.3). Not `Sync`: a slot is
/// exclusively owned by whichever caller holds the corresponding pool token.
#[async_trait]
pub trait Executor: Send {
    fn set_input(&mut self, name: &str, tensor: Tensor) -> Result<(), EngineError>;
    fn get_output(&self, name: &str) -> Result<Tensor, EngineError>;

    /// Dispatches inference; returns once the backend has accepted the
    /// request, not once it has completed (§4.12 — asynchronous DLNode).
    async fn infer_async(&mut self) -> Result<(), EngineError>;

    /// Blocks (cooperatively) until the dispatched inference completes or
    /// `timeout` elapses.
    async fn wait(&mut self, timeout: Duration) -> Result<(), EngineError>;
}

/// Compiles models for one device/runtime family. Implementations live in
/// the engine crate's `infrastructure::backend` (dummy backend for tests, a
/// custom-loader-backed backend for the plugin ABI).
#[async_trait]
pub trait BackendRuntime: Send + Sync {
    async fn load(&self, config: &BackendConfig) -> Result<Box<dyn BackendModel>, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_path: &str) -> BackendConfig {
        BackendConfig {
            base_path: base_path.to_string(),
            device: "CPU".to_string(),
            batch: BatchMode::Fixed(1),
            shape_overrides: BTreeMap::new(),
            layout_overrides: BTreeMap::new(),
            plugin_config: BTreeMap::new(),
            nireq: Nireq::default(),
        }
    }

    #[test]
    fn shape_affecting_diff_detects_base_path_change() {
        let a = config("/models/dummy/1");
        let b = config("/models/dummy/2");
        assert!(a.shape_affecting_diff(&b));
    }

    #[test]
    fn identical_configs_have_no_shape_affecting_diff() {
        let a = config("/models/dummy/1");
        let b = config("/models/dummy/1");
        assert!(!a.shape_affecting_diff(&b));
    }
}
