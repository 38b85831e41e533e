// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ModelInstance (C4)
//!
//! One loaded `(name, version)`: owns the slot pool and the compiled backend
//! model, serves `infer`, and handles reshape-reload (§4.4). The status
//! mutex doubles as the "reload-lock" of §5's resource table — every status
//! transition is taken under it, and `wait_for_available` parks on its
//! condvar rather than polling.
//!
//! Draining (waiting for `in_flight_count == 0` before a reload/retire takes
//! effect) is a bounded poll, not a condvar wait: completion callbacks run on
//! backend threads and must never try to take the status lock (§9), so they
//! can't signal a drain-specific condvar without risking exactly the
//! re-entrancy the design note warns about.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::entities::ModelVersionStatus;
use crate::repositories::backend::{BackendConfig, BackendModel, BackendRuntime, Executor};
use crate::repositories::filesystem_adapter::FileSystemAdapter;
use crate::repositories::slot_pool::{InferSlotPool, SlotPoolFactory};
use crate::value_objects::{ModelName, ModelVersion, Tensor, TensorInfo};
use crate::EngineError;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Outcome of [`ModelInstance::wait_for_available`].
pub enum AvailableOutcome {
    /// The instance was AVAILABLE; holding this token keeps it there by
    /// incrementing `in_flight_count` until the token is dropped.
    Available(AvailableToken),
    NotLoadedYet,
    NotLoadedAnymore,
}

/// RAII guard: increments `in_flight_count` on construction, decrements on
/// drop. While any token is outstanding the instance cannot leave AVAILABLE
/// (I3) — `reload`/`retire` block on the count reaching zero first.
pub struct AvailableToken {
    in_flight_count: Arc<AtomicU64>,
}

impl Drop for AvailableToken {
    fn drop(&mut self) {
        self.in_flight_count.fetch_sub(1, Ordering::SeqCst);
    }
}

struct Loaded {
    backend_model: Box<dyn BackendModel>,
    slot_pool: Arc<dyn InferSlotPool>,
}

pub struct ModelInstance {
    name: ModelName,
    version: ModelVersion,
    status: Mutex<ModelVersionStatus>,
    status_cv: Condvar,
    config: Mutex<Option<BackendConfig>>,
    loaded: Mutex<Option<Loaded>>,
    in_flight_count: Arc<AtomicU64>,
}

impl ModelInstance {
    pub fn new(name: ModelName, version: ModelVersion) -> Self {
        Self {
            name,
            version,
            status: Mutex::new(ModelVersionStatus::Start),
            status_cv: Condvar::new(),
            config: Mutex::new(None),
            loaded: Mutex::new(None),
            in_flight_count: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn name(&self) -> &ModelName {
        &self.name
    }

    pub fn version(&self) -> ModelVersion {
        self.version
    }

    pub fn status(&self) -> ModelVersionStatus {
        *self.status.lock().unwrap()
    }

    pub fn in_flight_count(&self) -> u64 {
        self.in_flight_count.load(Ordering::SeqCst)
    }

    fn transition(&self, to: ModelVersionStatus) {
        let mut guard = self.status.lock().unwrap();
        if guard.can_transition_to(to) {
            *guard = to;
            self.status_cv.notify_all();
        }
    }

    pub fn inputs(&self) -> Vec<TensorInfo> {
        self.loaded.lock().unwrap().as_ref().map(|l| l.backend_model.inputs().to_vec()).unwrap_or_default()
    }

    pub fn outputs(&self) -> Vec<TensorInfo> {
        self.loaded.lock().unwrap().as_ref().map(|l| l.backend_model.outputs().to_vec()).unwrap_or_default()
    }

    /// Drives START/LOADING_FAILED/AVAILABLE -> LOADING -> AVAILABLE|LOADING_FAILED (§4.4).
    pub async fn load(
        &self,
        fs: &dyn FileSystemAdapter,
        backend: &dyn BackendRuntime,
        slot_factory: &dyn SlotPoolFactory,
        mut config: BackendConfig,
    ) -> Result<(), EngineError> {
        self.transition(ModelVersionStatus::Loading);

        if !fs.is_directory(&config.base_path).await.unwrap_or(false) {
            // Some filesystem adapters resolve a logical URI lazily; fall through to the
            // backend, which will surface a concrete load error if the path is unusable.
        }
        config.base_path = fs.download_model_versions(&config.base_path, &[self.version]).await.unwrap_or(config.base_path.clone());

        match backend.load(&config).await {
            Ok(backend_model) => {
                let slots = backend_model.create_slots(config.nireq.get())?;
                let slot_pool = slot_factory.create(slots);
                *self.config.lock().unwrap() = Some(config);
                *self.loaded.lock().unwrap() = Some(Loaded { backend_model, slot_pool });
                self.transition(ModelVersionStatus::Available);
                Ok(())
            }
            Err(err) => {
                self.transition(ModelVersionStatus::LoadingFailed);
                Err(err)
            }
        }
    }

    /// Waits for `in_flight_count == 0`, then re-runs the load sequence
    /// (§4.4). On backend failure, attempts recovery against the previous
    /// config before giving up into LOADING_FAILED.
    pub async fn reload(
        &self,
        fs: &dyn FileSystemAdapter,
        backend: &dyn BackendRuntime,
        slot_factory: &dyn SlotPoolFactory,
        new_config: BackendConfig,
    ) -> Result<(), EngineError> {
        let previous_config = self.config.lock().unwrap().clone();
        self.transition(ModelVersionStatus::Loading);
        self.drain();

        match self.load(fs, backend, slot_factory, new_config).await {
            Ok(()) => Ok(()),
            Err(err) => {
                if let Some(prev) = previous_config {
                    self.load(fs, backend, slot_factory, prev).await
                } else {
                    Err(err)
                }
            }
        }
    }

    /// A specialized reload that only mutates shape-affecting fields (§4.4).
    pub async fn reshape(
        &self,
        fs: &dyn FileSystemAdapter,
        backend: &dyn BackendRuntime,
        slot_factory: &dyn SlotPoolFactory,
        shape_overrides: BTreeMap<String, crate::repositories::backend::ShapeMode>,
    ) -> Result<(), EngineError> {
        let mut config = self
            .config
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| EngineError::internal_error("reshape requested before first load"))?;
        config.shape_overrides = shape_overrides;
        self.reload(fs, backend, slot_factory, config).await
    }

    /// Blocking bounded-poll drain (§5, §9): spins until no token is
    /// outstanding, sleeping `DRAIN_POLL_INTERVAL` between checks.
    fn drain(&self) {
        while self.in_flight_count.load(Ordering::SeqCst) > 0 {
            std::thread::sleep(DRAIN_POLL_INTERVAL);
        }
    }

    /// Parks on the status condvar until AVAILABLE or a terminal state is
    /// reached, or `deadline` elapses. Returns a token that must be held for
    /// the duration of the caller's use of the instance (I3).
    pub fn wait_for_available(&self, deadline: Duration) -> AvailableOutcome {
        let start = std::time::Instant::now();
        let mut guard = self.status.lock().unwrap();
        loop {
            match *guard {
                ModelVersionStatus::Available => {
                    self.in_flight_count.fetch_add(1, Ordering::SeqCst);
                    return AvailableOutcome::Available(AvailableToken { in_flight_count: self.in_flight_count.clone() });
                }
                ModelVersionStatus::End => return AvailableOutcome::NotLoadedAnymore,
                ModelVersionStatus::LoadingFailed => return AvailableOutcome::NotLoadedAnymore,
                _ => {}
            }
            let elapsed = start.elapsed();
            if elapsed >= deadline {
                return AvailableOutcome::NotLoadedYet;
            }
            let (g, timeout_result) = self.status_cv.wait_timeout(guard, deadline - elapsed).unwrap();
            guard = g;
            if timeout_result.timed_out() {
                return AvailableOutcome::NotLoadedYet;
            }
        }
    }

    /// Acquires a slot, runs one inference, releases the slot (§4.4 steps
    /// 3-7). Validation (step 1) and reshape-on-demand (step 2) are the
    /// caller's responsibility (`services::request_validator`,
    /// `services::reshape_policy`) since they need sibling-model context this
    /// aggregate does not have.
    pub async fn infer(
        &self,
        inputs: BTreeMap<String, Tensor>,
        requested_outputs: Option<&[String]>,
        slot_timeout: Duration,
        infer_timeout: Duration,
    ) -> Result<BTreeMap<String, Tensor>, EngineError> {
        let slot_pool = {
            let loaded = self.loaded.lock().unwrap();
            loaded.as_ref().map(|l| l.slot_pool.clone()).ok_or_else(|| {
                EngineError::ModelVersionNotLoadedYet(format!("{}:{}", self.name, self.version))
            })?
        };

        let mut slot = slot_pool.try_acquire(slot_timeout).await?;
        let result = Self::run_one(&mut slot.executor, &inputs, requested_outputs, infer_timeout).await;
        slot_pool.release(slot);
        result
    }

    async fn run_one(
        executor: &mut Box<dyn Executor>,
        inputs: &BTreeMap<String, Tensor>,
        requested_outputs: Option<&[String]>,
        infer_timeout: Duration,
    ) -> Result<BTreeMap<String, Tensor>, EngineError> {
        for (name, tensor) in inputs {
            executor.set_input(name, tensor.clone())?;
        }
        executor.infer_async().await.map_err(|e| EngineError::backend_error(e.to_string()))?;
        executor.wait(infer_timeout).await.map_err(|e| EngineError::backend_error(e.to_string()))?;

        let mut outputs = BTreeMap::new();
        match requested_outputs {
            Some(names) => {
                for name in names {
                    outputs.insert(name.clone(), executor.get_output(name)?);
                }
            }
            None => {
                // The backend port does not enumerate produced output names without a
                // compiled model handle; callers without a filter rely on TensorInfo
                // metadata (`inputs()`/`outputs()`) to know which names to request.
            }
        }
        Ok(outputs)
    }

    /// UNLOADING -> drain -> release backend -> END (permanent) or LOADING
    /// (transient, e.g. about to be reloaded) (§4.4).
    pub fn retire(&self, permanent: bool) {
        self.transition(ModelVersionStatus::Unloading);
        self.drain();
        *self.loaded.lock().unwrap() = None;
        self.transition(if permanent { ModelVersionStatus::End } else { ModelVersionStatus::Loading });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_instance_starts_in_start_status_with_no_traffic() {
        let instance = ModelInstance::new(ModelName::new("dummy").unwrap(), ModelVersion::DEFAULT);
        assert_eq!(instance.status(), ModelVersionStatus::Start);
        assert_eq!(instance.in_flight_count(), 0);
    }

    #[test]
    fn wait_for_available_times_out_while_not_loaded() {
        let instance = ModelInstance::new(ModelName::new("dummy").unwrap(), ModelVersion::DEFAULT);
        match instance.wait_for_available(Duration::from_millis(20)) {
            AvailableOutcome::NotLoadedYet => {}
            _ => panic!("expected NotLoadedYet while status is START"),
        }
    }

    #[test]
    fn retire_permanent_reaches_end_status() {
        let instance = ModelInstance::new(ModelName::new("dummy").unwrap(), ModelVersion::DEFAULT);
        // START does not legally transition to UNLOADING; force AVAILABLE first as
        // `load()` would, to exercise the retire path in isolation.
        instance.transition(ModelVersionStatus::Loading);
        instance.transition(ModelVersionStatus::Available);
        instance.retire(true);
        assert_eq!(instance.status(), ModelVersionStatus::End);
        assert_eq!(instance.in_flight_count(), 0);
    }
}
