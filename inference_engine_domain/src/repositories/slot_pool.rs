// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # InferSlotPool (C2)
//!
//! A bounded pool of inference-request slots per model version (§4.2). The
//! domain only names the port; the FIFO-fair, condvar/timeout-based
//! implementation lives in the engine crate (`infrastructure::runtime::slot_pool`)
//! since it is naturally expressed against a tokio runtime.

use std::time::Duration;

use async_trait::async_trait;

use crate::repositories::backend::Executor;
use crate::EngineError;

/// An owned slot: an integer handle in `0..nireq` plus its bound executor.
/// Dropping a `Slot` without returning it through [`InferSlotPool::release`]
/// leaks capacity; callers are expected to wrap it in a `ScopedSlot` guard at
/// the call site.
pub struct Slot {
    pub index: u32,
    pub executor: Box<dyn Executor>,
}

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot").field("index", &self.index).finish()
    }
}

/// Bounded concurrency per `ModelInstance` (§4.2, I2). Waiters are served in
/// FIFO wait-entry order; a pending acquirer is never starved by later
/// arrivals.
#[async_trait]
pub trait InferSlotPool: Send + Sync {
    fn capacity(&self) -> u32;

    /// Currently-free slot count; `free_count() + outstanding == capacity`
    /// at every external observation point (I2, §8 property 2).
    fn free_count(&self) -> u32;

    /// Blocks up to `timeout` for a free slot, FIFO among waiters.
    async fn try_acquire(&self, timeout: Duration) -> Result<Slot, EngineError>;

    /// Returns a slot to the pool, waking the oldest waiter.
    fn release(&self, slot: Slot);
}

/// Builds a pool's concrete (FIFO, condvar/timeout) implementation from a
/// freshly compiled model's executors. Kept as a port so `ModelInstance`
/// (domain) can own an `Arc<dyn InferSlotPool>` without depending on the
/// tokio-backed implementation that produces it.
pub trait SlotPoolFactory: Send + Sync {
    fn create(&self, executors: Vec<Box<dyn Executor>>) -> std::sync::Arc<dyn InferSlotPool>;
}
