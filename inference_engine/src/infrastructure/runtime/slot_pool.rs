// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Tokio-backed InferSlotPool (C2)
//!
//! Implements the bounded, FIFO-fair slot pool the domain crate only names
//! as a port (`inference_engine_domain::repositories::slot_pool`). Capacity
//! is gated by a `tokio::sync::Semaphore`; the free executors themselves
//! live behind a `parking_lot::Mutex<VecDeque<_>>` so `release` never has to
//! `.await`.
//!
//! Fairness: `Semaphore::acquire` already serves waiters in FIFO arrival
//! order, so a pending acquirer is never jumped by one that arrives later
//! (I2, §8 property 2).

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use inference_engine_domain::repositories::backend::Executor;
use inference_engine_domain::repositories::slot_pool::{InferSlotPool, Slot, SlotPoolFactory};
use inference_engine_domain::EngineError;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

pub struct TokioSlotPool {
    capacity: u32,
    semaphore: Arc<Semaphore>,
    free: Mutex<VecDeque<Slot>>,
}

impl TokioSlotPool {
    pub fn new(executors: Vec<Box<dyn Executor>>) -> Self {
        let capacity = executors.len() as u32;
        let free = executors
            .into_iter()
            .enumerate()
            .map(|(i, executor)| Slot { index: i as u32, executor })
            .collect();
        Self { capacity, semaphore: Arc::new(Semaphore::new(capacity as usize)), free: Mutex::new(free) }
    }
}

#[async_trait]
impl InferSlotPool for TokioSlotPool {
    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn free_count(&self) -> u32 {
        self.semaphore.available_permits() as u32
    }

    async fn try_acquire(&self, timeout: Duration) -> Result<Slot, EngineError> {
        let permit = tokio::time::timeout(timeout, self.semaphore.clone().acquire_owned())
            .await
            .map_err(|_| EngineError::TimeoutError("no free inference slot within timeout".to_string()))?
            .map_err(|_| EngineError::internal_error("slot pool semaphore closed"))?;

        // Permit accounting is done by the semaphore; the slot itself comes
        // off the free list. `forget` hands bookkeeping back to `release`,
        // which re-adds a permit when the slot returns.
        permit.forget();
        let slot = self
            .free
            .lock()
            .pop_front()
            .expect("semaphore admitted a waiter but the free list was empty");
        Ok(slot)
    }

    fn release(&self, slot: Slot) {
        self.free.lock().push_back(slot);
        self.semaphore.add_permits(1);
    }
}

pub struct TokioSlotPoolFactory;

impl SlotPoolFactory for TokioSlotPoolFactory {
    fn create(&self, executors: Vec<Box<dyn Executor>>) -> Arc<dyn InferSlotPool> {
        Arc::new(TokioSlotPool::new(executors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_engine_domain::value_objects::Tensor;

    struct NoopExecutor;

    #[async_trait]
    impl Executor for NoopExecutor {
        fn set_input(&mut self, _name: &str, _tensor: Tensor) -> Result<(), EngineError> {
            Ok(())
        }
        fn get_output(&self, _name: &str) -> Result<Tensor, EngineError> {
            Err(EngineError::internal_error("no output"))
        }
        async fn infer_async(&mut self) -> Result<(), EngineError> {
            Ok(())
        }
        async fn wait(&mut self, _timeout: Duration) -> Result<(), EngineError> {
            Ok(())
        }
    }

    fn pool(n: usize) -> TokioSlotPool {
        TokioSlotPool::new((0..n).map(|_| Box::new(NoopExecutor) as Box<dyn Executor>).collect())
    }

    #[tokio::test]
    async fn acquire_and_release_round_trips_capacity() {
        let pool = pool(2);
        assert_eq!(pool.free_count(), 2);
        let slot = pool.try_acquire(Duration::from_millis(50)).await.unwrap();
        assert_eq!(pool.free_count(), 1);
        pool.release(slot);
        assert_eq!(pool.free_count(), 2);
    }

    #[tokio::test]
    async fn acquire_times_out_when_exhausted() {
        let pool = pool(1);
        let _slot = pool.try_acquire(Duration::from_millis(50)).await.unwrap();
        let err = pool.try_acquire(Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, EngineError::TimeoutError(_)));
    }

    #[tokio::test]
    async fn released_slot_is_available_to_next_waiter() {
        let pool = Arc::new(pool(1));
        let slot = pool.try_acquire(Duration::from_millis(50)).await.unwrap();
        let pool2 = pool.clone();
        let waiter = tokio::spawn(async move { pool2.try_acquire(Duration::from_millis(200)).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        pool.release(slot);
        assert!(waiter.await.unwrap().is_ok());
    }
}
