// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Sequence janitor
//!
//! Background sweeper for stateful-model sequence state. Orthogonal to the
//! core inference path: nothing in `ModelInstance` or `Pipeline` depends on
//! this, it only exists so a stateful model's per-sequence state doesn't
//! grow unbounded when a client abandons a sequence without closing it.
//!
//! Runs on its own interval, independent of request traffic.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// Tracks the last-touched time of every open sequence, keyed by the
/// caller-assigned sequence id.
#[derive(Default)]
struct SequenceTable {
    last_seen: HashMap<u64, Instant>,
}

impl SequenceTable {
    fn touch(&mut self, sequence_id: u64, now: Instant) {
        self.last_seen.insert(sequence_id, now);
    }

    fn remove(&mut self, sequence_id: u64) {
        self.last_seen.remove(&sequence_id);
    }

    fn retire_idle(&mut self, idle_timeout: Duration, now: Instant) -> Vec<u64> {
        let expired: Vec<u64> = self
            .last_seen
            .iter()
            .filter(|(_, seen)| now.duration_since(**seen) >= idle_timeout)
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            self.last_seen.remove(id);
        }
        expired
    }
}

/// Background task that evicts sequences idle for longer than
/// `idle_timeout`, sweeping every `sweep_interval`.
pub struct SequenceJanitor {
    table: Arc<Mutex<SequenceTable>>,
    idle_timeout: Duration,
    sweep_interval: Duration,
}

impl SequenceJanitor {
    pub fn new(idle_timeout: Duration, sweep_interval: Duration) -> Self {
        Self { table: Arc::new(Mutex::new(SequenceTable::default())), idle_timeout, sweep_interval }
    }

    /// Records activity on `sequence_id`, resetting its idle clock.
    pub fn touch(&self, sequence_id: u64) {
        self.table.lock().touch(sequence_id, Instant::now());
    }

    /// Removes a sequence explicitly, e.g. when a client closes it.
    pub fn close(&self, sequence_id: u64) {
        self.table.lock().remove(sequence_id);
    }

    /// Runs one sweep immediately, returning the ids retired.
    pub fn retire_idle(&self) -> Vec<u64> {
        self.table.lock().retire_idle(self.idle_timeout, Instant::now())
    }

    /// Spawns the sweep loop on its own interval. The returned handle can be
    /// aborted on shutdown; dropping it does not stop the task.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        let janitor = self;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(janitor.sweep_interval);
            loop {
                interval.tick().await;
                let retired = janitor.retire_idle();
                if !retired.is_empty() {
                    tracing::debug!(count = retired.len(), "retired idle sequences");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_sequence_is_retired_after_timeout() {
        let mut table = SequenceTable::default();
        let t0 = Instant::now();
        table.touch(1, t0);
        assert!(table.retire_idle(Duration::from_millis(50), t0).is_empty());
        let later = t0 + Duration::from_millis(60);
        assert_eq!(table.retire_idle(Duration::from_millis(50), later), vec![1]);
    }

    #[test]
    fn touch_resets_the_idle_clock() {
        let mut table = SequenceTable::default();
        let t0 = Instant::now();
        table.touch(1, t0);
        let mid = t0 + Duration::from_millis(30);
        table.touch(1, mid);
        let later = t0 + Duration::from_millis(60);
        assert!(table.retire_idle(Duration::from_millis(50), later).is_empty());
    }

    #[test]
    fn closed_sequence_is_not_retired() {
        let mut table = SequenceTable::default();
        let t0 = Instant::now();
        table.touch(1, t0);
        table.remove(1);
        let later = t0 + Duration::from_millis(100);
        assert!(table.retire_idle(Duration::from_millis(50), later).is_empty());
    }

    #[tokio::test]
    async fn janitor_reports_zero_sequences_idle_with_nothing_tracked() {
        let janitor = SequenceJanitor::new(Duration::from_millis(10), Duration::from_millis(5));
        assert!(janitor.retire_idle().is_empty());
    }
}
