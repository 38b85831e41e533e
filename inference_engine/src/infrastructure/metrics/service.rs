// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics Service Implementation
//!
//! Prometheus-based metrics collection and export for inference serving.
//! Tracks request throughput and latency, slot-pool occupancy, model reload
//! counts, and pipeline executor queue depth. Thread-safe, low overhead.

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};
use std::sync::Arc;
use tracing::debug;

use inference_engine_domain::EngineError;

/// Prometheus metrics service for inference serving.
#[derive(Clone)]
pub struct MetricsService {
    registry: Arc<Registry>,

    // Request metrics
    requests_total: IntCounterVec,
    request_errors_total: IntCounterVec,
    request_duration: Histogram,

    // Slot pool metrics
    slots_in_use: IntGaugeVec,
    slots_capacity: IntGaugeVec,

    // Model lifecycle metrics
    model_reloads_total: IntCounterVec,
    model_reload_failures_total: IntCounterVec,

    // Pipeline executor metrics
    executor_queue_depth: IntGauge,
}

impl MetricsService {
    pub fn new() -> Result<Self, EngineError> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("requests_total", "Total inference requests received").namespace("inference_engine"),
            &["model", "version"],
        )
        .map_err(|e| EngineError::internal_error(format!("failed to create requests_total metric: {e}")))?;

        let request_errors_total = IntCounterVec::new(
            Opts::new("request_errors_total", "Total inference requests that returned a non-OK status")
                .namespace("inference_engine"),
            &["model", "version", "status"],
        )
        .map_err(|e| EngineError::internal_error(format!("failed to create request_errors_total metric: {e}")))?;

        let request_duration = Histogram::with_opts(
            HistogramOpts::new("request_duration_seconds", "Time spent serving an inference request")
                .namespace("inference_engine")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )
        .map_err(|e| EngineError::internal_error(format!("failed to create request_duration metric: {e}")))?;

        let slots_in_use = IntGaugeVec::new(
            Opts::new("slots_in_use", "Inference slots currently checked out").namespace("inference_engine"),
            &["model", "version"],
        )
        .map_err(|e| EngineError::internal_error(format!("failed to create slots_in_use metric: {e}")))?;

        let slots_capacity = IntGaugeVec::new(
            Opts::new("slots_capacity", "Total inference slots configured for a model version").namespace("inference_engine"),
            &["model", "version"],
        )
        .map_err(|e| EngineError::internal_error(format!("failed to create slots_capacity metric: {e}")))?;

        let model_reloads_total = IntCounterVec::new(
            Opts::new("model_reloads_total", "Total successful model version reloads").namespace("inference_engine"),
            &["model", "version"],
        )
        .map_err(|e| EngineError::internal_error(format!("failed to create model_reloads_total metric: {e}")))?;

        let model_reload_failures_total = IntCounterVec::new(
            Opts::new("model_reload_failures_total", "Total failed model version reloads").namespace("inference_engine"),
            &["model", "version"],
        )
        .map_err(|e| EngineError::internal_error(format!("failed to create model_reload_failures_total metric: {e}")))?;

        let executor_queue_depth = IntGauge::with_opts(
            Opts::new("executor_queue_depth", "Pending node-dispatch events across all active pipeline executions")
                .namespace("inference_engine"),
        )
        .map_err(|e| EngineError::internal_error(format!("failed to create executor_queue_depth metric: {e}")))?;

        for metric in [
            Box::new(requests_total.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(request_errors_total.clone()),
            Box::new(request_duration.clone()),
            Box::new(slots_in_use.clone()),
            Box::new(slots_capacity.clone()),
            Box::new(model_reloads_total.clone()),
            Box::new(model_reload_failures_total.clone()),
            Box::new(executor_queue_depth.clone()),
        ] {
            registry.register(metric).map_err(|e| EngineError::internal_error(format!("failed to register metric: {e}")))?;
        }

        debug!("metrics service initialized");

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            request_errors_total,
            request_duration,
            slots_in_use,
            slots_capacity,
            model_reloads_total,
            model_reload_failures_total,
            executor_queue_depth,
        })
    }

    pub fn record_request(&self, model: &str, version: &str, duration: std::time::Duration) {
        self.requests_total.with_label_values(&[model, version]).inc();
        self.request_duration.observe(duration.as_secs_f64());
    }

    pub fn record_request_error(&self, model: &str, version: &str, status: &str) {
        self.request_errors_total.with_label_values(&[model, version, status]).inc();
    }

    pub fn set_slot_occupancy(&self, model: &str, version: &str, in_use: u64, capacity: u64) {
        self.slots_in_use.with_label_values(&[model, version]).set(in_use as i64);
        self.slots_capacity.with_label_values(&[model, version]).set(capacity as i64);
    }

    pub fn record_model_reload(&self, model: &str, version: &str) {
        self.model_reloads_total.with_label_values(&[model, version]).inc();
    }

    pub fn record_model_reload_failure(&self, model: &str, version: &str) {
        self.model_reload_failures_total.with_label_values(&[model, version]).inc();
    }

    pub fn set_executor_queue_depth(&self, depth: u64) {
        self.executor_queue_depth.set(depth as i64);
    }

    pub fn get_metrics(&self) -> Result<String, EngineError> {
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .map_err(|e| EngineError::internal_error(format!("failed to encode metrics: {e}")))
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }
}

impl Default for MetricsService {
    fn default() -> Self {
        Self::new().expect("failed to create default MetricsService")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_service_exposes_registered_metric_names() {
        let service = MetricsService::new().unwrap();
        let output = service.get_metrics().unwrap();
        assert!(output.contains("inference_engine_requests_total"));
        assert!(output.contains("inference_engine_request_duration_seconds"));
        assert!(output.contains("inference_engine_slots_in_use"));
    }

    #[test]
    fn recording_a_request_increments_its_counter() {
        let service = MetricsService::new().unwrap();
        service.record_request("dummy", "1", std::time::Duration::from_millis(5));
        let output = service.get_metrics().unwrap();
        assert!(output.contains("model=\"dummy\""));
        assert!(output.contains("inference_engine_requests_total{model=\"dummy\",version=\"1\"} 1"));
    }

    #[test]
    fn slot_occupancy_reports_the_last_value_set() {
        let service = MetricsService::new().unwrap();
        service.set_slot_occupancy("dummy", "1", 2, 4);
        let output = service.get_metrics().unwrap();
        assert!(output.contains("inference_engine_slots_in_use{model=\"dummy\",version=\"1\"} 2"));
        assert!(output.contains("inference_engine_slots_capacity{model=\"dummy\",version=\"1\"} 4"));
    }
}
