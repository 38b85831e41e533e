//! Integration Tests
//!
//! This module aggregates all integration tests for the inference engine.

#[path = "integration/engine_pipeline_test.rs"]
mod engine_pipeline_test;

#[path = "integration/config_apply_test.rs"]
mod config_apply_test;
