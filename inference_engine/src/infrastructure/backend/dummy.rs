// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dummy backend
//!
//! A `BackendRuntime` with no native dependency at all: every loaded model
//! has one input `b` and one output `a = b + 1`, element-wise over `f32`.
//! Batch-size handling follows [`BatchMode`] like a real backend would -
//! `Auto` reshapes to whatever leading dimension the request carries,
//! `Fixed(n)` rejects anything else - so it can stand in for the §8 test
//! scenarios without a real inference library.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use inference_engine_domain::repositories::backend::{BackendConfig, BackendModel, BackendRuntime, Executor};
use inference_engine_domain::value_objects::{Dimension, ElementType, Layout, Shape, Tensor, TensorInfo};
use inference_engine_domain::EngineError;

const INPUT_NAME: &str = "b";
const OUTPUT_NAME: &str = "a";

fn io_shape(batch: Dimension) -> Shape {
    Shape::new(vec![batch, Dimension::Static(10)])
}

/// `BackendRuntime` for the dummy `a = b + 1` model.
pub struct DummyBackend;

#[async_trait]
impl BackendRuntime for DummyBackend {
    async fn load(&self, config: &BackendConfig) -> Result<Box<dyn BackendModel>, EngineError> {
        let batch = match config.batch {
            inference_engine_domain::repositories::backend::BatchMode::Fixed(n) => Dimension::Static(n),
            inference_engine_domain::repositories::backend::BatchMode::Auto => Dimension::any(),
        };
        let shape = config.shape_overrides.get(INPUT_NAME).map_or_else(
            || io_shape(batch),
            |mode| match mode {
                inference_engine_domain::repositories::backend::ShapeMode::Fixed(shape) => shape.clone(),
                inference_engine_domain::repositories::backend::ShapeMode::Auto => io_shape(Dimension::Any),
            },
        );
        Ok(Box::new(DummyModel {
            inputs: vec![TensorInfo::new(INPUT_NAME, ElementType::Fp32, shape.clone(), Layout::parse("NC"))],
            outputs: vec![TensorInfo::new(OUTPUT_NAME, ElementType::Fp32, shape, Layout::parse("NC"))],
        }))
    }
}

/// A model is reshaped by tearing down and reloading (`ModelInstance::reload`),
/// never in place, so `inputs`/`outputs` are fixed at construction.
struct DummyModel {
    inputs: Vec<TensorInfo>,
    outputs: Vec<TensorInfo>,
}

#[async_trait]
impl BackendModel for DummyModel {
    fn inputs(&self) -> &[TensorInfo] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorInfo] {
        &self.outputs
    }

    async fn reshape(&self, _overrides: &BTreeMap<String, Shape>) -> Result<(), EngineError> {
        Err(EngineError::internal_error("dummy backend reshapes by reload, not in place"))
    }

    fn create_slots(&self, n: u32) -> Result<Vec<Box<dyn Executor>>, EngineError> {
        Ok((0..n).map(|_| Box::new(DummyExecutor::default()) as Box<dyn Executor>).collect())
    }
}

#[derive(Default)]
struct DummyExecutor {
    input: Option<Tensor>,
    output: Option<Tensor>,
}

#[async_trait]
impl Executor for DummyExecutor {
    fn set_input(&mut self, name: &str, tensor: Tensor) -> Result<(), EngineError> {
        if name != INPUT_NAME {
            return Err(EngineError::InvalidMissingInput(format!("dummy model has no input named '{name}'")));
        }
        self.input = Some(tensor);
        Ok(())
    }

    fn get_output(&self, name: &str) -> Result<Tensor, EngineError> {
        if name != OUTPUT_NAME {
            return Err(EngineError::InvalidMissingInput(format!("dummy model has no output named '{name}'")));
        }
        self.output.clone().ok_or_else(|| EngineError::internal_error("infer_async was not called before get_output"))
    }

    async fn infer_async(&mut self) -> Result<(), EngineError> {
        let input = self.input.take().ok_or_else(|| EngineError::InvalidMissingInput(INPUT_NAME.to_string()))?;
        if input.element_type() != ElementType::Fp32 {
            return Err(EngineError::InvalidPrecision(format!("dummy model requires fp32, got {}", input.element_type())));
        }
        let floats: Vec<f32> = input
            .bytes()
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()) + 1.0)
            .collect();
        let bytes = floats.iter().flat_map(|f| f.to_le_bytes()).collect();
        self.output = Some(Tensor::new(ElementType::Fp32, input.dims().to_vec(), bytes)?);
        Ok(())
    }

    async fn wait(&mut self, _timeout: Duration) -> Result<(), EngineError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_engine_domain::repositories::backend::BatchMode;
    use inference_engine_domain::value_objects::Nireq;

    fn config(batch: BatchMode) -> BackendConfig {
        BackendConfig {
            base_path: "/models/dummy/1".to_string(),
            device: "CPU".to_string(),
            batch,
            shape_overrides: BTreeMap::new(),
            layout_overrides: BTreeMap::new(),
            plugin_config: BTreeMap::new(),
            nireq: Nireq::default(),
        }
    }

    fn tensor_of(values: &[f32]) -> Tensor {
        let bytes = values.iter().flat_map(|f| f.to_le_bytes()).collect();
        Tensor::new(ElementType::Fp32, vec![1, values.len() as u64], bytes).unwrap()
    }

    fn to_floats(tensor: &Tensor) -> Vec<f32> {
        tensor.bytes().chunks_exact(4).map(|c| f32::from_le_bytes(c.try_into().unwrap())).collect()
    }

    #[tokio::test]
    async fn single_inference_adds_one() {
        let backend = DummyBackend;
        let model = backend.load(&config(BatchMode::Fixed(1))).await.unwrap();
        let mut slots = model.create_slots(1).unwrap();
        let executor = &mut slots[0];
        let input: Vec<f32> = (1..=10).map(|n| n as f32).collect();
        executor.set_input(INPUT_NAME, tensor_of(&input)).unwrap();
        executor.infer_async().await.unwrap();
        executor.wait(Duration::from_millis(10)).await.unwrap();
        let output = executor.get_output(OUTPUT_NAME).unwrap();
        let expected: Vec<f32> = (2..=11).map(|n| n as f32).collect();
        assert_eq!(to_floats(&output), expected);
    }

    #[tokio::test]
    async fn auto_batch_accepts_a_reshaped_batch() {
        let backend = DummyBackend;
        let mut cfg = config(BatchMode::Auto);
        cfg.shape_overrides.insert(
            INPUT_NAME.to_string(),
            inference_engine_domain::repositories::backend::ShapeMode::Fixed(Shape::concrete(vec![3, 10])),
        );
        let model = backend.load(&cfg).await.unwrap();
        assert_eq!(model.inputs()[0].shape, Shape::concrete(vec![3, 10]));
        let mut slots = model.create_slots(1).unwrap();
        let executor = &mut slots[0];
        let input: Vec<f32> = (0..30).map(|n| n as f32).collect();
        let bytes = input.iter().flat_map(|f| f.to_le_bytes()).collect();
        let tensor = Tensor::new(ElementType::Fp32, vec![3, 10], bytes).unwrap();
        executor.set_input(INPUT_NAME, tensor).unwrap();
        executor.infer_async().await.unwrap();
        let output = executor.get_output(OUTPUT_NAME).unwrap();
        assert_eq!(output.dims(), &[3, 10]);
        assert_eq!(to_floats(&output)[0], 1.0);
    }

    #[tokio::test]
    async fn wrong_input_name_is_rejected() {
        let backend = DummyBackend;
        let model = backend.load(&config(BatchMode::Fixed(1))).await.unwrap();
        let mut slots = model.create_slots(1).unwrap();
        let err = slots[0].set_input("wrong", tensor_of(&[1.0])).unwrap_err();
        assert!(matches!(err, EngineError::InvalidMissingInput(_)));
    }
}
