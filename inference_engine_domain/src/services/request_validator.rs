// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # RequestValidator (C11, §4.11)
//!
//! Checks an inbound request's tensors against a model's declared
//! `TensorInfo`s, producing one of OK / a terminal `INVALID_*` / a mutation
//! request (`BatchSizeChangeRequired` / `ReshapeRequired`) that
//! [`crate::services::reshape_policy`] turns into an actual reload decision.

use std::collections::BTreeMap;

use crate::value_objects::{AxisTag, Tensor, TensorInfo};
use crate::EngineError;

#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    Ok,
    BatchSizeChangeRequired { input: String, new_batch: u64 },
    ReshapeRequired { input: String, new_dims: Vec<u64> },
    Invalid(EngineError),
}

/// Index of the batch (N) axis in `info`'s layout, defaulting to the
/// leading dimension when no layout is declared (§4.1, §4.11).
fn batch_axis(info: &TensorInfo) -> usize {
    info.layout.tags().iter().position(|t| *t == AxisTag::N).unwrap_or(0)
}

fn validate_one(
    name: &str,
    tensor: &Tensor,
    info: &TensorInfo,
    shape_auto: bool,
    batch_auto: bool,
) -> ValidationOutcome {
    if !info.element_type.intersects(&tensor.element_type()) {
        return ValidationOutcome::Invalid(EngineError::InvalidPrecision(format!(
            "{name}: expected {}, got {}",
            info.element_type, tensor.element_type()
        )));
    }

    if info.shape.rank() != tensor.dims().len() {
        return ValidationOutcome::Invalid(EngineError::InvalidShape(format!(
            "{name}: rank mismatch, expected {}, got {}",
            info.shape.rank(),
            tensor.dims().len()
        )));
    }

    if info.shape.matches(&crate::value_objects::Shape::concrete(tensor.dims().to_vec())) {
        return ValidationOutcome::Ok;
    }

    let batch_idx = batch_axis(info);
    let mismatched: Vec<usize> = info
        .shape
        .dims()
        .iter()
        .zip(tensor.dims())
        .enumerate()
        .filter(|(_, (dim, &actual))| !dim.admits(actual))
        .map(|(i, _)| i)
        .collect();

    let only_batch_differs = mismatched == vec![batch_idx];
    let any_non_batch_differs = mismatched.iter().any(|&i| i != batch_idx);

    if only_batch_differs && batch_auto {
        return ValidationOutcome::BatchSizeChangeRequired { input: name.to_string(), new_batch: tensor.dims()[batch_idx] };
    }
    if any_non_batch_differs && shape_auto {
        return ValidationOutcome::ReshapeRequired { input: name.to_string(), new_dims: tensor.dims().to_vec() };
    }

    ValidationOutcome::Invalid(EngineError::InvalidShape(format!(
        "{name}: expected {}, got {:?}",
        info.shape, tensor.dims()
    )))
}

/// Validates every provided input against its declared `TensorInfo`.
/// Returns the first non-OK outcome; a `ReshapeRequired` on any input
/// dominates a `BatchSizeChangeRequired` on another (§4.11: "if both
/// conditions hold... RESHAPE_REQUIRED dominates").
pub fn validate_request(
    inputs: &BTreeMap<String, Tensor>,
    model_inputs: &[TensorInfo],
    shape_auto_inputs: &[String],
    batch_auto: bool,
) -> ValidationOutcome {
    let by_name: BTreeMap<&str, &TensorInfo> = model_inputs.iter().map(|t| (t.name.as_str(), t)).collect();

    for info in model_inputs {
        if !inputs.contains_key(&info.name) {
            return ValidationOutcome::Invalid(EngineError::InvalidMissingInput(info.name.clone()));
        }
    }
    if inputs.len() != model_inputs.len() {
        return ValidationOutcome::Invalid(EngineError::InvalidNoOfInputs(format!(
            "expected {}, got {}",
            model_inputs.len(),
            inputs.len()
        )));
    }

    let mut pending_reshape = None;
    let mut pending_batch = None;
    for (name, tensor) in inputs {
        let info = match by_name.get(name.as_str()) {
            Some(info) => info,
            None => return ValidationOutcome::Invalid(EngineError::InvalidMissingInput(name.clone())),
        };
        let shape_auto = shape_auto_inputs.iter().any(|n| n == name);
        match validate_one(name, tensor, info, shape_auto, batch_auto) {
            ValidationOutcome::Ok => {}
            outcome @ ValidationOutcome::Invalid(_) => return outcome,
            outcome @ ValidationOutcome::ReshapeRequired { .. } => pending_reshape.get_or_insert(outcome),
            outcome @ ValidationOutcome::BatchSizeChangeRequired { .. } => pending_batch.get_or_insert(outcome),
        };
    }

    pending_reshape.or(pending_batch).unwrap_or(ValidationOutcome::Ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{ElementType, Layout, Shape};

    fn dummy_info() -> TensorInfo {
        TensorInfo::new("b", ElementType::Fp32, Shape::concrete(vec![1, 10]), Layout::parse("NC"))
    }

    #[test]
    fn matching_shape_validates_ok() {
        let mut inputs = BTreeMap::new();
        inputs.insert("b".to_string(), Tensor::new(ElementType::Fp32, vec![1, 10], vec![0u8; 40]).unwrap());
        let outcome = validate_request(&inputs, &[dummy_info()], &[], false);
        assert!(matches!(outcome, ValidationOutcome::Ok));
    }

    #[test]
    fn batch_only_mismatch_requests_batch_change_when_auto() {
        let mut inputs = BTreeMap::new();
        inputs.insert("b".to_string(), Tensor::new(ElementType::Fp32, vec![3, 10], vec![0u8; 120]).unwrap());
        let outcome = validate_request(&inputs, &[dummy_info()], &[], true);
        match outcome {
            ValidationOutcome::BatchSizeChangeRequired { input, new_batch } => {
                assert_eq!(input, "b");
                assert_eq!(new_batch, 3);
            }
            other => panic!("expected BatchSizeChangeRequired, got {other:?}"),
        }
    }

    #[test]
    fn non_batch_mismatch_is_invalid_without_shape_auto() {
        let mut inputs = BTreeMap::new();
        inputs.insert("b".to_string(), Tensor::new(ElementType::Fp32, vec![1, 7], vec![0u8; 28]).unwrap());
        let outcome = validate_request(&inputs, &[dummy_info()], &[], false);
        assert!(matches!(outcome, ValidationOutcome::Invalid(EngineError::InvalidShape(_))));
    }

    #[test]
    fn missing_input_is_invalid() {
        let inputs = BTreeMap::new();
        let outcome = validate_request(&inputs, &[dummy_info()], &[], false);
        assert!(matches!(outcome, ValidationOutcome::Invalid(EngineError::InvalidMissingInput(_))));
    }
}
