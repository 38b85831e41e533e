// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Tensor Value Object
//!
//! A typed, shaped buffer: `(element_type, shape, bytes)` (§3). Always
//! concrete - a tensor carries real data, so every dimension is static.

use serde::{Deserialize, Serialize};

use crate::value_objects::element_type::ElementType;
use crate::value_objects::shape::Shape;
use crate::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    element_type: ElementType,
    dims: Vec<u64>,
    bytes: Vec<u8>,
}

impl Tensor {
    /// Builds a tensor, rejecting a byte buffer that does not match
    /// `element_type` and `dims` (fixed-width types only; `String` tensors
    /// carry a length-prefixed encoding and are not size-checked here).
    pub fn new(element_type: ElementType, dims: Vec<u64>, bytes: Vec<u8>) -> Result<Self, EngineError> {
        if let Some(elem_size) = element_type.byte_size() {
            let count: u64 = dims.iter().product();
            let expected = count as usize * elem_size;
            if bytes.len() != expected {
                return Err(EngineError::InvalidContentSize(format!(
                    "expected {expected} bytes for shape {dims:?} of {element_type}, got {}",
                    bytes.len()
                )));
            }
        }
        Ok(Self { element_type, dims, bytes })
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn dims(&self) -> &[u64] {
        &self.dims
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Projects the concrete dims into a `Shape` for intersection/validation
    /// against a `TensorInfo`.
    pub fn shape(&self) -> Shape {
        Shape::concrete(self.dims.clone())
    }

    /// Splits this tensor along its leading axis into `count` equal shards,
    /// the mechanics behind a demultiplex node (§4.7).
    pub fn demultiplex(&self, count: u64) -> Result<Vec<Tensor>, EngineError> {
        let leading = *self.dims.first().ok_or_else(|| EngineError::invalid_shape("cannot demultiplex a rank-0 tensor"))?;
        if count == 0 || leading % count != 0 {
            return Err(EngineError::invalid_shape(format!(
                "leading dimension {leading} is not evenly divisible by demultiplex count {count}"
            )));
        }
        let shard_len = leading / count;
        let mut shard_dims = self.dims.clone();
        shard_dims[0] = shard_len;
        let elems_per_shard: u64 = shard_dims.iter().product();
        let elem_size = self.element_type.byte_size().unwrap_or(1);
        let shard_bytes = elems_per_shard as usize * elem_size;
        (0..count as usize)
            .map(|i| {
                let start = i * shard_bytes;
                let end = start + shard_bytes;
                Tensor::new(self.element_type, shard_dims.clone(), self.bytes[start..end].to_vec())
            })
            .collect()
    }

    /// Concatenates shards along their leading axis, the mechanics behind a
    /// gather node (§4.7). Fails with a descriptive error on shape/precision
    /// mismatch between shards (surfaced by the caller as
    /// `INCONSISTENT_SHARD_DIMENSIONS`).
    pub fn gather(shards: &[Tensor]) -> Result<Tensor, EngineError> {
        let first = shards.first().ok_or_else(|| EngineError::invalid_shape("cannot gather zero shards"))?;
        let trailing = &first.dims[1..];
        let mut total_leading = 0u64;
        let mut bytes = Vec::new();
        for shard in shards {
            if shard.element_type != first.element_type || &shard.dims[1..] != trailing {
                return Err(EngineError::PipelineInconsistentShardDimensions(format!(
                    "shard shape/precision mismatch: {:?}/{} vs {:?}/{}",
                    first.dims, first.element_type, shard.dims, shard.element_type
                )));
            }
            total_leading += shard.dims[0];
            bytes.extend_from_slice(&shard.bytes);
        }
        let mut dims = vec![total_leading];
        dims.extend_from_slice(trailing);
        Tensor::new(first.element_type, dims, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f32_tensor(dims: Vec<u64>, values: &[f32]) -> Tensor {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Tensor::new(ElementType::Fp32, dims, bytes).unwrap()
    }

    #[test]
    fn rejects_byte_length_mismatch() {
        assert!(Tensor::new(ElementType::Fp32, vec![1, 10], vec![0u8; 4]).is_err());
    }

    #[test]
    fn demultiplex_then_gather_round_trips() {
        let values: Vec<f32> = (0..30).map(|i| i as f32).collect();
        let t = f32_tensor(vec![3, 10], &values);
        let shards = t.demultiplex(3).unwrap();
        assert_eq!(shards.len(), 3);
        assert_eq!(shards[0].dims(), &[1, 10]);
        let joined = Tensor::gather(&shards).unwrap();
        assert_eq!(joined.dims(), &[3, 10]);
        assert_eq!(joined.bytes(), t.bytes());
    }

    #[test]
    fn gather_rejects_mismatched_shard_shapes() {
        let a = f32_tensor(vec![1, 10], &[0.0; 10]);
        let b = f32_tensor(vec![1, 5], &[0.0; 5]);
        assert!(matches!(Tensor::gather(&[a, b]), Err(EngineError::PipelineInconsistentShardDimensions(_))));
    }

    #[test]
    fn demultiplex_requires_even_division() {
        let t = f32_tensor(vec![5, 10], &[0.0; 50]);
        assert!(t.demultiplex(3).is_err());
    }
}
