// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Shape Value Object
//!
//! An ordered sequence of [`Dimension`]s (§3/§4.1).

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::value_objects::dimension::Dimension;
use crate::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape(Vec<Dimension>);

impl Shape {
    pub fn new(dims: Vec<Dimension>) -> Self {
        Self(dims)
    }

    /// A shape of all-static dimensions, as produced by a concrete tensor.
    pub fn concrete(dims: Vec<u64>) -> Self {
        Self(dims.into_iter().map(Dimension::Static).collect())
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn dims(&self) -> &[Dimension] {
        &self.0
    }

    /// A shape is *concrete* iff every dimension is static (§3).
    pub fn is_concrete(&self) -> bool {
        self.0.iter().all(Dimension::is_static)
    }

    /// The concrete sizes, if every dimension is static.
    pub fn as_concrete_dims(&self) -> Option<Vec<u64>> {
        self.0
            .iter()
            .map(|d| match d {
                Dimension::Static(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    /// `Shape::match` (§4.1): rank matches and every dimension pair overlaps.
    pub fn matches(&self, other: &Shape) -> bool {
        self.rank() == other.rank() && self.0.iter().zip(other.0.iter()).all(|(a, b)| a.matches(b))
    }

    /// `Shape::intersection` (§4.1): the narrowed shape, or an error when rank
    /// or any dimension pair is disjoint.
    pub fn intersection(&self, other: &Shape) -> Result<Shape, EngineError> {
        if self.rank() != other.rank() {
            return Err(EngineError::invalid_shape(format!(
                "rank mismatch: {} vs {}",
                self.rank(),
                other.rank()
            )));
        }
        let narrowed: Option<Vec<Dimension>> =
            self.0.iter().zip(other.0.iter()).map(|(a, b)| a.intersect(b)).collect();
        narrowed
            .map(Shape)
            .ok_or_else(|| EngineError::invalid_shape(format!("no intersection between {self} and {other}")))
    }

    /// Replaces the leading dimension, used when demultiplexing inserts/strips
    /// a shard-count prefix axis (§4.7).
    pub fn with_leading_dim(&self, dim: Dimension) -> Shape {
        let mut dims = self.0.clone();
        if dims.is_empty() {
            dims.push(dim);
        } else {
            dims[0] = dim;
        }
        Shape(dims)
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}
