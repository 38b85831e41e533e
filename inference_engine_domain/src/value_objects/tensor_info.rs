// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # TensorInfo Value Object
//!
//! Metadata describing a named tensor slot on a model or node (§3/§4.1),
//! grounded on OVMS's `TensorInfo` (`name`, `mapping`, `precision`, `shape`,
//! `layout`), expressed here as an immutable value object rather than the
//! original's mutable, shared-pointer-held class.

use serde::{Deserialize, Serialize};

use crate::value_objects::element_type::ElementType;
use crate::value_objects::layout::Layout;
use crate::value_objects::shape::Shape;
use crate::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorInfo {
    pub name: String,
    pub mapped_name: String,
    pub element_type: ElementType,
    pub shape: Shape,
    pub layout: Layout,
}

impl TensorInfo {
    pub fn new(name: impl Into<String>, element_type: ElementType, shape: Shape, layout: Layout) -> Self {
        let name = name.into();
        Self { mapped_name: name.clone(), name, element_type, shape, layout }
    }

    pub fn with_mapped_name(mut self, mapped_name: impl Into<String>) -> Self {
        self.mapped_name = mapped_name.into();
        self
    }

    /// `TensorInfo::intersection` (§4.1): names and mapped names match,
    /// element types intersect, layouts match element-wise, and every
    /// dimension pair has a non-empty intersection. The result narrows ranges
    /// and resolves `Undefined` element types.
    pub fn intersection(&self, other: &TensorInfo) -> Result<TensorInfo, EngineError> {
        if self.name != other.name {
            return Err(EngineError::invalid_shape(format!(
                "tensor name mismatch: '{}' vs '{}'",
                self.name, other.name
            )));
        }
        if self.mapped_name != other.mapped_name {
            return Err(EngineError::invalid_shape(format!(
                "tensor mapped name mismatch: '{}' vs '{}'",
                self.mapped_name, other.mapped_name
            )));
        }
        let element_type = self
            .element_type
            .narrow(&other.element_type)
            .ok_or_else(|| EngineError::InvalidPrecision(format!("'{}' precision mismatch", self.name)))?;
        if !self.layout.matches(&other.layout) {
            return Err(EngineError::invalid_shape(format!("'{}' layout mismatch", self.name)));
        }
        let shape = self.shape.intersection(&other.shape)?;
        Ok(TensorInfo { name: self.name.clone(), mapped_name: self.mapped_name.clone(), element_type, shape, layout: self.layout.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::dimension::Dimension;

    fn info(shape: Shape) -> TensorInfo {
        TensorInfo::new("b", ElementType::Fp32, shape, Layout::parse("NC"))
    }

    #[test]
    fn intersection_requires_matching_names() {
        let a = info(Shape::concrete(vec![1, 10]));
        let mut b = info(Shape::concrete(vec![1, 10]));
        b.name = "other".into();
        b.mapped_name = "other".into();
        assert!(a.intersection(&b).is_err());
    }

    #[test]
    fn intersection_narrows_ranges_and_resolves_undefined_precision() {
        let a = TensorInfo::new(
            "b",
            ElementType::Undefined,
            Shape::new(vec![Dimension::range(1, 10), Dimension::Static(10)]),
            Layout::parse("NC"),
        );
        let b = info(Shape::new(vec![Dimension::range(1, 5), Dimension::Static(10)]));
        let narrowed = a.intersection(&b).unwrap();
        assert_eq!(narrowed.element_type, ElementType::Fp32);
        assert_eq!(narrowed.shape, Shape::new(vec![Dimension::range(1, 5), Dimension::Static(10)]));
    }

    #[test]
    fn disjoint_shapes_fail_intersection() {
        let a = info(Shape::concrete(vec![1, 10]));
        let b = info(Shape::concrete(vec![1, 20]));
        assert!(a.intersection(&b).is_err());
    }
}
