// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Element Type Value Object
//!
//! The scalar type carried by a [`crate::value_objects::tensor::Tensor`]. Kept
//! as a closed enum (not a string) so shape/layout intersection code can match
//! exhaustively instead of string-comparing.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Fp32,
    Fp16,
    Fp64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    Bool,
    String,
    /// Matches any concrete element type during intersection (§4.1).
    Undefined,
}

impl ElementType {
    /// Size in bytes of one element, or `None` for variable-width types.
    pub fn byte_size(&self) -> Option<usize> {
        match self {
            ElementType::Fp32 | ElementType::I32 | ElementType::U16 => Some(4),
            ElementType::Fp16 | ElementType::I16 => Some(2),
            ElementType::Fp64 | ElementType::I64 => Some(8),
            ElementType::I8 | ElementType::U8 | ElementType::Bool => Some(1),
            ElementType::String | ElementType::Undefined => None,
        }
    }

    /// Two element types admit intersection iff equal, or either is `Undefined`
    /// (§3: "element types are equal or one is UNDEFINED").
    pub fn intersects(&self, other: &ElementType) -> bool {
        *self == ElementType::Undefined || *other == ElementType::Undefined || self == other
    }

    /// The more specific of two admissible element types.
    pub fn narrow(&self, other: &ElementType) -> Option<ElementType> {
        if !self.intersects(other) {
            return None;
        }
        Some(if *self == ElementType::Undefined { *other } else { *self })
    }
}

impl Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ElementType::Fp32 => "fp32",
            ElementType::Fp16 => "fp16",
            ElementType::Fp64 => "fp64",
            ElementType::I8 => "i8",
            ElementType::I16 => "i16",
            ElementType::I32 => "i32",
            ElementType::I64 => "i64",
            ElementType::U8 => "u8",
            ElementType::U16 => "u16",
            ElementType::Bool => "bool",
            ElementType::String => "string",
            ElementType::Undefined => "undefined",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ElementType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fp32" | "f32" => Ok(ElementType::Fp32),
            "fp16" | "f16" => Ok(ElementType::Fp16),
            "fp64" | "f64" => Ok(ElementType::Fp64),
            "i8" => Ok(ElementType::I8),
            "i16" => Ok(ElementType::I16),
            "i32" => Ok(ElementType::I32),
            "i64" => Ok(ElementType::I64),
            "u8" => Ok(ElementType::U8),
            "u16" => Ok(ElementType::U16),
            "bool" => Ok(ElementType::Bool),
            "string" => Ok(ElementType::String),
            "undefined" => Ok(ElementType::Undefined),
            other => Err(EngineError::InvalidPrecision(format!("unknown element type '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_intersects_everything() {
        assert!(ElementType::Undefined.intersects(&ElementType::Fp32));
        assert!(ElementType::Fp32.intersects(&ElementType::Undefined));
    }

    #[test]
    fn distinct_concrete_types_do_not_intersect() {
        assert!(!ElementType::Fp32.intersects(&ElementType::I32));
    }

    #[test]
    fn narrow_prefers_the_concrete_side() {
        assert_eq!(ElementType::Undefined.narrow(&ElementType::Fp32), Some(ElementType::Fp32));
        assert_eq!(ElementType::Fp32.narrow(&ElementType::Undefined), Some(ElementType::Fp32));
    }

    #[test]
    fn round_trips_through_display_and_from_str() {
        for et in [ElementType::Fp32, ElementType::I64, ElementType::Bool, ElementType::String] {
            assert_eq!(et.to_string().parse::<ElementType>().unwrap(), et);
        }
    }
}
