// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Binary-input decoding (Non-goal boundary, §1)
//!
//! Image decoding itself is explicitly out of scope; this is the thin seam
//! an `EntryNode` calls through when a request input arrives as a
//! `BinaryBlob` rather than a typed `Tensor` (§4.7, §4.11).

use crate::value_objects::Tensor;
use crate::EngineError;

/// Per-request, all binary items must share resolution when the target
/// layout is unknown (§4.11) — `hint_resolution` lets the caller propagate
/// the first item's inferred resolution to subsequent ones in the same
/// request.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8], hint_resolution: Option<(u32, u32)>) -> Result<Tensor, EngineError>;
}
