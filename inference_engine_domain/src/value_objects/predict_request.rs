// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Predict request/response (§6)
//!
//! The normalized inbound shape both wire dialects (two RPC dialects and a
//! REST dialect, out of scope here) are translated into before reaching the
//! core.

use std::collections::BTreeMap;

use crate::value_objects::{ModelVersion, StatusCode, Tensor};

/// One request input: either an already-typed tensor, or an opaque binary
/// blob awaiting `decode_image` (§1, §4.11).
#[derive(Debug, Clone)]
pub enum RequestInput {
    Tensor(Tensor),
    Binary(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct PredictRequest {
    pub target_name: String,
    /// `0` means default (§3 glossary).
    pub target_version: ModelVersion,
    pub inputs: BTreeMap<String, RequestInput>,
    pub requested_outputs: Option<Vec<String>>,
}

impl PredictRequest {
    pub fn new(target_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            target_version: ModelVersion::DEFAULT,
            inputs: BTreeMap::new(),
            requested_outputs: None,
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, input: RequestInput) -> Self {
        self.inputs.insert(name.into(), input);
        self
    }
}

#[derive(Debug, Clone)]
pub struct PredictResponse {
    pub outputs: BTreeMap<String, Tensor>,
    pub status: StatusCode,
}

impl PredictResponse {
    pub fn ok(outputs: BTreeMap<String, Tensor>) -> Self {
        Self { outputs, status: StatusCode::Ok }
    }

    pub fn error(status: StatusCode) -> Self {
        Self { outputs: BTreeMap::new(), status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_carries_no_outputs() {
        let resp = PredictResponse::error(StatusCode::InvalidShape);
        assert!(resp.outputs.is_empty());
        assert_eq!(resp.status, StatusCode::InvalidShape);
    }
}
