// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ReshapePolicy (C11, §4.11)
//!
//! Turns a [`crate::services::request_validator::ValidationOutcome`] into a
//! concrete decision: serve as-is, reshape-then-retry, or reject. Coupled to
//! whether the target model allows auto shape/batch adaptation — a model
//! that doesn't allow it turns a would-be reshape into a hard `INVALID_SHAPE`.

use crate::services::request_validator::ValidationOutcome;
use crate::EngineError;

#[derive(Debug, Clone)]
pub enum ReshapeDecision {
    Serve,
    ChangeBatchThenServe { input: String, new_batch: u64 },
    ReshapeThenServe { input: String, new_dims: Vec<u64> },
    Reject(EngineError),
}

/// `shape_auto_supported` mirrors the model's own capability (as opposed to
/// `request_validator`'s per-request decision about *which* inputs are
/// auto); a model that cannot reshape at all downgrades any would-be reshape
/// into a rejection.
pub fn decide(outcome: ValidationOutcome, shape_auto_supported: bool) -> ReshapeDecision {
    match outcome {
        ValidationOutcome::Ok => ReshapeDecision::Serve,
        ValidationOutcome::BatchSizeChangeRequired { input, new_batch } => {
            ReshapeDecision::ChangeBatchThenServe { input, new_batch }
        }
        ValidationOutcome::ReshapeRequired { input, new_dims } => {
            if shape_auto_supported {
                ReshapeDecision::ReshapeThenServe { input, new_dims }
            } else {
                ReshapeDecision::Reject(EngineError::invalid_shape(format!(
                    "'{input}' requires reshape but model does not support shape-auto"
                )))
            }
        }
        ValidationOutcome::Invalid(err) => ReshapeDecision::Reject(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_outcome_serves_directly() {
        assert!(matches!(decide(ValidationOutcome::Ok, true), ReshapeDecision::Serve));
    }

    #[test]
    fn reshape_required_without_support_is_rejected() {
        let outcome = ValidationOutcome::ReshapeRequired { input: "b".to_string(), new_dims: vec![1, 7] };
        assert!(matches!(decide(outcome, false), ReshapeDecision::Reject(_)));
    }

    #[test]
    fn reshape_required_with_support_reshapes() {
        let outcome = ValidationOutcome::ReshapeRequired { input: "b".to_string(), new_dims: vec![1, 7] };
        match decide(outcome, true) {
            ReshapeDecision::ReshapeThenServe { input, new_dims } => {
                assert_eq!(input, "b");
                assert_eq!(new_dims, vec![1, 7]);
            }
            other => panic!("expected ReshapeThenServe, got {other:?}"),
        }
    }
}
