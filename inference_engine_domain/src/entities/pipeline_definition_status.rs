// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # PipelineDefinitionStatus State Machine
//!
//! ```text
//! BEGIN → VALIDATING → AVAILABLE ⇄ LOADING_PRECONDITION_FAILED
//!                           ↓
//!                       RETIRED (terminal for this instance)
//! ```
//!
//! Transitions (§3): `ValidationPassed`, `ValidationFailed`,
//! `UsedModelChanged` (→ re-validate), `RetireRequested`.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineDefinitionStatus {
    Begin,
    Validating,
    Available,
    LoadingPreconditionFailed,
    Retired,
}

/// Events driving the status state machine (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineDefinitionEvent {
    ValidationPassed,
    ValidationFailed,
    UsedModelChanged,
    RetireRequested,
}

impl PipelineDefinitionStatus {
    /// `create()` blocks while in a transient state and fails outright once
    /// retired (§4.9).
    pub fn is_transient(&self) -> bool {
        matches!(self, PipelineDefinitionStatus::Begin | PipelineDefinitionStatus::Validating)
    }

    pub fn is_retired(&self) -> bool {
        matches!(self, PipelineDefinitionStatus::Retired)
    }

    pub fn accepts_create(&self) -> bool {
        matches!(self, PipelineDefinitionStatus::Available)
    }

    /// Applies `event`, returning the next status or `None` if the event does
    /// not apply in the current state.
    pub fn apply(&self, event: PipelineDefinitionEvent) -> Option<PipelineDefinitionStatus> {
        use PipelineDefinitionEvent::*;
        use PipelineDefinitionStatus::*;
        match (self, event) {
            (Begin, ValidationPassed) => None, // must pass through Validating first
            (_, RetireRequested) if !self.is_retired() => Some(Retired),
            (Validating, ValidationPassed) => Some(Available),
            (Validating, ValidationFailed) => Some(LoadingPreconditionFailed),
            (Available, UsedModelChanged) => Some(Validating),
            (Available, ValidationFailed) => Some(LoadingPreconditionFailed),
            (LoadingPreconditionFailed, UsedModelChanged) => Some(Validating),
            (LoadingPreconditionFailed, ValidationPassed) => Some(Available),
            _ => None,
        }
    }

    /// The initial `Begin → Validating` transition has no corresponding event
    /// in §3's vocabulary; it fires once, at construction.
    pub fn begin_validation(&self) -> Option<PipelineDefinitionStatus> {
        matches!(self, PipelineDefinitionStatus::Begin).then_some(PipelineDefinitionStatus::Validating)
    }
}

impl Display for PipelineDefinitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineDefinitionStatus::Begin => "BEGIN",
            PipelineDefinitionStatus::Validating => "VALIDATING",
            PipelineDefinitionStatus::Available => "AVAILABLE",
            PipelineDefinitionStatus::LoadingPreconditionFailed => "LOADING_PRECONDITION_FAILED",
            PipelineDefinitionStatus::Retired => "RETIRED",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PipelineDefinitionEvent::*;
    use PipelineDefinitionStatus::*;

    #[test]
    fn begin_moves_to_validating_then_available() {
        assert_eq!(Begin.begin_validation(), Some(Validating));
        assert_eq!(Validating.apply(ValidationPassed), Some(Available));
    }

    #[test]
    fn used_model_changed_reenters_validating() {
        assert_eq!(Available.apply(UsedModelChanged), Some(Validating));
    }

    #[test]
    fn validation_failure_is_not_terminal() {
        assert_eq!(Available.apply(ValidationFailed), Some(LoadingPreconditionFailed));
        assert_eq!(LoadingPreconditionFailed.apply(ValidationPassed), Some(Available));
    }

    #[test]
    fn retire_is_terminal_from_any_non_retired_state() {
        for s in [Begin, Validating, Available, LoadingPreconditionFailed] {
            assert_eq!(s.apply(RetireRequested), Some(Retired));
        }
        assert_eq!(Retired.apply(RetireRequested), None);
    }

    #[test]
    fn transient_states_block_create_until_resolved() {
        assert!(Begin.is_transient());
        assert!(Validating.is_transient());
        assert!(!Available.is_transient());
        assert!(Available.accepts_create());
    }
}
