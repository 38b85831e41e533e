// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ModelVersionStatus State Machine
//!
//! One per `ModelInstance` (§3):
//!
//! ```text
//! START → LOADING → AVAILABLE → UNLOADING → END
//!               ↘  (fail)  → LOADING_FAILED
//!   AVAILABLE → LOADING   (reshape / reload)
//! ```
//!
//! Only `Available` accepts inference; every transition is expected to fire a
//! notification so `wait_for_available` callers can re-check (the
//! notification mechanism itself lives on `ModelInstance`, via a
//! `tokio::sync::watch` channel in the engine crate).

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelVersionStatus {
    Start,
    Loading,
    Available,
    Unloading,
    End,
    LoadingFailed,
}

impl ModelVersionStatus {
    /// True iff an inference request may be admitted (§3: "only the AVAILABLE
    /// state accepts inference").
    pub fn accepts_inference(&self) -> bool {
        matches!(self, ModelVersionStatus::Available)
    }

    /// True once the instance can no longer transition back to `Available`
    /// (`End` is terminal; `LoadingFailed` can still be retried by a fresh
    /// `load`, so it is not included here).
    pub fn is_terminal(&self) -> bool {
        matches!(self, ModelVersionStatus::End)
    }

    /// Validates a proposed transition against the state diagram above.
    pub fn can_transition_to(&self, next: ModelVersionStatus) -> bool {
        use ModelVersionStatus::*;
        matches!(
            (self, next),
            (Start, Loading)
                | (Loading, Available)
                | (Loading, LoadingFailed)
                | (Available, Loading)
                | (Available, Unloading)
                | (Unloading, End)
                | (Unloading, Loading)
                | (LoadingFailed, Loading)
        )
    }
}

impl Display for ModelVersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModelVersionStatus::Start => "START",
            ModelVersionStatus::Loading => "LOADING",
            ModelVersionStatus::Available => "AVAILABLE",
            ModelVersionStatus::Unloading => "UNLOADING",
            ModelVersionStatus::End => "END",
            ModelVersionStatus::LoadingFailed => "LOADING_FAILED",
        };
        write!(f, "{s}")
    }
}
