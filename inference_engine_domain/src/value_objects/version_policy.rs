// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Version Policy Value Object
//!
//! Filters the version set discovered on disk down to the *desired-served*
//! set (§3).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::value_objects::model_version::ModelVersion;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionPolicy {
    All,
    Latest { count: usize },
    Specific { versions: Vec<ModelVersion> },
}

impl VersionPolicy {
    /// Applies the policy to the discovered version set, returning the
    /// desired-served set.
    pub fn apply(&self, discovered: &BTreeSet<ModelVersion>) -> BTreeSet<ModelVersion> {
        match self {
            VersionPolicy::All => discovered.clone(),
            VersionPolicy::Latest { count } => discovered.iter().rev().take(*count).copied().collect(),
            VersionPolicy::Specific { versions } => {
                versions.iter().filter(|v| discovered.contains(v)).copied().collect()
            }
        }
    }
}

impl Default for VersionPolicy {
    fn default() -> Self {
        VersionPolicy::Latest { count: 1 }
    }
}
