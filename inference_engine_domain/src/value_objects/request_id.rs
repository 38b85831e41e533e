// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Request Identifier Value Object
//!
//! Correlates one inbound `Predict` call (and, transitively, the root
//! `NodeSessionMetadata` it spawns) across logs and metrics.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use ulid::Ulid;

use crate::value_objects::generic_id::{GenericId, IdCategory};
use crate::EngineError;

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct RequestMarker;

impl IdCategory for RequestMarker {
    fn category_name() -> &'static str {
        "request"
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct RequestId(GenericId<RequestMarker>);

impl RequestId {
    pub fn new() -> Self {
        Self(GenericId::new())
    }

    pub fn from_string(s: &str) -> Result<Self, EngineError> {
        Ok(Self(GenericId::from_string(s)?))
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0.as_ulid()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn round_trips_through_string() {
        let id = RequestId::new();
        assert_eq!(RequestId::from_string(&id.to_string()).unwrap(), id);
    }
}
