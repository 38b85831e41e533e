// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Name Value Objects
//!
//! `ModelName`, `NodeName`, and `PipelineName` share one validation rule
//! (non-empty, no surrounding whitespace) so they're defined together here
//! rather than in three near-identical files.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::EngineError;

fn validate(kind: &'static str, s: &str) -> Result<(), EngineError> {
    if s.is_empty() {
        return Err(EngineError::invalid_config(format!("{kind} name cannot be empty")));
    }
    if s.trim() != s {
        return Err(EngineError::invalid_config(format!("{kind} name '{s}' has leading/trailing whitespace")));
    }
    Ok(())
}

macro_rules! name_type {
    ($name:ident, $kind:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Result<Self, EngineError> {
                let s = s.into();
                validate($kind, &s)?;
                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

name_type!(ModelName, "model");
name_type!(NodeName, "node");
name_type!(PipelineName, "pipeline");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_names() {
        assert!(ModelName::new("").is_err());
        assert!(NodeName::new("").is_err());
        assert!(PipelineName::new("").is_err());
    }

    #[test]
    fn rejects_surrounding_whitespace() {
        assert!(PipelineName::new(" dummy ").is_err());
    }

    #[test]
    fn accepts_ordinary_names() {
        assert_eq!(ModelName::new("dummy").unwrap().as_str(), "dummy");
    }
}
