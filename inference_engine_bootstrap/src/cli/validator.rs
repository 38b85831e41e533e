// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI argument validation
//!
//! Security-first validation layer between clap's parsed structs and the
//! `ValidatedCli` the rest of bootstrap consumes: path traversal / shell
//! metacharacter rejection, plus canonicalization for paths that must
//! already exist on disk.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid value for '{arg}': {reason}")]
    InvalidValue { arg: String, reason: String },

    #[error("path does not exist: {0}")]
    PathNotFound(String),

    #[error("path contains disallowed characters: {0}")]
    UnsafePath(String),

    #[error("I/O error resolving path: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejects shell/path-injection patterns common to both "must exist" and
/// "not yet created" argument strings.
const DISALLOWED_SUBSTRINGS: &[&str] = &["..", "$(", "`", "|", ";", "&&", "\0"];

pub struct SecureArgParser;

impl SecureArgParser {
    /// Validates a bare argument string (one that may name a not-yet-existing
    /// path, a pipeline/model name, etc.) against injection patterns.
    pub fn validate_argument(value: &str) -> Result<(), ParseError> {
        if value.is_empty() {
            return Err(ParseError::InvalidValue { arg: value.to_string(), reason: "must not be empty".to_string() });
        }
        for pattern in DISALLOWED_SUBSTRINGS {
            if value.contains(pattern) {
                return Err(ParseError::UnsafePath(format!("'{value}' contains disallowed sequence '{pattern}'")));
            }
        }
        Ok(())
    }

    /// Validates and canonicalizes a path that must already exist.
    pub fn validate_path(value: &str) -> Result<PathBuf, ParseError> {
        Self::validate_argument(value)?;
        let path = PathBuf::from(value);
        if !path.exists() {
            return Err(ParseError::PathNotFound(value.to_string()));
        }
        path.canonicalize().map_err(ParseError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_argument_is_rejected() {
        assert!(SecureArgParser::validate_argument("").is_err());
    }

    #[test]
    fn parent_directory_traversal_is_rejected() {
        assert!(SecureArgParser::validate_argument("../../etc/passwd").is_err());
    }

    #[test]
    fn command_substitution_is_rejected() {
        assert!(SecureArgParser::validate_argument("model$(rm -rf /)").is_err());
    }

    #[test]
    fn plain_name_is_accepted() {
        assert!(SecureArgParser::validate_argument("dummy-v2").is_ok());
    }

    #[test]
    fn missing_path_is_reported() {
        match SecureArgParser::validate_path("/no/such/path/on/disk") {
            Err(ParseError::PathNotFound(_)) => {}
            other => panic!("expected PathNotFound, got {other:?}"),
        }
    }

    #[test]
    fn existing_path_canonicalizes() {
        let manifest_dir = env!("CARGO_MANIFEST_DIR");
        let resolved = SecureArgParser::validate_path(manifest_dir).unwrap();
        assert!(resolved.is_dir());
    }
}
