// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit codes
//!
//! Maps bootstrap/application failures onto the BSD `sysexits.h` codes so
//! `model_server`'s exit status is scriptable by process supervisors.

/// Standard `sysexits.h` codes this process uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok,
    /// EX_USAGE: CLI arguments could not be parsed.
    Usage,
    /// EX_DATAERR: CLI arguments parsed but failed validation.
    DataErr,
    /// EX_NOINPUT: a referenced config/model path does not exist.
    NoInput,
    /// EX_CONFIG: config file parsed but its contents are invalid.
    Config,
    /// EX_SOFTWARE: an internal error unrelated to user input.
    Software,
    /// EX_UNAVAILABLE: a required external resource (model, backend) was
    /// unreachable.
    Unavailable,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        let raw: u8 = match code {
            ExitCode::Ok => 0,
            ExitCode::Usage => 64,
            ExitCode::DataErr => 65,
            ExitCode::NoInput => 66,
            ExitCode::Software => 70,
            ExitCode::Unavailable => 69,
            ExitCode::Config => 78,
        };
        std::process::ExitCode::from(raw)
    }
}

pub fn map_error_to_exit_code(error: &dyn std::error::Error) -> ExitCode {
    use crate::cli::ParseError;

    if let Some(parse_error) = error.downcast_ref::<ParseError>() {
        return match parse_error {
            ParseError::PathNotFound(_) => ExitCode::NoInput,
            ParseError::UnsafePath(_) | ParseError::InvalidValue { .. } => ExitCode::DataErr,
            ParseError::Io(_) => ExitCode::NoInput,
        };
    }
    ExitCode::Software
}

pub fn result_to_exit_code<E: std::error::Error + 'static>(result: Result<(), E>) -> std::process::ExitCode {
    match result {
        Ok(()) => ExitCode::Ok.into(),
        Err(e) => {
            eprintln!("error: {e}");
            map_error_to_exit_code(&e).into()
        }
    }
}
