// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Repository adapters (§6)
//!
//! Concrete implementations of the domain's `ConfigSource` and
//! `FileSystemAdapter` ports.

pub mod config_source;
pub mod filesystem_adapter;

pub use config_source::FileConfigSource;
pub use filesystem_adapter::LocalFileSystemAdapter;
