// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Backend binding adapters (C3)
//!
//! [`dummy`] is the `a = b + 1` backend the §8 test scenarios run against.
//! [`custom_loader`] wraps any `BackendRuntime` so model staging goes through
//! a named plugin instead of the default filesystem layout.

pub mod custom_loader;
pub mod dummy;

pub use custom_loader::{CustomLoaderBackend, NoopCustomLoader};
pub use dummy::DummyBackend;
