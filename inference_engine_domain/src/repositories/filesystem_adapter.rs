// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Filesystem adapter (§6)
//!
//! One capability per URI scheme (local, s3, gcs, azure-file, azure-blob).
//! `ModelInstance::load` stages a version's files through this port before
//! handing the local path to a [`crate::repositories::backend::BackendRuntime`].

use async_trait::async_trait;

use crate::value_objects::ModelVersion;
use crate::EngineError;

#[async_trait]
pub trait FileSystemAdapter: Send + Sync {
    async fn is_directory(&self, uri: &str) -> Result<bool, EngineError>;
    async fn list_subdirs(&self, uri: &str) -> Result<Vec<String>, EngineError>;

    /// Stages the requested versions locally and returns the local base path.
    async fn download_model_versions(&self, uri: &str, versions: &[ModelVersion]) -> Result<String, EngineError>;
}
