// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Local filesystem adapter (§6)
//!
//! The `local` URI scheme's `FileSystemAdapter`. Cloud schemes (s3, gcs,
//! azure-file, azure-blob) are out of scope; [`LocalFileSystemAdapter`] is
//! the only capability wired in, and a version directory is its own local
//! path, so `download_model_versions` is a no-op existence check rather than
//! a real transfer.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use inference_engine_domain::repositories::filesystem_adapter::FileSystemAdapter;
use inference_engine_domain::value_objects::ModelVersion;
use inference_engine_domain::EngineError;
use tracing::debug;

#[derive(Default)]
pub struct LocalFileSystemAdapter;

impl LocalFileSystemAdapter {
    pub fn new() -> Self {
        Self
    }

    fn local_path(uri: &str) -> &str {
        uri.strip_prefix("file://").unwrap_or(uri)
    }
}

#[async_trait]
impl FileSystemAdapter for LocalFileSystemAdapter {
    async fn is_directory(&self, uri: &str) -> Result<bool, EngineError> {
        let path = Self::local_path(uri);
        match tokio::fs::metadata(path).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(EngineError::IoError(format!("stat '{path}': {err}"))),
        }
    }

    async fn list_subdirs(&self, uri: &str) -> Result<Vec<String>, EngineError> {
        let path = Self::local_path(uri);
        let mut entries = tokio::fs::read_dir(path).await.map_err(|err| EngineError::IoError(format!("read_dir '{path}': {err}")))?;
        let mut subdirs = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|err| EngineError::IoError(err.to_string()))? {
            if entry.file_type().await.map(|ft| ft.is_dir()).unwrap_or(false) {
                if let Some(name) = entry.file_name().to_str() {
                    subdirs.push(name.to_string());
                }
            }
        }
        subdirs.sort();
        Ok(subdirs)
    }

    async fn download_model_versions(&self, uri: &str, versions: &[ModelVersion]) -> Result<String, EngineError> {
        let base: &Path = Path::new(Self::local_path(uri));
        for version in versions {
            let version_dir: PathBuf = base.join(version.get().to_string());
            if !tokio::fs::try_exists(&version_dir).await.unwrap_or(false) {
                return Err(EngineError::InvalidConfiguration(format!(
                    "model version directory '{}' does not exist under '{uri}'",
                    version_dir.display()
                )));
            }
        }
        debug!(uri, count = versions.len(), "staged model versions from local filesystem");
        Ok(base.to_string_lossy().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn is_directory_is_false_for_a_missing_path() {
        let adapter = LocalFileSystemAdapter::new();
        assert!(!adapter.is_directory("/does/not/exist").await.unwrap());
    }

    #[tokio::test]
    async fn is_directory_is_true_for_an_existing_dir() {
        let adapter = LocalFileSystemAdapter::new();
        assert!(adapter.is_directory(env!("CARGO_MANIFEST_DIR")).await.unwrap());
    }

    #[tokio::test]
    async fn list_subdirs_only_returns_directories() {
        let adapter = LocalFileSystemAdapter::new();
        let subdirs = adapter.list_subdirs(env!("CARGO_MANIFEST_DIR")).await.unwrap();
        assert!(subdirs.contains(&"src".to_string()));
    }

    #[tokio::test]
    async fn download_model_versions_rejects_a_missing_version_dir() {
        let adapter = LocalFileSystemAdapter::new();
        let err = adapter
            .download_model_versions(env!("CARGO_MANIFEST_DIR"), &[ModelVersion::new(999999)])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }
}
