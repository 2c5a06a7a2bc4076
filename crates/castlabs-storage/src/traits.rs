//! Upload target abstraction
//!
//! This module defines the UploadTarget trait that all upload backends must implement.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use castlabs_core::PlatformError;
use serde::Serialize;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for PlatformError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::IoError(e) => PlatformError::Io(e),
            StorageError::ConfigError(msg) => PlatformError::Config(msg),
            other => PlatformError::Storage(other.to_string()),
        }
    }
}

/// An object written by an upload target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedObject {
    pub bucket: String,
    pub key: String,
    pub size_bytes: u64,
}

/// Destination bucket for source media
///
/// Implementations write objects under keys produced by [`crate::keys`]; they do not
/// invent their own layout.
#[async_trait]
pub trait UploadTarget: Send + Sync {
    /// Name of the bucket objects are written to
    fn bucket(&self) -> &str;

    /// Write `data` to `key`
    async fn upload_bytes(&self, key: &str, data: Bytes) -> StorageResult<UploadedObject>;

    /// Write the contents of a local file to `key`
    async fn upload_file(&self, key: &str, path: &Path) -> StorageResult<UploadedObject> {
        let data = tokio::fs::read(path).await?;
        self.upload_bytes(key, Bytes::from(data)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use castlabs_core::ErrorMetadata;

    #[test]
    fn test_storage_error_into_platform_error() {
        let err: PlatformError = StorageError::UploadFailed("denied".to_string()).into();
        assert!(matches!(err, PlatformError::Storage(_)));
        assert_eq!(err.error_code(), "STORAGE_ERROR");

        let err: PlatformError = StorageError::ConfigError("no bucket".to_string()).into();
        assert!(matches!(err, PlatformError::Config(_)));

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PlatformError = StorageError::IoError(io).into();
        assert!(matches!(err, PlatformError::Io(_)));
    }
}
