#[cfg(feature = "storage-local")]
use crate::LocalUploadTarget;
#[cfg(feature = "storage-s3")]
use crate::S3UploadTarget;
use crate::{StorageError, StorageResult, TemporaryCredentials, UploadTarget};
use std::path::PathBuf;
use std::sync::Arc;

/// Backend an upload target writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadBackend {
    #[default]
    S3,
    Local,
}

/// Everything needed to build an upload target for one storage location
#[derive(Debug, Clone, Default)]
pub struct UploadTargetSettings {
    pub backend: UploadBackend,
    pub bucket: String,
    pub region: String,
    pub credentials: Option<TemporaryCredentials>,
    /// S3-compatible endpoint override
    pub endpoint: Option<String>,
    /// Root directory for the local backend
    pub local_path: Option<PathBuf>,
}

/// Create an upload target based on settings
pub async fn create_upload_target(
    settings: UploadTargetSettings,
) -> StorageResult<Arc<dyn UploadTarget>> {
    if settings.bucket.is_empty() {
        return Err(StorageError::ConfigError("bucket not configured".to_string()));
    }

    match settings.backend {
        #[cfg(feature = "storage-s3")]
        UploadBackend::S3 => {
            let credentials = settings.credentials.ok_or_else(|| {
                StorageError::InvalidCredentials(
                    "S3 uploads require temporary credentials".to_string(),
                )
            })?;
            if settings.region.is_empty() {
                return Err(StorageError::ConfigError("region not configured".to_string()));
            }

            let target = S3UploadTarget::new(
                settings.bucket,
                settings.region,
                &credentials,
                settings.endpoint,
            )?;
            Ok(Arc::new(target))
        }

        #[cfg(not(feature = "storage-s3"))]
        UploadBackend::S3 => Err(StorageError::ConfigError(
            "S3 upload backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        UploadBackend::Local => {
            let base_path = settings.local_path.ok_or_else(|| {
                StorageError::ConfigError("local upload directory not configured".to_string())
            })?;
            let target = LocalUploadTarget::new(base_path, settings.bucket).await?;
            Ok(Arc::new(target))
        }

        #[cfg(not(feature = "storage-local"))]
        UploadBackend::Local => Err(StorageError::ConfigError(
            "Local upload backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
