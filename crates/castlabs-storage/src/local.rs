use crate::keys::validate_key;
use crate::traits::{StorageError, StorageResult, UploadTarget, UploadedObject};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Upload target writing objects below a local directory
///
/// The directory stands in for a bucket; keys map onto relative paths. Useful for
/// dry runs and for mirroring uploads without network access.
#[derive(Clone)]
pub struct LocalUploadTarget {
    base_path: PathBuf,
    bucket: String,
}

impl LocalUploadTarget {
    /// Create a new LocalUploadTarget, creating `base_path` if needed
    pub async fn new(base_path: impl Into<PathBuf>, bucket: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create upload directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalUploadTarget { base_path, bucket })
    }

    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl UploadTarget for LocalUploadTarget {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload_bytes(&self, key: &str, data: Bytes) -> StorageResult<UploadedObject> {
        let path = self.key_to_path(key)?;
        let size = data.len() as u64;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let start = std::time::Instant::now();

        let write = async {
            let mut file = fs::File::create(&path).await?;
            file.write_all(&data).await?;
            file.sync_all().await
        };
        write.await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local upload successful"
        );

        Ok(UploadedObject {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            size_bytes: size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_local_upload_bytes() {
        let dir = tempdir().unwrap();
        let target = LocalUploadTarget::new(dir.path(), "cp-upload".to_string())
            .await
            .unwrap();

        let object = target
            .upload_bytes("orgs/acme/movie_mp4/movie.mp4", Bytes::from_static(b"test data"))
            .await
            .unwrap();

        assert_eq!(object.bucket, "cp-upload");
        assert_eq!(object.size_bytes, 9);
        let written = std::fs::read(dir.path().join("orgs/acme/movie_mp4/movie.mp4")).unwrap();
        assert_eq!(written, b"test data");
    }

    #[tokio::test]
    async fn test_local_upload_file() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.mp4");
        std::fs::write(&source, b"frames").unwrap();

        let target = LocalUploadTarget::new(dir.path().join("bucket"), "cp-upload".to_string())
            .await
            .unwrap();
        let object = target.upload_file("media/source.mp4", &source).await.unwrap();

        assert_eq!(object.key, "media/source.mp4");
        assert_eq!(object.size_bytes, 6);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let target = LocalUploadTarget::new(dir.path(), "cp-upload".to_string())
            .await
            .unwrap();

        let result = target
            .upload_bytes("../../../etc/passwd", Bytes::from_static(b"x"))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = target.upload_bytes("/etc/passwd", Bytes::from_static(b"x")).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_missing_source_file() {
        let dir = tempdir().unwrap();
        let target = LocalUploadTarget::new(dir.path(), "cp-upload".to_string())
            .await
            .unwrap();
        let result = target
            .upload_file("media/missing.mp4", &dir.path().join("missing.mp4"))
            .await;
        assert!(matches!(result, Err(StorageError::IoError(_))));
    }
}
