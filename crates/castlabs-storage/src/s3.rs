use crate::credentials::TemporaryCredentials;
use crate::keys::validate_key;
use crate::traits::{StorageError, StorageResult, UploadTarget, UploadedObject};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::{ObjectStoreExt, PutPayload, Result as ObjectResult, WriteMultipart};
use tokio::io::AsyncReadExt;

/// Files larger than this are sent as a multipart upload
pub const MULTIPART_THRESHOLD: u64 = 5 * 1024 * 1024;
/// Smallest part S3 accepts, except for the last one
pub const PART_SIZE: usize = 5 * 1024 * 1024;
const MAX_PARTS: u64 = 10_000;
const MAX_CONCURRENT_PARTS: usize = 4;
const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Part size for a file of `size` bytes, grown so the upload stays within the S3 part limit
pub fn part_size_for(size: u64) -> usize {
    let needed = size.div_ceil(MAX_PARTS);
    (needed as usize).max(PART_SIZE)
}

/// S3 upload target authenticated with temporary credentials
#[derive(Clone)]
pub struct S3UploadTarget {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3UploadTarget {
    /// Create a new S3UploadTarget
    ///
    /// # Arguments
    /// * `bucket` - Bucket of the storage location
    /// * `region` - AWS region of the bucket
    /// * `credentials` - Credentials issued for the upload ticket
    /// * `endpoint_url` - Optional S3-compatible endpoint (e.g. "http://localhost:9000" for MinIO)
    pub fn new(
        bucket: String,
        region: String,
        credentials: &TemporaryCredentials,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone())
            .with_access_key_id(credentials.access_key_id.clone())
            .with_secret_access_key(credentials.secret_access_key.clone());

        if let Some(ref token) = credentials.session_token {
            builder = builder.with_token(token.clone());
        }

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3UploadTarget {
            store,
            bucket,
            region,
            endpoint_url,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// `s3://` URL of an object, as used by the repository API
    pub fn object_url(&self, key: &str) -> String {
        match self.endpoint_url {
            Some(ref endpoint) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.bucket,
                key
            ),
            None => format!("s3://{}/{}", self.bucket, key),
        }
    }

    async fn upload_multipart(
        &self,
        key: &str,
        path: &std::path::Path,
        size: u64,
    ) -> StorageResult<UploadedObject> {
        let location = Path::from(key.to_string());
        let start = std::time::Instant::now();
        let mut file = tokio::fs::File::open(path).await?;

        let upload = self.store.put_multipart(&location).await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                "Failed to create multipart upload"
            );
            StorageError::UploadFailed(e.to_string())
        })?;
        let part_size = part_size_for(size);
        let mut writer = WriteMultipart::new_with_chunk_size(upload, part_size);

        let total_size = match stream_file(&mut file, &mut writer).await {
            Ok(total_size) => total_size,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    "S3 multipart upload failed"
                );
                if let Err(abort_err) = writer.abort().await {
                    tracing::warn!(
                        error = %abort_err,
                        key = %key,
                        "Failed to abort multipart upload"
                    );
                }
                return Err(e);
            }
        };

        writer.finish().await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                "Failed to complete multipart upload"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            url = %self.object_url(key),
            size_bytes = total_size,
            parts = total_size.div_ceil(part_size as u64),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 multipart upload successful"
        );

        Ok(UploadedObject {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            size_bytes: total_size,
        })
    }
}

/// Feed a file into `writer` chunk by chunk, returning the number of bytes read.
async fn stream_file(
    file: &mut tokio::fs::File,
    writer: &mut WriteMultipart,
) -> StorageResult<u64> {
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    let mut total_size = 0u64;
    loop {
        let bytes_read = file.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        writer
            .wait_for_capacity(MAX_CONCURRENT_PARTS)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        writer.write(&buffer[..bytes_read]);
        total_size += bytes_read as u64;
    }
    Ok(total_size)
}

#[async_trait]
impl UploadTarget for S3UploadTarget {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload_bytes(&self, key: &str, data: Bytes) -> StorageResult<UploadedObject> {
        validate_key(key)?;
        let size = data.len() as u64;
        let location = Path::from(key.to_string());
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.put(&location, PutPayload::from(data)).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            url = %self.object_url(key),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(UploadedObject {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            size_bytes: size,
        })
    }

    async fn upload_file(
        &self,
        key: &str,
        path: &std::path::Path,
    ) -> StorageResult<UploadedObject> {
        validate_key(key)?;
        let size = tokio::fs::metadata(path).await?.len();
        if size <= MULTIPART_THRESHOLD {
            let data = tokio::fs::read(path).await?;
            return self.upload_bytes(key, Bytes::from(data)).await;
        }
        self.upload_multipart(key, path, size).await
    }
}
