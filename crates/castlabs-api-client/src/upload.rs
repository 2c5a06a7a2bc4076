//! Programmatic uploads into a storage location folder

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use castlabs_core::constants::UPLOAD_REGION;
use castlabs_core::{PlatformError, PlatformResult, StorageLocation, UploadCredentials};
use castlabs_storage::keys::object_key;
use castlabs_storage::{
    create_upload_target, presign_post, PostPolicy, TemporaryCredentials, UploadBackend,
    UploadTarget, UploadTargetSettings, UploadedObject,
};
use chrono::Utc;
use reqwest::Client;
use tokio::sync::OnceCell;

use crate::{http_error, network_error};

const TICKET_FRAGMENT: &str = "/#/";
const UPLOADER_API_PATH: &str = "/api_v1/upload/";

/// Uploads files into one folder of a storage location
///
/// Built from an upload ticket. Temporary S3 credentials are fetched from the
/// uploader on first use and reused afterwards.
pub struct UploadClient {
    http: Client,
    location: StorageLocation,
    prefix: String,
    upload_url: String,
    s3_endpoint: Option<String>,
    credentials: OnceCell<TemporaryCredentials>,
    target: OnceCell<Arc<dyn UploadTarget>>,
}

impl UploadClient {
    pub fn new(
        http: Client,
        location: StorageLocation,
        path: &str,
        upload_url: String,
        s3_endpoint: Option<String>,
    ) -> Self {
        let prefix = location.object_prefix(path);
        Self {
            http,
            location,
            prefix,
            upload_url,
            s3_endpoint,
            credentials: OnceCell::new(),
            target: OnceCell::new(),
        }
    }

    /// Write uploads to `target` instead of the location's bucket.
    pub fn with_upload_target(mut self, target: Arc<dyn UploadTarget>) -> Self {
        self.target = OnceCell::new_with(Some(target));
        self
    }

    /// Upload ticket URL; can be shared or embedded as an upload page
    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    /// Object key prefix, always ending in `/`
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// Uploader endpoint handing out credentials for the ticket
    pub fn credentials_url(&self) -> String {
        self.upload_url.replace(TICKET_FRAGMENT, UPLOADER_API_PATH)
    }

    async fn fetch_credentials(&self) -> PlatformResult<TemporaryCredentials> {
        let url = self.credentials_url();
        let response = self.http.get(&url).send().await.map_err(network_error)?;
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        let body = response.text().await.map_err(network_error)?;
        let credentials: TemporaryCredentials = serde_json::from_str(&body).map_err(|e| {
            PlatformError::UnexpectedResponse(format!("Invalid uploader credentials: {}", e))
        })?;
        tracing::info!(
            bucket = %self.location.bucket,
            prefix = %self.prefix,
            "Obtained temporary upload credentials"
        );
        Ok(credentials)
    }

    /// Temporary S3 credentials for the ticket, fetched once
    pub async fn credentials(&self) -> PlatformResult<&TemporaryCredentials> {
        self.credentials
            .get_or_try_init(|| self.fetch_credentials())
            .await
    }

    async fn build_target(&self) -> PlatformResult<Arc<dyn UploadTarget>> {
        let credentials = self.credentials().await?.clone();
        let target = create_upload_target(UploadTargetSettings {
            backend: UploadBackend::S3,
            bucket: self.location.bucket.clone(),
            region: UPLOAD_REGION.to_string(),
            credentials: Some(credentials),
            endpoint: self.s3_endpoint.clone(),
            local_path: None,
        })
        .await?;
        Ok(target)
    }

    async fn target(&self) -> PlatformResult<&Arc<dyn UploadTarget>> {
        self.target.get_or_try_init(|| self.build_target()).await
    }

    /// Upload a local file to `{prefix}{file name}`.
    pub async fn upload_file(&self, local_path: &Path) -> PlatformResult<UploadedObject> {
        let key = object_key(&self.prefix, local_path)?;
        let target = self.target().await?;
        Ok(target.upload_file(&key, local_path).await?)
    }

    /// Presigned POST form allowing uploads below the prefix for `expires_in`
    pub async fn presigned_post(&self, expires_in: Duration) -> PlatformResult<UploadCredentials> {
        let credentials = self.credentials().await?;
        let policy = PostPolicy {
            bucket: self.location.bucket.clone(),
            key_prefix: self.prefix.clone(),
            region: UPLOAD_REGION.to_string(),
            endpoint: self.s3_endpoint.clone(),
            expires_in,
        };
        let post = presign_post(credentials, &policy, Utc::now())?;

        Ok(UploadCredentials {
            url: post.url,
            fields: post.fields,
        })
    }
}

impl std::fmt::Debug for UploadClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadClient")
            .field("location", &self.location)
            .field("prefix", &self.prefix)
            .field("upload_url", &self.upload_url)
            .finish_non_exhaustive()
    }
}
