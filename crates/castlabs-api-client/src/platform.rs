//! High-level interface: upload source media, encode it, follow its status

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use castlabs_core::constants::{
    DEFAULT_FORMAT_SPECIFIC_DATA, DEFAULT_GROUP, DEFAULT_PRESIGNED_POST_EXPIRY_SECS,
    DEFAULT_TEMPLATE,
};
use castlabs_core::{
    Encoding, PlatformConfig, PlatformError, PlatformResult, StorageLocation, UploadCredentials,
};
use castlabs_storage::{create_upload_target, UploadBackend, UploadTargetSettings};
use tokio::sync::{Mutex, OnceCell};
use tokio::time::{sleep, Instant};

use crate::repository::Repository;
use crate::upload::UploadClient;
use crate::workflow::{EncodingOptions, Workflow};
use crate::ApiClient;

/// Parameters of [`ContentPlatform::start_encoding`]
#[derive(Debug, Clone)]
pub struct EncodeRequest {
    pub group_name: String,
    /// Defaults to the last segment of the remote path
    pub encode_name: Option<String>,
    pub template: String,
    pub format_specific_data: String,
    pub webhook_url: Option<String>,
}

impl Default for EncodeRequest {
    fn default() -> Self {
        Self {
            group_name: DEFAULT_GROUP.to_string(),
            encode_name: None,
            template: DEFAULT_TEMPLATE.to_string(),
            format_specific_data: DEFAULT_FORMAT_SPECIFIC_DATA.to_string(),
            webhook_url: None,
        }
    }
}

/// Selects an encoding by remote path and/or encode name
#[derive(Debug, Clone)]
pub struct StatusQuery {
    pub remote_path: Option<String>,
    pub group_name: String,
    pub encode_name: Option<String>,
}

impl StatusQuery {
    pub fn by_remote_path(remote_path: impl Into<String>) -> Self {
        Self {
            remote_path: Some(remote_path.into()),
            group_name: DEFAULT_GROUP.to_string(),
            encode_name: None,
        }
    }

    pub fn by_encode_name(encode_name: impl Into<String>) -> Self {
        Self {
            remote_path: None,
            group_name: DEFAULT_GROUP.to_string(),
            encode_name: Some(encode_name.into()),
        }
    }

    pub fn in_group(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = group_name.into();
        self
    }

    /// Encode name, falling back to the last segment of the remote path
    pub fn resolve_encode_name(&self) -> PlatformResult<String> {
        match (&self.encode_name, &self.remote_path) {
            (Some(name), _) if !name.is_empty() => Ok(name.clone()),
            (_, Some(path)) => default_encode_name(path),
            _ => Err(PlatformError::InvalidInput(
                "One of remote_path and encode_name must be provided".to_string(),
            )),
        }
    }
}

/// Last non-empty `/` segment of a remote path
pub fn default_encode_name(remote_path: &str) -> PlatformResult<String> {
    remote_path
        .split('/')
        .rev()
        .find(|segment| !segment.is_empty())
        .map(String::from)
        .ok_or_else(|| {
            PlatformError::InvalidInput(format!(
                "Cannot derive an encode name from remote path '{}'",
                remote_path
            ))
        })
}

/// Remote folder for a local file: its base name with `.` replaced by `_`
pub fn default_remote_path(file_path: &Path) -> PlatformResult<String> {
    file_path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.replace('.', "_"))
        .ok_or_else(|| {
            PlatformError::InvalidInput(format!(
                "Path has no usable file name: {}",
                file_path.display()
            ))
        })
}

/// Upload-and-encode interface over the repository and workflow APIs
///
/// The storage location is resolved on first use; upload clients are created once
/// per remote path and reused.
pub struct ContentPlatform {
    client: ApiClient,
    repository: Repository,
    workflow: Workflow,
    location: OnceCell<StorageLocation>,
    upload_clients: Mutex<HashMap<String, Arc<UploadClient>>>,
    local_upload_dir: Option<PathBuf>,
}

impl ContentPlatform {
    /// Authenticate and build the platform interface.
    pub async fn connect(config: PlatformConfig) -> PlatformResult<Self> {
        let client = ApiClient::connect(config).await?;
        Ok(Self::from_client(client))
    }

    /// [`ContentPlatform::connect`] with configuration from environment variables
    pub async fn from_env() -> PlatformResult<Self> {
        Self::connect(PlatformConfig::from_env()?).await
    }

    pub fn from_client(client: ApiClient) -> Self {
        Self {
            repository: Repository::new(client.clone()),
            workflow: Workflow::new(client.clone()),
            client,
            location: OnceCell::new(),
            upload_clients: Mutex::new(HashMap::new()),
            local_upload_dir: None,
        }
    }

    /// Write uploaded files below `dir` instead of the storage bucket.
    ///
    /// Upload tickets are still issued; only the object writes are redirected.
    pub fn with_local_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_upload_dir = Some(dir.into());
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// Default storage location, resolved once
    pub async fn storage_location(&self) -> PlatformResult<&StorageLocation> {
        self.location
            .get_or_try_init(|| self.repository.storage_location(None))
            .await
    }

    async fn upload_client(&self, remote_path: &str) -> PlatformResult<Arc<UploadClient>> {
        let mut clients = self.upload_clients.lock().await;
        if let Some(client) = clients.get(remote_path) {
            return Ok(Arc::clone(client));
        }

        let location = self.storage_location().await?;
        let mut upload_client = self
            .repository
            .create_upload_client(location, remote_path, "")
            .await?;

        if let Some(dir) = &self.local_upload_dir {
            let target = create_upload_target(UploadTargetSettings {
                backend: UploadBackend::Local,
                bucket: location.bucket.clone(),
                local_path: Some(dir.clone()),
                ..Default::default()
            })
            .await?;
            upload_client = upload_client.with_upload_target(target);
        }

        let upload_client = Arc::new(upload_client);
        clients.insert(remote_path.to_string(), Arc::clone(&upload_client));
        Ok(upload_client)
    }

    /// Shareable upload URL for a remote folder
    pub async fn upload_url(&self, remote_path: &str) -> PlatformResult<String> {
        Ok(self.upload_client(remote_path).await?.upload_url().to_string())
    }

    /// Upload a local file and return the remote folder it went to.
    pub async fn upload_file(
        &self,
        file_path: &Path,
        remote_path: Option<&str>,
    ) -> PlatformResult<String> {
        let remote_path = match remote_path {
            Some(path) => path.to_string(),
            None => default_remote_path(file_path)?,
        };

        let object = self
            .upload_client(&remote_path)
            .await?
            .upload_file(file_path)
            .await?;
        tracing::info!(
            remote_path = %remote_path,
            bucket = %object.bucket,
            key = %object.key,
            size_bytes = object.size_bytes,
            "File uploaded"
        );

        Ok(remote_path)
    }

    /// Presigned POST form for uploading into a remote folder
    pub async fn upload_credentials(&self, remote_path: &str) -> PlatformResult<UploadCredentials> {
        self.upload_client(remote_path)
            .await?
            .presigned_post(Duration::from_secs(DEFAULT_PRESIGNED_POST_EXPIRY_SECS))
            .await
    }

    /// Names of the folders and files in a remote folder
    pub async fn list_files(&self, remote_path: &str) -> PlatformResult<Vec<String>> {
        let location = self.storage_location().await?;
        let entries = self
            .repository
            .directory_contents(location, remote_path, false)
            .await?;
        Ok(entries
            .into_iter()
            .map(|entry| entry.name().to_string())
            .collect())
    }

    /// Encode the files uploaded to a remote folder.
    pub async fn start_encoding(
        &self,
        remote_path: &str,
        request: &EncodeRequest,
    ) -> PlatformResult<Encoding> {
        let encode_name = match &request.encode_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => default_encode_name(remote_path)?,
        };
        let options = EncodingOptions {
            template: request.template.clone(),
            format_specific_data: request.format_specific_data.clone(),
            webhook_url: request.webhook_url.clone(),
            ..Default::default()
        };

        let location = self.storage_location().await?;
        let mut process = self
            .workflow
            .create_vod_encoding(
                location,
                remote_path,
                &request.group_name,
                &encode_name,
                &options,
            )
            .await?;
        self.workflow.refresh_state(&mut process).await?;

        Ok(Encoding::from_process(
            &process,
            &request.group_name,
            &encode_name,
        ))
    }

    /// Current status of an encoding
    pub async fn status(&self, query: &StatusQuery) -> PlatformResult<Encoding> {
        let encode_name = query.resolve_encode_name()?;
        let process = self
            .workflow
            .process(&query.group_name, &encode_name)
            .await?;

        Ok(Encoding::from_process(
            &process,
            &query.group_name,
            &encode_name,
        ))
    }

    /// Names of all groups
    pub async fn groups(&self) -> PlatformResult<Vec<String>> {
        self.workflow.groups().await
    }

    /// Poll [`ContentPlatform::status`] until the encoding is complete.
    pub async fn wait_for_completion(
        &self,
        query: &StatusQuery,
        poll_interval: Duration,
        timeout: Duration,
    ) -> PlatformResult<Encoding> {
        if poll_interval.is_zero() {
            return Err(PlatformError::InvalidInput(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        let deadline = Instant::now() + timeout;
        loop {
            let encoding = self.status(query).await?;
            if encoding.complete() {
                tracing::info!(
                    process_id = %encoding.encode_name,
                    status = %encoding.status,
                    "Encoding complete"
                );
                return Ok(encoding);
            }

            if Instant::now() + poll_interval > deadline {
                return Err(PlatformError::Timeout(format!(
                    "Encoding {} still {} after {:?}",
                    encoding.encode_name, encoding.status, timeout
                )));
            }

            tracing::debug!(
                process_id = %encoding.encode_name,
                status = %encoding.status,
                "Encoding in progress"
            );
            sleep(poll_interval).await;
        }
    }
}
