//! Repository API: storage locations, directory listings and upload tickets

use castlabs_core::{
    Api, DirectoryEntry, FolderListing, PlatformError, PlatformResult, RepositoryRoot,
    StorageLocation, UploadTicket,
};
use serde_json::json;

use crate::queries::{
    CREATE_UPLOAD_TICKET, CREATE_UPLOAD_TICKET_OPERATION, FOLDER_LIST, FOLDER_LIST_OPERATION,
    GET_ROOTS, GET_ROOTS_OPERATION,
};
use crate::upload::UploadClient;
use crate::{ApiClient, GraphQlRequest};

/// File management on the platform
#[derive(Clone, Debug)]
pub struct Repository {
    client: ApiClient,
}

impl Repository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// All root folders the user can access
    pub async fn storage_locations(&self) -> PlatformResult<Vec<StorageLocation>> {
        tracing::info!(operation = GET_ROOTS_OPERATION, "Getting storage locations");
        let request = GraphQlRequest::new(GET_ROOTS_OPERATION, GET_ROOTS, json!({}));
        let roots: Vec<RepositoryRoot> = self
            .client
            .query(Api::Repository, &request, "roots")
            .await?;

        roots.iter().map(StorageLocation::from_root).collect()
    }

    /// The location called `name`, or the first location when no name is given
    pub async fn storage_location(&self, name: Option<&str>) -> PlatformResult<StorageLocation> {
        self.storage_locations()
            .await?
            .into_iter()
            .find(|location| name.map_or(true, |name| location.name == name))
            .ok_or_else(|| {
                PlatformError::StorageLocationNotFound(name.unwrap_or_default().to_string())
            })
    }

    /// Folders followed by files of `route` inside `location`
    pub async fn directory_contents(
        &self,
        location: &StorageLocation,
        route: &str,
        show_deleted: bool,
    ) -> PlatformResult<Vec<DirectoryEntry>> {
        let folder_id = location.location_with_path(route, true);
        tracing::info!(
            operation = FOLDER_LIST_OPERATION,
            folder = %folder_id,
            "Getting content of directory"
        );

        let request = GraphQlRequest::new(
            FOLDER_LIST_OPERATION,
            FOLDER_LIST,
            json!({ "id": folder_id, "show_deleted": show_deleted }),
        );
        let listing: FolderListing = self
            .client
            .query_object(Api::Repository, &request, "folder")
            .await?;

        Ok(listing.into_entries())
    }

    /// Create a sharable, authenticated upload link for a folder.
    ///
    /// `message` is shown to users opening the link in a browser.
    pub async fn create_upload_ticket(
        &self,
        aws_key: &str,
        message: &str,
    ) -> PlatformResult<UploadTicket> {
        tracing::info!(
            operation = CREATE_UPLOAD_TICKET_OPERATION,
            folder = %aws_key,
            "Creating upload ticket"
        );

        let request = GraphQlRequest::new(
            CREATE_UPLOAD_TICKET_OPERATION,
            CREATE_UPLOAD_TICKET,
            json!({ "folder_id": aws_key, "message": message }),
        );
        self.client
            .query_object(Api::Repository, &request, "createUploadTicket")
            .await
    }

    /// Upload client for `path` inside `location`, backed by a fresh upload ticket
    pub async fn create_upload_client(
        &self,
        location: &StorageLocation,
        path: &str,
        message: &str,
    ) -> PlatformResult<UploadClient> {
        let ticket = self
            .create_upload_ticket(&location.location_with_path(path, true), message)
            .await?;

        Ok(UploadClient::new(
            self.client.http().clone(),
            location.clone(),
            path,
            ticket.url,
            self.client.config().s3_endpoint().map(String::from),
        ))
    }
}
