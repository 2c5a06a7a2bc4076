//! Repository (file management) models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, PlatformResult};

const S3_SCHEME: &str = "s3://";

/// Root folder as returned by the repository API (`id` is an `s3://` URL)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryRoot {
    pub id: String,
    pub name: String,
}

/// A root folder location accessible by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageLocation {
    pub name: String,
    pub bucket: String,
    /// Key prefix inside the bucket, without leading `/`
    pub path: String,
}

impl StorageLocation {
    pub fn parse(name: &str, id: &str) -> PlatformResult<Self> {
        let rest = id.strip_prefix(S3_SCHEME).ok_or_else(|| {
            PlatformError::UnexpectedResponse(format!(
                "Storage location '{}' is not an s3:// URL: {}",
                name, id
            ))
        })?;
        let (bucket, path) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(PlatformError::UnexpectedResponse(format!(
                "Storage location '{}' has no bucket: {}",
                name, id
            )));
        }

        Ok(Self {
            name: name.to_string(),
            bucket: bucket.to_string(),
            path: path.trim_start_matches('/').to_string(),
        })
    }

    pub fn from_root(root: &RepositoryRoot) -> PlatformResult<Self> {
        Self::parse(&root.name, &root.id)
    }

    /// `s3://{bucket}/{path}`
    pub fn full_location(&self) -> String {
        format!("{}{}/{}", S3_SCHEME, self.bucket, self.path)
    }

    /// Full location of `path` inside this location; folders get a trailing `/`.
    pub fn location_with_path(&self, path: &str, is_folder: bool) -> String {
        let full = format!("{}{}", self.full_location(), path);
        if is_folder && !full.ends_with('/') {
            format!("{}/", full)
        } else {
            full
        }
    }

    /// Bucket key prefix for a folder inside this location, ending in `/`
    pub fn object_prefix(&self, path: &str) -> String {
        let prefix = format!("{}{}", self.path, path);
        if prefix.ends_with('/') {
            prefix
        } else {
            format!("{}/", prefix)
        }
    }
}

/// Sub-folder of a listed folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveExtra {
    #[serde(default)]
    pub restore_tier: Option<String>,
    #[serde(default)]
    pub restore_eta: Option<String>,
}

/// Archive (cold storage) state of a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveInfo {
    #[serde(default)]
    pub restore_state: Option<String>,
    #[serde(default)]
    pub expiration: Option<String>,
    #[serde(default)]
    pub extra: Option<ArchiveExtra>,
}

/// File of a listed folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub deleted: Option<bool>,
    #[serde(default)]
    pub archived: Option<bool>,
    #[serde(default)]
    pub archive: Option<ArchiveInfo>,
}

/// Folder listing as returned by the repository API
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FolderListing {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub folders: Vec<FolderEntry>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

impl FolderListing {
    /// Folders followed by files
    pub fn into_entries(self) -> Vec<DirectoryEntry> {
        self.folders
            .into_iter()
            .map(DirectoryEntry::Folder)
            .chain(self.files.into_iter().map(DirectoryEntry::File))
            .collect()
    }
}

/// Entry of a directory listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DirectoryEntry {
    Folder(FolderEntry),
    File(FileEntry),
}

impl DirectoryEntry {
    pub fn id(&self) -> &str {
        match self {
            DirectoryEntry::Folder(f) => &f.id,
            DirectoryEntry::File(f) => &f.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DirectoryEntry::Folder(f) => &f.name,
            DirectoryEntry::File(f) => &f.name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, DirectoryEntry::Folder(_))
    }
}

/// Sharable, authenticated upload link for a folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTicket {
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    pub url: String,
}

/// Presigned POST form: post `fields` plus a `file` part to `url`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadCredentials {
    pub url: String,
    pub fields: BTreeMap<String, String>,
}

/// Group record (platform "PO")
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub airline: Option<String>,
    pub po_name: String,
    #[serde(default)]
    pub date_due: Option<String>,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub target_system: Option<String>,
}

impl GroupRecord {
    /// Platform name of a group: `{organization_urn}_{group}`
    pub fn platform_name(organization_urn: &str, group: &str) -> String {
        format!("{}_{}", organization_urn, group)
    }

    /// Group name without the organization prefix
    pub fn group_name(&self, organization_urn: &str) -> String {
        let prefix = format!("{}_", organization_urn);
        self.po_name
            .strip_prefix(&prefix)
            .unwrap_or(&self.po_name)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_storage_location() {
        let location = StorageLocation::parse("master", "s3://cp-bucket/orgs/acme/").unwrap();
        assert_eq!(location.bucket, "cp-bucket");
        assert_eq!(location.path, "orgs/acme/");
        assert_eq!(location.full_location(), "s3://cp-bucket/orgs/acme/");
    }

    #[test]
    fn test_parse_storage_location_bucket_only() {
        let location = StorageLocation::parse("master", "s3://cp-bucket").unwrap();
        assert_eq!(location.path, "");
        assert_eq!(location.full_location(), "s3://cp-bucket/");
    }

    #[test]
    fn test_parse_rejects_non_s3() {
        assert!(StorageLocation::parse("master", "https://example.com/x").is_err());
        assert!(StorageLocation::parse("master", "s3:///path").is_err());
    }

    #[test]
    fn test_location_with_path() {
        let location = StorageLocation::parse("master", "s3://cp-bucket/orgs/acme/").unwrap();
        assert_eq!(
            location.location_with_path("movie_mp4", true),
            "s3://cp-bucket/orgs/acme/movie_mp4/"
        );
        assert_eq!(
            location.location_with_path("movie_mp4/", true),
            "s3://cp-bucket/orgs/acme/movie_mp4/"
        );
        assert_eq!(
            location.location_with_path("movie.mp4", false),
            "s3://cp-bucket/orgs/acme/movie.mp4"
        );
    }

    #[test]
    fn test_object_prefix() {
        let location = StorageLocation::parse("master", "s3://cp-bucket/orgs/acme/").unwrap();
        assert_eq!(location.object_prefix("test_folder"), "orgs/acme/test_folder/");
        assert_eq!(location.object_prefix("test_folder/"), "orgs/acme/test_folder/");
    }

    #[test]
    fn test_listing_folders_before_files() {
        let listing: FolderListing = serde_json::from_value(json!({
            "id": "s3://cp-bucket/orgs/acme/movie_mp4/",
            "name": "movie_mp4",
            "folders": [{ "id": "f1", "name": "subtitles" }],
            "files": [{
                "id": "x1",
                "name": "movie.mp4",
                "size": 1024.0,
                "last_modified": "2024-05-17T10:00:00Z",
                "deleted": false,
                "archived": false,
                "archive": null
            }]
        }))
        .unwrap();

        let entries = listing.into_entries();
        let names: Vec<&str> = entries.iter().map(DirectoryEntry::name).collect();
        assert_eq!(names, vec!["subtitles", "movie.mp4"]);
        assert!(entries[0].is_folder());
        assert!(!entries[1].is_folder());
    }

    #[test]
    fn test_group_name_strips_organization() {
        let record: GroupRecord = serde_json::from_value(json!({
            "id": "po-1",
            "po_name": "urn:janus:organization:acme_default_group"
        }))
        .unwrap();
        assert_eq!(record.group_name("urn:janus:organization:acme"), "default_group");
        assert_eq!(record.group_name("urn:janus:organization:other"), record.po_name);
        assert_eq!(
            GroupRecord::platform_name("urn:janus:organization:acme", "default_group"),
            record.po_name
        );
    }
}
