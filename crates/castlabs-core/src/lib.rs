//! castLabs Core Library
//!
//! This crate provides the configuration, error types, constants and domain models
//! shared by the Content Platform client crates.
//!
//! The platform uses its own vocabulary; this SDK renames a few terms:
//!
//! - **PO** is exposed as a *group*
//! - **PO item** is exposed as a *process*
//! - `workflow_process` is the *encoding* sub-process; together with the
//!   `publish_process` it makes up one process

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Api, ApiUrls, Credentials, Environment, PlatformConfig};
pub use error::{ErrorMetadata, LogLevel, PlatformError, PlatformResult};
pub use models::{
    DirectoryEntry, Encoding, FileEntry, FolderEntry, FolderListing, GroupRecord, Process,
    ProcessState, ProcessStatus, RepositoryRoot, Stage, StorageLocation, SubProcess,
    UploadCredentials, UploadTicket,
};
