//! castLabs Storage Library
//!
//! This crate moves source media into the buckets behind Content Platform storage
//! locations. Uploads authenticate with short-lived credentials obtained through an
//! upload ticket; the same credentials sign S3 presigned POST forms for browser or
//! third-party uploads.
//!
//! # Object key format
//!
//! Objects are written below a folder prefix of the storage location:
//!
//! - **Prefix**: `{location path}{folder}/` (always ends in `/`)
//! - **Key**: `{prefix}{file name}`
//!
//! Keys must not contain `..` or a leading `/`. Key generation lives in the `keys`
//! module so every backend agrees on the layout.

pub mod credentials;
pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod presign;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use credentials::TemporaryCredentials;
pub use factory::{create_upload_target, UploadBackend, UploadTargetSettings};
#[cfg(feature = "storage-local")]
pub use local::LocalUploadTarget;
pub use presign::{presign_post, PostPolicy, PresignedPost};
#[cfg(feature = "storage-s3")]
pub use s3::S3UploadTarget;
pub use traits::{StorageError, StorageResult, UploadTarget, UploadedObject};
