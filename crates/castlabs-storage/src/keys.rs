//! Shared key generation for upload targets.
//!
//! Key format: `{prefix}{file name}` where the prefix always ends in `/`.

use std::path::Path;

use crate::traits::{StorageError, StorageResult};

/// Append a `/` unless the prefix already ends with one.
pub fn ensure_trailing_slash(prefix: &str) -> String {
    if prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}

/// Object key for a local file uploaded below `prefix`: the prefix plus the file's base name.
pub fn object_key(prefix: &str, local_path: &Path) -> StorageResult<String> {
    let file_name = local_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            StorageError::InvalidKey(format!(
                "Path has no usable file name: {}",
                local_path.display()
            ))
        })?;

    let key = format!("{}{}", ensure_trailing_slash(prefix), file_name);
    validate_key(&key)?;
    Ok(key)
}

/// Reject keys that could escape the bucket prefix.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(format!(
            "Object key contains invalid characters: {}",
            key
        )));
    }
    Ok(())
}
