//! S3 presigned POST (browser-based upload) signing with AWS Signature Version 4
//!
//! A presigned POST is a base64 policy document plus the form fields a client must
//! submit alongside the `file` part. Anyone holding the form can upload objects whose
//! key starts with the signed prefix until the policy expires.

use std::collections::BTreeMap;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::{json, Value};
use sha2::Sha256;

use crate::credentials::TemporaryCredentials;
use crate::keys::ensure_trailing_slash;
use crate::traits::{StorageError, StorageResult};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
const SERVER_SIDE_ENCRYPTION: &str = "AES256";
const FILENAME_PLACEHOLDER: &str = "${filename}";

/// Form the client posts to `url` together with a `file` part
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresignedPost {
    pub url: String,
    pub fields: BTreeMap<String, String>,
}

/// What a presigned POST allows
#[derive(Debug, Clone)]
pub struct PostPolicy {
    pub bucket: String,
    /// Key prefix uploads are restricted to
    pub key_prefix: String,
    pub region: String,
    /// S3-compatible endpoint; path-style URLs are used when set
    pub endpoint: Option<String>,
    pub expires_in: Duration,
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Derive the SigV4 signing key for a day, region and service.
pub fn signing_key(
    secret_access_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> Vec<u8> {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_access_key).as_bytes(),
        date_stamp.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// Hex signature of a base64 policy document.
pub fn sign_policy(signing_key: &[u8], policy_base64: &str) -> String {
    hex::encode(hmac_sha256(signing_key, policy_base64.as_bytes()))
}

/// Form URL for a bucket
pub fn post_url(bucket: &str, region: &str, endpoint: Option<&str>) -> String {
    match endpoint {
        Some(endpoint) => format!("{}/{}/", endpoint.trim_end_matches('/'), bucket),
        None if region == "us-east-1" => format!("https://{}.s3.amazonaws.com/", bucket),
        None => format!("https://{}.s3.{}.amazonaws.com/", bucket, region),
    }
}

/// Build and sign a presigned POST form valid from `now` for `policy.expires_in`.
pub fn presign_post(
    credentials: &TemporaryCredentials,
    policy: &PostPolicy,
    now: DateTime<Utc>,
) -> StorageResult<PresignedPost> {
    if policy.bucket.is_empty() {
        return Err(StorageError::ConfigError(
            "Presigned POST requires a bucket".to_string(),
        ));
    }
    if credentials.access_key_id.is_empty() || credentials.secret_access_key.is_empty() {
        return Err(StorageError::InvalidCredentials(
            "Access key id and secret are required".to_string(),
        ));
    }

    let expires_in = chrono::Duration::from_std(policy.expires_in)
        .map_err(|e| StorageError::ConfigError(format!("Invalid expiry: {}", e)))?;
    let expiration = (now + expires_in).format("%Y-%m-%dT%H:%M:%SZ").to_string();

    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();
    let credential = format!(
        "{}/{}/{}/{}/aws4_request",
        credentials.access_key_id, date_stamp, policy.region, SERVICE
    );
    let prefix = ensure_trailing_slash(&policy.key_prefix);

    let mut conditions: Vec<Value> = vec![
        json!({ "x-amz-server-side-encryption": SERVER_SIDE_ENCRYPTION }),
        json!({ "bucket": policy.bucket }),
        json!(["starts-with", "$key", prefix]),
        json!({ "x-amz-algorithm": ALGORITHM }),
        json!({ "x-amz-credential": credential }),
        json!({ "x-amz-date": amz_date }),
    ];
    if let Some(token) = &credentials.session_token {
        conditions.push(json!({ "x-amz-security-token": token }));
    }

    let document = json!({ "expiration": expiration, "conditions": conditions });
    let policy_base64 = STANDARD.encode(serde_json::to_vec(&document).map_err(|e| {
        StorageError::BackendError(format!("Failed to encode policy: {}", e))
    })?);

    let key = signing_key(
        &credentials.secret_access_key,
        &date_stamp,
        &policy.region,
        SERVICE,
    );
    let signature = sign_policy(&key, &policy_base64);

    let mut fields = BTreeMap::new();
    fields.insert("key".to_string(), format!("{}{}", prefix, FILENAME_PLACEHOLDER));
    fields.insert(
        "x-amz-server-side-encryption".to_string(),
        SERVER_SIDE_ENCRYPTION.to_string(),
    );
    fields.insert("x-amz-algorithm".to_string(), ALGORITHM.to_string());
    fields.insert("x-amz-credential".to_string(), credential);
    fields.insert("x-amz-date".to_string(), amz_date);
    if let Some(token) = &credentials.session_token {
        fields.insert("x-amz-security-token".to_string(), token.clone());
    }
    fields.insert("policy".to_string(), policy_base64);
    fields.insert("x-amz-signature".to_string(), signature);

    tracing::debug!(
        bucket = %policy.bucket,
        prefix = %prefix,
        expiration = %expiration,
        "Signed presigned POST policy"
    );

    Ok(PresignedPost {
        url: post_url(&policy.bucket, &policy.region, policy.endpoint.as_deref()),
        fields,
    })
}
