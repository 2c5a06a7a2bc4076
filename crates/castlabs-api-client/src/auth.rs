//! Keypair authentication
//!
//! The API secret never leaves the process. A signing key is derived from the secret,
//! the current UTC date and the user URN through a chain of HMAC-SHA256 steps; it
//! signs a small JSON payload with HMAC-SHA1, and the credential exchange endpoint
//! answers with session tokens for the GraphQL APIs.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use castlabs_core::constants::SIGNATURE_HEADER;
use castlabs_core::{PlatformConfig, PlatformError, PlatformResult};
use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::Sha256;

use crate::{http_error, network_error};

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

const SECRET_KEY_PREFIX: &str = "castLabs ";
const SIGNING_SCOPE: &str = "castLabs-api_auth";

/// Tokens returned by the credential exchange
#[derive(Clone, Deserialize)]
pub struct SessionTokens {
    pub id_token: String,
    pub access_token: String,
}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens")
            .field("id_token", &"<redacted>")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct ExchangePayload<'a> {
    access_key_id: &'a str,
    timestamp: String,
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Derive the per-day, per-user signing key.
///
/// `date` is the UTC date as `YYYY-MM-DD`.
pub fn derive_signing_key(secret_access_key: &str, user_urn: &str, date: &str) -> Vec<u8> {
    let secret_token = hmac_sha256(
        format!("{}{}", SECRET_KEY_PREFIX, secret_access_key).as_bytes(),
        date.as_bytes(),
    );
    let user_token = hmac_sha256(&secret_token, user_urn.as_bytes());
    hmac_sha256(&user_token, SIGNING_SCOPE.as_bytes())
}

/// Base64 HMAC-SHA1 of `payload`
pub fn sign_payload(signing_key: &[u8], payload: &[u8]) -> String {
    let mut mac = HmacSha1::new_from_slice(signing_key).expect("HMAC accepts any key size");
    mac.update(payload);
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Signature sent in the `X-Castlabs-Keypair-Signature` header
pub fn derive_signature(
    secret_access_key: &str,
    user_urn: &str,
    date: &str,
    payload: &[u8],
) -> String {
    sign_payload(
        &derive_signing_key(secret_access_key, user_urn, date),
        payload,
    )
}

/// Compact JSON payload `{"access_key_id":..,"timestamp":..}` for the given instant
pub fn exchange_payload(access_key_id: &str, now: DateTime<Utc>) -> PlatformResult<String> {
    let payload = ExchangePayload {
        access_key_id,
        timestamp: now.to_rfc3339_opts(SecondsFormat::Micros, false),
    };
    Ok(serde_json::to_string(&payload)?)
}

/// Exchange the API keypair for session tokens.
pub async fn authenticate(
    client: &Client,
    config: &PlatformConfig,
) -> PlatformResult<SessionTokens> {
    authenticate_at(client, config, Utc::now()).await
}

/// [`authenticate`] with an explicit clock.
pub async fn authenticate_at(
    client: &Client,
    config: &PlatformConfig,
    now: DateTime<Utc>,
) -> PlatformResult<SessionTokens> {
    let credentials = config.credentials();
    let payload = exchange_payload(credentials.access_key_id(), now)?;
    let date = now.format("%Y-%m-%d").to_string();
    let signature = derive_signature(
        credentials.secret_access_key(),
        credentials.user_urn(),
        &date,
        payload.as_bytes(),
    );

    let url = &config.urls().credential_exchange;
    let start = std::time::Instant::now();

    let response = client
        .post(url)
        .header(SIGNATURE_HEADER, signature)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(payload)
        .timeout(config.request_timeout())
        .send()
        .await
        .map_err(network_error)?;

    let status = response.status();
    if !status.is_success() {
        let err = http_error(response).await;
        tracing::error!(
            error = %err,
            status = status.as_u16(),
            url = %url,
            "Credential exchange failed"
        );
        return Err(err);
    }

    let tokens: SessionTokens = response.json().await.map_err(|e| {
        PlatformError::Authentication(format!("Invalid credential exchange response: {}", e))
    })?;

    tracing::info!(
        user_urn = %credentials.user_urn(),
        organization_urn = %credentials.organization_urn(),
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Authenticated successfully with the castLabs API"
    );

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_signing_key_vector() {
        let key = derive_signing_key("test-secret", "urn:janus:user:42", "2024-05-17");
        assert_eq!(
            key.iter().map(|b| format!("{:02x}", b)).collect::<String>(),
            "744cbb5b2733a2ce0a01eb39c35ba8536ff4118171e37b7b1c087ceed2a19f59"
        );
    }

    #[test]
    fn test_signature_vector() {
        let payload = r#"{"access_key_id":"AKID","timestamp":"2024-05-17T10:00:00.000000+00:00"}"#;
        let signature = derive_signature(
            "test-secret",
            "urn:janus:user:42",
            "2024-05-17",
            payload.as_bytes(),
        );
        assert_eq!(signature, "MEvwwiCqc98g7KglK2AbrZnG8Es=");
    }

    #[test]
    fn test_exchange_payload_format() {
        let now = Utc.with_ymd_and_hms(2024, 5, 17, 10, 0, 0).unwrap();
        let payload = exchange_payload("AKID", now).unwrap();
        assert_eq!(
            payload,
            r#"{"access_key_id":"AKID","timestamp":"2024-05-17T10:00:00.000000+00:00"}"#
        );
    }

    #[test]
    fn test_signature_depends_on_date() {
        let payload = b"{}";
        let today = derive_signature("s", "urn:janus:user:1", "2024-05-17", payload);
        let tomorrow = derive_signature("s", "urn:janus:user:1", "2024-05-18", payload);
        assert_ne!(today, tomorrow);
    }

    #[test]
    fn test_tokens_debug_redacted() {
        let tokens = SessionTokens {
            id_token: "id-secret".to_string(),
            access_token: "access-secret".to_string(),
        };
        let debug = format!("{:?}", tokens);
        assert!(!debug.contains("id-secret"));
        assert!(!debug.contains("access-secret"));
    }
}
