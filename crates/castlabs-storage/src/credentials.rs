//! Temporary S3 credentials issued for an upload ticket

use std::fmt;

use serde::Deserialize;

/// Short-lived AWS credentials returned by the uploader endpoint
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

impl TemporaryCredentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
        }
    }
}

impl fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_uploader_response() {
        let creds: TemporaryCredentials = serde_json::from_str(
            r#"{"AccessKeyId":"ASIA1","SecretAccessKey":"s3cr3t","SessionToken":"tok","Expiration":"2024-05-17T11:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(creds.access_key_id, "ASIA1");
        assert_eq!(creds.session_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = TemporaryCredentials::new("ASIA1", "s3cr3t", Some("tok".to_string()));
        let debug = format!("{:?}", creds);
        assert!(debug.contains("ASIA1"));
        assert!(!debug.contains("s3cr3t"));
        assert!(!debug.contains("tok\""));
    }
}
