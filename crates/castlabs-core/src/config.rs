//! Configuration module
//!
//! Credentials, environment selection and endpoint URLs. Configuration can be built
//! in code or read from environment variables:
//!
//! - `ORGANIZATION_URN`, `USER_URN`, `API_ACCESS_KEY_ID`, `API_SECRET_ACCESS_KEY` (required)
//! - `CASTLABS_ENVIRONMENT` (`production` or `staging`)
//! - `CASTLABS_AUTH_URL`, `CASTLABS_WORKFLOW_URL`, `CASTLABS_REPOSITORY_URL` (endpoint overrides)
//! - `CASTLABS_REQUEST_TIMEOUT_SECS`
//! - `CASTLABS_S3_ENDPOINT` (S3-compatible endpoint for uploads)

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::error::{PlatformError, PlatformResult};

/// Platform environment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Staging,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Staging => "staging",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "staging" | "stag" => Ok(Environment::Staging),
            other => Err(PlatformError::Config(format!(
                "Unknown environment '{}', expected 'production' or 'staging'",
                other
            ))),
        }
    }
}

/// GraphQL APIs exposed by the platform
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Api {
    Workflow,
    Repository,
}

impl Api {
    pub fn as_str(&self) -> &'static str {
        match self {
            Api::Workflow => "workflow",
            Api::Repository => "repository",
        }
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Endpoint URLs of one platform environment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiUrls {
    pub credential_exchange: String,
    pub workflow: String,
    pub repository: String,
}

impl ApiUrls {
    pub fn production() -> Self {
        Self {
            credential_exchange: "https://auth.castlabs.com/api/v1/keypair/credentialexchange"
                .to_string(),
            workflow: "https://workflow.content.castlabs.com/graphql".to_string(),
            repository: "https://repository.content.castlabs.com/graphql".to_string(),
        }
    }

    pub fn staging() -> Self {
        Self {
            credential_exchange:
                "https://auth.test.cs.castlabs.com/api/v1/keypair/credentialexchange".to_string(),
            workflow: "https://workflow.content-stag.castlabs.com/graphql".to_string(),
            repository: "https://repository.content-stag.castlabs.com/graphql".to_string(),
        }
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
        }
    }

    /// GraphQL endpoint of the given API
    pub fn endpoint(&self, api: Api) -> &str {
        match api {
            Api::Workflow => &self.workflow,
            Api::Repository => &self.repository,
        }
    }
}

/// API key credentials, supplied once at construction
#[derive(Clone)]
pub struct Credentials {
    organization_urn: String,
    user_urn: String,
    access_key_id: String,
    secret_access_key: String,
}

impl Credentials {
    pub fn new(
        organization_urn: impl Into<String>,
        user_urn: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            organization_urn: organization_urn.into(),
            user_urn: user_urn.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    pub fn organization_urn(&self) -> &str {
        &self.organization_urn
    }

    /// Last segment of the organization URN
    pub fn organization_id(&self) -> &str {
        self.organization_urn
            .rsplit(':')
            .next()
            .unwrap_or(&self.organization_urn)
    }

    pub fn user_urn(&self) -> &str {
        &self.user_urn
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("organization_urn", &self.organization_urn)
            .field("user_urn", &self.user_urn)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .finish()
    }
}

/// Variables without prefix, matching the names used by the platform's tooling
#[derive(Deserialize)]
struct CredentialVars {
    organization_urn: String,
    user_urn: String,
    api_access_key_id: String,
    api_secret_access_key: String,
}

/// `CASTLABS_`-prefixed variables
#[derive(Deserialize, Default)]
struct PlatformVars {
    environment: Option<String>,
    auth_url: Option<String>,
    workflow_url: Option<String>,
    repository_url: Option<String>,
    request_timeout_secs: Option<u64>,
    s3_endpoint: Option<String>,
}

/// SDK configuration
#[derive(Clone, Debug)]
pub struct PlatformConfig {
    credentials: Credentials,
    environment: Environment,
    urls: ApiUrls,
    request_timeout: Duration,
    s3_endpoint: Option<String>,
}

impl PlatformConfig {
    pub fn new(credentials: Credentials, environment: Environment) -> Self {
        Self {
            credentials,
            environment,
            urls: ApiUrls::for_environment(environment),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            s3_endpoint: None,
        }
    }

    /// Replace all endpoint URLs (e.g. for a private deployment or tests)
    pub fn with_urls(mut self, urls: ApiUrls) -> Self {
        self.urls = urls;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Upload through an S3-compatible endpoint instead of AWS
    pub fn with_s3_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.s3_endpoint = Some(endpoint.into());
        self
    }

    pub fn from_env() -> PlatformResult<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from an iterator of `(name, value)` variables.
    pub fn from_vars<I>(vars: I) -> PlatformResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();

        let creds: CredentialVars = envy::from_iter(vars.clone()).map_err(|e| {
            PlatformError::Config(format!("Missing or invalid credentials: {}", e))
        })?;
        let platform: PlatformVars = envy::prefixed("CASTLABS_")
            .from_iter(vars)
            .map_err(|e| PlatformError::Config(e.to_string()))?;

        let environment = match platform.environment.as_deref() {
            Some(value) => value.parse()?,
            None => Environment::default(),
        };

        let credentials = Credentials::new(
            creds.organization_urn,
            creds.user_urn,
            creds.api_access_key_id,
            creds.api_secret_access_key,
        );

        let mut config = Self::new(credentials, environment);
        if let Some(url) = platform.auth_url {
            config.urls.credential_exchange = url;
        }
        if let Some(url) = platform.workflow_url {
            config.urls.workflow = url;
        }
        if let Some(url) = platform.repository_url {
            config.urls.repository = url;
        }
        if let Some(secs) = platform.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        config.s3_endpoint = platform.s3_endpoint.filter(|s| !s.is_empty());

        Ok(config)
    }

    pub fn validate(&self) -> PlatformResult<()> {
        let creds = &self.credentials;
        let required = [
            ("organization URN", creds.organization_urn()),
            ("user URN", creds.user_urn()),
            ("access key id", creds.access_key_id()),
            ("secret access key", creds.secret_access_key()),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(PlatformError::Config(format!("{} must not be empty", name)));
            }
        }

        if !creds.organization_urn().starts_with("urn:") {
            return Err(PlatformError::Config(format!(
                "Organization URN must start with 'urn:', got '{}'",
                creds.organization_urn()
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(PlatformError::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn organization_urn(&self) -> &str {
        self.credentials.organization_urn()
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn urls(&self) -> &ApiUrls {
        &self.urls
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.s3_endpoint.as_deref()
    }
}
