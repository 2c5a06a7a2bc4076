//! Client for the castLabs Content Platform.
//!
//! [`ApiClient`] authenticates with the API keypair and sends signed GraphQL requests
//! to the workflow and repository APIs. [`Repository`] and [`Workflow`] are thin
//! views over a shared client; [`ContentPlatform`] combines both into a high-level
//! upload-and-encode interface.

pub mod auth;
pub mod platform;
pub mod queries;
pub mod repository;
pub mod upload;
pub mod workflow;

pub use auth::SessionTokens;
pub use platform::{ContentPlatform, EncodeRequest, StatusQuery};
pub use repository::Repository;
pub use upload::UploadClient;
pub use workflow::{EncodingOptions, Workflow};

use std::sync::Arc;

use castlabs_core::constants::ORGANIZATION_HEADER;
use castlabs_core::{Api, PlatformConfig, PlatformError, PlatformResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// GraphQL request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub operation_name: String,
    pub variables: Value,
    pub query: String,
}

impl GraphQlRequest {
    pub fn new(operation_name: &str, query: &str, variables: Value) -> Self {
        Self {
            operation_name: operation_name.to_string(),
            variables,
            query: query.to_string(),
        }
    }
}

pub(crate) fn network_error(err: reqwest::Error) -> PlatformError {
    if err.is_timeout() {
        PlatformError::Timeout(err.to_string())
    } else {
        PlatformError::Network(err.to_string())
    }
}

/// Turn a non-success response into [`PlatformError::Http`].
pub(crate) async fn http_error(response: reqwest::Response) -> PlatformError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    PlatformError::Http { status, body }
}

pub(crate) fn build_http_client(config: &PlatformConfig) -> PlatformResult<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| PlatformError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Authenticated GraphQL client, cheap to clone.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    config: Arc<PlatformConfig>,
    tokens: Arc<SessionTokens>,
}

impl ApiClient {
    /// Validate the configuration and authenticate.
    pub async fn connect(config: PlatformConfig) -> PlatformResult<Self> {
        config.validate()?;
        let client = build_http_client(&config)?;
        let tokens = auth::authenticate(&client, &config).await?;

        Ok(Self {
            client,
            config: Arc::new(config),
            tokens: Arc::new(tokens),
        })
    }

    /// Build a client from tokens obtained elsewhere.
    pub fn with_tokens(config: PlatformConfig, tokens: SessionTokens) -> PlatformResult<Self> {
        let client = build_http_client(&config)?;
        Ok(Self {
            client,
            config: Arc::new(config),
            tokens: Arc::new(tokens),
        })
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn organization_urn(&self) -> &str {
        self.config.organization_urn()
    }

    pub fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    async fn query_value(
        &self,
        api: Api,
        request: &GraphQlRequest,
        content_key: &str,
    ) -> PlatformResult<Value> {
        let url = self.config.urls().endpoint(api);
        let start = std::time::Instant::now();

        tracing::debug!(
            api = %api,
            operation = %request.operation_name,
            variables = %request.variables,
            "Querying API"
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.tokens.access_token)
            .header(ORGANIZATION_HEADER, self.organization_urn())
            .json(request)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            let err = http_error(response).await;
            tracing::warn!(
                api = %api,
                operation = %request.operation_name,
                status = status.as_u16(),
                "API request failed"
            );
            return Err(err);
        }

        let body = response.text().await.map_err(network_error)?;
        tracing::debug!(
            api = %api,
            operation = %request.operation_name,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            response = %body,
            "Received response"
        );

        let mut json: Value = serde_json::from_str(&body).map_err(|e| {
            PlatformError::UnexpectedResponse(format!("Response is not valid JSON: {}", e))
        })?;

        if let Some(error) = json
            .get_mut("errors")
            .and_then(Value::as_array_mut)
            .filter(|errors| !errors.is_empty())
            .map(|errors| errors.swap_remove(0))
        {
            return Err(PlatformError::from_graphql(error));
        }

        json.get_mut("data")
            .and_then(|data| data.get_mut(content_key))
            .map(Value::take)
            .ok_or_else(|| PlatformError::MissingData(content_key.to_string()))
    }

    /// Send a GraphQL request and deserialize `data[content_key]`.
    pub async fn query<T: DeserializeOwned>(
        &self,
        api: Api,
        request: &GraphQlRequest,
        content_key: &str,
    ) -> PlatformResult<T> {
        let value = self.query_value(api, request, content_key).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Like [`ApiClient::query`], but the result must be a single object.
    pub async fn query_object<T: DeserializeOwned>(
        &self,
        api: Api,
        request: &GraphQlRequest,
        content_key: &str,
    ) -> PlatformResult<T> {
        let value = self.query_value(api, request, content_key).await?;
        if value.is_array() {
            return Err(PlatformError::UnexpectedResponse(
                "Expected a single object but got a list".to_string(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }
}
