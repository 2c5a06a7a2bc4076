#![allow(dead_code)]

use castlabs_api_client::auth::derive_signature;
use castlabs_api_client::ApiClient;
use castlabs_core::constants::SIGNATURE_HEADER;
use castlabs_core::{ApiUrls, Credentials, Environment, PlatformConfig};
use mockito::{Matcher, Mock, Request, ServerGuard};
use serde_json::{json, Value};

pub const ORGANIZATION_URN: &str = "urn:janus:organization:acme";
pub const USER_URN: &str = "urn:janus:user:42";
pub const ACCESS_TOKEN: &str = "access-123";
pub const SECRET_ACCESS_KEY: &str = "test-secret";

pub fn test_config(server_url: &str) -> PlatformConfig {
    test_config_with_secret(server_url, SECRET_ACCESS_KEY)
}

pub fn test_config_with_secret(server_url: &str, secret_access_key: &str) -> PlatformConfig {
    let credentials = Credentials::new(ORGANIZATION_URN, USER_URN, "AKID", secret_access_key);
    PlatformConfig::new(credentials, Environment::Staging).with_urls(ApiUrls {
        credential_exchange: format!("{}/auth", server_url),
        workflow: format!("{}/workflow", server_url),
        repository: format!("{}/repository", server_url),
    })
}

pub async fn mock_auth(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/auth")
        .match_header("content-type", "application/json")
        .match_request(signed_with_test_secret)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id_token": "id-123", "access_token": ACCESS_TOKEN }).to_string())
        .create_async()
        .await
}

/// True when the signature header is the signature of the exact request body
/// under the test keypair.
pub fn signed_with_test_secret(request: &Request) -> bool {
    let Ok(body) = request.body() else {
        return false;
    };
    let Ok(payload) = serde_json::from_slice::<Value>(body) else {
        return false;
    };
    let Some(date) = payload["timestamp"].as_str().and_then(|t| t.get(..10)) else {
        return false;
    };
    let expected = derive_signature(SECRET_ACCESS_KEY, USER_URN, date, body);
    request
        .header(SIGNATURE_HEADER)
        .iter()
        .any(|value| value.as_bytes() == expected.as_bytes())
}

pub async fn connect(server: &mut ServerGuard) -> ApiClient {
    mock_auth(server).await;
    ApiClient::connect(test_config(&server.url()))
        .await
        .expect("client should authenticate")
}

/// Mock a GraphQL operation on `path` answering `{"data": {content_key: value}}`.
pub async fn mock_graphql(
    server: &mut ServerGuard,
    path: &str,
    body_match: Value,
    content_key: &str,
    value: Value,
) -> Mock {
    mock_graphql_hits(server, path, body_match, content_key, value, 1).await
}

/// Like [`mock_graphql`], expecting exactly `hits` matching requests.
pub async fn mock_graphql_hits(
    server: &mut ServerGuard,
    path: &str,
    body_match: Value,
    content_key: &str,
    value: Value,
    hits: usize,
) -> Mock {
    server
        .mock("POST", path)
        .match_header("authorization", format!("Bearer {}", ACCESS_TOKEN).as_str())
        .match_header("x-castlabs-organization", ORGANIZATION_URN)
        .match_body(Matcher::PartialJson(body_match))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "data": { content_key: value } }).to_string())
        .expect(hits)
        .create_async()
        .await
}

pub fn roots() -> Value {
    json!([
        { "id": "s3://cp-bucket/orgs/acme/", "name": "master", "__typename": "Folder" },
        { "id": "s3://cp-archive/acme", "name": "archive", "__typename": "Folder" }
    ])
}

pub fn po_items(items: Value) -> Value {
    json!({ "pos": [{ "id": "po-1", "poitems": items }] })
}
