mod common;

use castlabs_api_client::{ApiClient, GraphQlRequest, SessionTokens};
use castlabs_core::{Api, PlatformError};
use common::{test_config, ACCESS_TOKEN, ORGANIZATION_URN};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};

fn client(server: &ServerGuard) -> ApiClient {
    let tokens = SessionTokens {
        id_token: "id-123".to_string(),
        access_token: ACCESS_TOKEN.to_string(),
    };
    ApiClient::with_tokens(test_config(&server.url()), tokens).unwrap()
}

fn request() -> GraphQlRequest {
    GraphQlRequest::new("GetThing", "query GetThing { thing }", json!({ "id": "t1" }))
}

async fn respond(server: &mut ServerGuard, path: &str, status: usize, body: Value) -> Mock {
    server
        .mock("POST", path)
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

#[tokio::test]
async fn test_query_sends_auth_headers_and_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/workflow")
        .match_header("authorization", "Bearer access-123")
        .match_header("x-castlabs-organization", ORGANIZATION_URN)
        .match_body(Matcher::Json(json!({
            "operationName": "GetThing",
            "variables": { "id": "t1" },
            "query": "query GetThing { thing }"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":{"thing":{"name":"widget"}}}"#)
        .create_async()
        .await;

    let thing: Value = client(&server)
        .query(Api::Workflow, &request(), "thing")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(thing, json!({ "name": "widget" }));
}

#[tokio::test]
async fn test_query_routes_by_api() {
    let mut server = Server::new_async().await;
    let mock = respond(&mut server, "/repository", 200, json!({ "data": { "roots": [] } })).await;

    let roots: Vec<Value> = client(&server)
        .query(Api::Repository, &request(), "roots")
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(roots.is_empty());
}

#[tokio::test]
async fn test_malformed_request_error() {
    let mut server = Server::new_async().await;
    respond(
        &mut server,
        "/workflow",
        200,
        json!({ "errors": [{ "errorType": "MalformedHttpRequestException", "message": "Malformed request" }] }),
    )
    .await;

    let err = client(&server)
        .query::<Value>(Api::Workflow, &request(), "thing")
        .await
        .unwrap_err();

    assert!(matches!(err, PlatformError::MalformedRequest { .. }));
    assert_eq!(err.to_string(), "Malformed request");
}

#[tokio::test]
async fn test_unauthorized_error_keeps_raw_error() {
    let mut server = Server::new_async().await;
    respond(
        &mut server,
        "/workflow",
        200,
        json!({ "errors": [
            { "errorType": "Unauthorized", "message": "Not allowed", "path": ["thing"] },
            { "errorType": "Other", "message": "ignored" }
        ] }),
    )
    .await;

    let err = client(&server)
        .query::<Value>(Api::Workflow, &request(), "thing")
        .await
        .unwrap_err();

    assert!(matches!(err, PlatformError::Authorization { .. }));
    assert_eq!(
        err.graphql_data().and_then(|data| data.get("path")),
        Some(&json!(["thing"]))
    );
}

#[tokio::test]
async fn test_generic_graphql_error_message() {
    let mut server = Server::new_async().await;
    respond(
        &mut server,
        "/workflow",
        200,
        json!({ "errors": [{ "errorType": "UnknownError", "message": "An unknown error occurred" }] }),
    )
    .await;

    let err = client(&server)
        .query::<Value>(Api::Workflow, &request(), "thing")
        .await
        .unwrap_err();

    assert!(matches!(err, PlatformError::GraphQl { .. }));
    assert_eq!(err.to_string(), "An unknown error occurred");
}

#[tokio::test]
async fn test_empty_errors_list_is_success() {
    let mut server = Server::new_async().await;
    respond(
        &mut server,
        "/workflow",
        200,
        json!({ "errors": [], "data": { "thing": 7 } }),
    )
    .await;

    let thing: u32 = client(&server)
        .query(Api::Workflow, &request(), "thing")
        .await
        .unwrap();
    assert_eq!(thing, 7);
}

#[tokio::test]
async fn test_missing_content_key() {
    let mut server = Server::new_async().await;
    respond(&mut server, "/workflow", 200, json!({ "data": { "other": 1 } })).await;

    let err = client(&server)
        .query::<Value>(Api::Workflow, &request(), "thing")
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::MissingData(ref key) if key == "thing"));
}

#[tokio::test]
async fn test_query_object_rejects_list() {
    let mut server = Server::new_async().await;
    respond(
        &mut server,
        "/workflow",
        200,
        json!({ "data": { "thing": [{ "name": "a" }, { "name": "b" }] } }),
    )
    .await;

    let err = client(&server)
        .query_object::<Value>(Api::Workflow, &request(), "thing")
        .await
        .unwrap_err();

    assert!(matches!(err, PlatformError::UnexpectedResponse(_)));
    assert!(err.to_string().contains("Expected a single object but got a list"));
}

#[tokio::test]
async fn test_http_failure_status() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/workflow")
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let err = client(&server)
        .query::<Value>(Api::Workflow, &request(), "thing")
        .await
        .unwrap_err();

    assert!(matches!(err, PlatformError::Http { status: 502, .. }));
}

#[tokio::test]
async fn test_non_json_response() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/workflow")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let err = client(&server)
        .query::<Value>(Api::Workflow, &request(), "thing")
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::UnexpectedResponse(_)));
}
