mod common;

use std::sync::Arc;
use std::time::Duration;

use castlabs_api_client::Repository;
use castlabs_core::{ErrorMetadata, PlatformError, StorageLocation};
use castlabs_storage::LocalUploadTarget;
use common::{connect, mock_graphql, roots};
use mockito::Server;
use serde_json::json;

fn master() -> StorageLocation {
    StorageLocation::parse("master", "s3://cp-bucket/orgs/acme/").unwrap()
}

#[tokio::test]
async fn test_storage_locations() {
    let mut server = Server::new_async().await;
    let client = connect(&mut server).await;
    mock_graphql(
        &mut server,
        "/repository",
        json!({ "operationName": "GetRootsurn_janus_organization" }),
        "roots",
        roots(),
    )
    .await;

    let locations = Repository::new(client).storage_locations().await.unwrap();

    assert_eq!(locations.len(), 2);
    assert_eq!(locations[0], master());
    assert_eq!(locations[1].bucket, "cp-archive");
    assert_eq!(locations[1].path, "acme");
}

#[tokio::test]
async fn test_storage_location_selection() {
    let mut server = Server::new_async().await;
    let client = connect(&mut server).await;
    mock_graphql(
        &mut server,
        "/repository",
        json!({ "operationName": "GetRootsurn_janus_organization" }),
        "roots",
        roots(),
    )
    .await;
    let repository = Repository::new(client);

    let first = repository.storage_location(None).await.unwrap();
    assert_eq!(first.name, "master");

    let archive = repository.storage_location(Some("archive")).await.unwrap();
    assert_eq!(archive.bucket, "cp-archive");

    let err = repository.storage_location(Some("missing")).await.unwrap_err();
    assert!(matches!(err, PlatformError::StorageLocationNotFound(_)));
    assert_eq!(err.to_string(), "Storage location with name missing not found");
}

#[tokio::test]
async fn test_directory_contents_lists_folders_then_files() {
    let mut server = Server::new_async().await;
    let client = connect(&mut server).await;
    let mock = mock_graphql(
        &mut server,
        "/repository",
        json!({
            "operationName": "filefolderlistwitharchive",
            "variables": { "id": "s3://cp-bucket/orgs/acme/movie_mp4/", "show_deleted": false }
        }),
        "folder",
        json!({
            "id": "s3://cp-bucket/orgs/acme/movie_mp4/",
            "name": "movie_mp4",
            "folders": [{ "id": "s3://cp-bucket/orgs/acme/movie_mp4/subs/", "name": "subs" }],
            "files": [{
                "id": "s3://cp-bucket/orgs/acme/movie_mp4/movie.mp4",
                "name": "movie.mp4",
                "size": 2048.0,
                "last_modified": "2024-05-17T10:00:00Z",
                "deleted": false,
                "archived": false,
                "archive": null
            }]
        }),
    )
    .await;

    let entries = Repository::new(client)
        .directory_contents(&master(), "movie_mp4", false)
        .await
        .unwrap();

    mock.assert_async().await;
    let names: Vec<&str> = entries.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["subs", "movie.mp4"]);
    assert!(entries[0].is_folder());
}

#[tokio::test]
async fn test_create_upload_ticket() {
    let mut server = Server::new_async().await;
    let client = connect(&mut server).await;
    mock_graphql(
        &mut server,
        "/repository",
        json!({
            "operationName": "create_upload_ticket",
            "variables": { "folder_id": "s3://cp-bucket/orgs/acme/movie_mp4/", "message": "Drop files here" }
        }),
        "createUploadTicket",
        json!({
            "directory": "orgs/acme/movie_mp4/",
            "token": "tok123",
            "url": "https://uploader.example.com/#/tok123"
        }),
    )
    .await;

    let ticket = Repository::new(client)
        .create_upload_ticket("s3://cp-bucket/orgs/acme/movie_mp4/", "Drop files here")
        .await
        .unwrap();

    assert_eq!(ticket.url, "https://uploader.example.com/#/tok123");
    assert_eq!(ticket.token.as_deref(), Some("tok123"));
}

#[tokio::test]
async fn test_upload_client_presigned_post() {
    let mut server = Server::new_async().await;
    let client = connect(&mut server).await;
    let upload_url = format!("{}/#/tok123", server.url());
    mock_graphql(
        &mut server,
        "/repository",
        json!({ "operationName": "create_upload_ticket" }),
        "createUploadTicket",
        json!({ "directory": null, "token": "tok123", "url": upload_url.clone() }),
    )
    .await;
    let uploader = server
        .mock("GET", "/api_v1/upload/tok123")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "AccessKeyId": "ASIAEXAMPLE",
                "SecretAccessKey": "secret",
                "SessionToken": "session-token"
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let upload_client = Repository::new(client)
        .create_upload_client(&master(), "movie_mp4", "")
        .await
        .unwrap();
    assert_eq!(upload_client.upload_url(), upload_url);
    assert_eq!(upload_client.prefix(), "orgs/acme/movie_mp4/");

    let form = upload_client
        .presigned_post(Duration::from_secs(3600))
        .await
        .unwrap();
    upload_client
        .presigned_post(Duration::from_secs(60))
        .await
        .unwrap();

    uploader.assert_async().await;
    assert_eq!(form.url, "https://cp-bucket.s3.amazonaws.com/");
    assert_eq!(form.fields["key"], "orgs/acme/movie_mp4/${filename}");
    assert_eq!(form.fields["x-amz-server-side-encryption"], "AES256");
    assert_eq!(form.fields["x-amz-security-token"], "session-token");
    assert!(form.fields["x-amz-credential"].starts_with("ASIAEXAMPLE/"));
    assert!(form.fields["x-amz-credential"].ends_with("/us-east-1/s3/aws4_request"));
}

#[tokio::test]
async fn test_upload_client_uploader_failure() {
    let mut server = Server::new_async().await;
    let client = connect(&mut server).await;
    let upload_url = format!("{}/#/expired", server.url());
    mock_graphql(
        &mut server,
        "/repository",
        json!({ "operationName": "create_upload_ticket" }),
        "createUploadTicket",
        json!({ "url": upload_url }),
    )
    .await;
    server
        .mock("GET", "/api_v1/upload/expired")
        .with_status(403)
        .with_body("ticket expired")
        .create_async()
        .await;

    let upload_client = Repository::new(client)
        .create_upload_client(&master(), "movie_mp4", "")
        .await
        .unwrap();
    let err = upload_client
        .presigned_post(Duration::from_secs(3600))
        .await
        .unwrap_err();

    assert!(matches!(err, PlatformError::Http { status: 403, .. }));
}

#[tokio::test]
async fn test_upload_client_rejects_malformed_credentials() {
    let mut server = Server::new_async().await;
    let client = connect(&mut server).await;
    let upload_url = format!("{}/#/tok123", server.url());
    mock_graphql(
        &mut server,
        "/repository",
        json!({ "operationName": "create_upload_ticket" }),
        "createUploadTicket",
        json!({ "url": upload_url }),
    )
    .await;
    server
        .mock("GET", "/api_v1/upload/tok123")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let upload_client = Repository::new(client)
        .create_upload_client(&master(), "movie_mp4", "")
        .await
        .unwrap();
    let err = upload_client
        .presigned_post(Duration::from_secs(3600))
        .await
        .unwrap_err();

    assert!(matches!(err, PlatformError::UnexpectedResponse(_)));
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn test_upload_client_writes_to_target() {
    let mut server = Server::new_async().await;
    let client = connect(&mut server).await;
    mock_graphql(
        &mut server,
        "/repository",
        json!({ "operationName": "create_upload_ticket" }),
        "createUploadTicket",
        json!({ "url": "https://uploader.example.com/#/tok123" }),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("movie.mp4");
    std::fs::write(&source, b"not really a movie").unwrap();
    let bucket_dir = dir.path().join("bucket");
    let target = LocalUploadTarget::new(&bucket_dir, "cp-bucket".to_string())
        .await
        .unwrap();

    let upload_client = Repository::new(client)
        .create_upload_client(&master(), "movie_mp4", "")
        .await
        .unwrap()
        .with_upload_target(Arc::new(target));
    let object = upload_client.upload_file(&source).await.unwrap();

    assert_eq!(object.key, "orgs/acme/movie_mp4/movie.mp4");
    assert_eq!(object.size_bytes, 18);
    assert!(bucket_dir.join("orgs/acme/movie_mp4/movie.mp4").exists());
}
