use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use drive_core::DriveClient;

#[tokio::test]
async fn list_files_includes_bearer_header_and_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("fields", "nextPageToken, files/*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                {
                    "id": "f1",
                    "name": "client.exe",
                    "mimeType": "application/octet-stream",
                    "size": "2048",
                    "md5Checksum": "0123456789abcdef0123456789abcdef",
                    "modifiedTime": "2024-05-01T12:00:00.000Z",
                    "parents": ["root-id"]
                }
            ]
        })))
        .mount(&server)
        .await;

    let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
    let page = client.list_files(None).await.unwrap();

    assert_eq!(page.files.len(), 1);
    assert_eq!(page.files[0].name, "client.exe");
    assert_eq!(page.files[0].size, 2048);
    assert_eq!(page.files[0].parents, vec!["root-id".to_string()]);
    assert!(page.next_page_token.is_none());
}

#[tokio::test]
async fn list_all_files_follows_page_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                { "id": "f2", "name": "b.bin", "mimeType": "application/octet-stream" }
            ]
        })))
        .mount(&server)
        .await;

    // No pageToken query on the first request.
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nextPageToken": "page-2",
            "files": [
                { "id": "f1", "name": "a.bin", "mimeType": "application/octet-stream" }
            ]
        })))
        .mount(&server)
        .await;

    let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
    let files = client.list_all_files().await.unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].id, "f1");
    assert_eq!(files[1].id, "f2");
}

#[tokio::test]
async fn list_files_surfaces_api_error_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(403).set_body_string("rate limit"))
        .mount(&server)
        .await;

    let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
    let err = client.list_files(None).await.expect_err("expected 403");

    match err {
        drive_core::DriveError::Api { status, body } => {
            assert_eq!(status.as_u16(), 403);
            assert_eq!(body, "rate limit");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn download_file_streams_media_content() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/f1"))
        .and(query_param("alt", "media"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"payload"))
        .mount(&server)
        .await;

    let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
    let response = client.download_file("f1").await.unwrap();

    assert_eq!(response.bytes().await.unwrap().as_ref(), b"payload");
}

#[tokio::test]
async fn download_file_rejects_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
    let err = client
        .download_file("missing")
        .await
        .expect_err("expected 404");

    assert!(matches!(err, drive_core::DriveError::Api { .. }));
}
