//! Authentication and failure statuses

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;

use crate::common::*;

#[tokio::test]
async fn test_missing_credential_is_rejected() {
    let fixture = Fixture::new(64);
    fixture.add("song", sample_bytes(100)).await;

    let request = Request::get("/resources/song/stream")
        .body(Body::empty())
        .unwrap();
    let response = send(fixture.router(), request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Authentication required" })
    );
}

#[tokio::test]
async fn test_wrong_token_is_rejected_before_lookup() {
    let fixture = Fixture::new(64);

    let request = Request::get("/resources/does-not-exist/stream")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .header(header::RANGE, "bytes=0-10")
        .body(Body::empty())
        .unwrap();
    let response = send(fixture.router(), request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_resource_is_not_found() {
    let fixture = Fixture::new(64);

    let response = send(fixture.router(), stream_request("ghost", None)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Resource not found" })
    );
}

#[tokio::test]
async fn test_missing_bytes_is_distinct_not_found() {
    let fixture = Fixture::new(64);
    fixture.add_metadata_only("orphan", 4096).await;

    let response = send(fixture.router(), stream_request("orphan", Some("bytes=0-10"))).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Audio file missing from storage" })
    );
}

#[tokio::test]
async fn test_invalid_resource_id() {
    let fixture = Fixture::new(64);

    let response = send(fixture.router(), stream_request("..", None)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Invalid resource id" })
    );
}

#[tokio::test]
async fn test_catalog_longer_than_stored_bytes_fails() {
    let fixture = Fixture::new(64);
    fixture.add_metadata_only("short", 500).await;
    fixture
        .store
        .insert(tunestream_core::BackingRef::new("short.mp3"), sample_bytes(100))
        .await;

    let response = send(fixture.router(), stream_request("short", None)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Failed to stream audio" })
    );
}

#[tokio::test]
async fn test_health_is_public() {
    let fixture = Fixture::new(64);

    let request = Request::get("/health").body(Body::empty()).unwrap();
    let response = send(fixture.router(), request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}
