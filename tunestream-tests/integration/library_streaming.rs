//! Streaming from a library directory on disk

use std::sync::Arc;

use axum::Router;
use axum::http::{StatusCode, header};
use tempfile::TempDir;
use tunestream_core::{FileStore, LibraryCatalog, MediaCatalog, RangeStreamHandler, ResourceId};
use tunestream_web::{AppState, StaticTokenAuthorizer, build_router};

use crate::common::*;

async fn library_router(dir: &TempDir) -> Router {
    let catalog = LibraryCatalog::open(dir.path()).await.unwrap();
    let store = FileStore::new(dir.path());
    let handler = RangeStreamHandler::new(Arc::new(catalog), Arc::new(store), 4096);
    build_router(AppState::new(
        handler,
        Arc::new(StaticTokenAuthorizer::new([TOKEN])),
    ))
}

#[tokio::test]
async fn test_streams_nested_file_from_disk() {
    let dir = TempDir::new().unwrap();
    let data = sample_bytes(20_000);
    std::fs::create_dir_all(dir.path().join("albums/first")).unwrap();
    std::fs::write(dir.path().join("albums/first/track01.mp3"), &data).unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"not audio").unwrap();

    let router = library_router(&dir).await;

    let full = send(router.clone(), stream_request("track01", None)).await;
    assert_eq!(full.status(), StatusCode::OK);
    assert_eq!(header_str(&full, header::CONTENT_LENGTH), Some("20000"));
    assert_eq!(body_bytes(full).await, data);

    let partial = send(router.clone(), stream_request("track01", Some("bytes=10000-14095"))).await;
    assert_eq!(partial.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&partial, header::CONTENT_RANGE),
        Some("bytes 10000-14095/20000")
    );
    assert_eq!(body_bytes(partial).await, &data[10_000..14_096]);

    let other = send(router, stream_request("notes", None)).await;
    assert_eq!(other.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_file_deleted_after_scan_reports_missing_bytes() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("gone.mp3"), sample_bytes(256)).unwrap();

    let router = library_router(&dir).await;
    std::fs::remove_file(dir.path().join("gone.mp3")).unwrap();

    let response = send(router, stream_request("gone", Some("bytes=0-99"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "message": "Audio file missing from storage" })
    );
}

#[tokio::test]
async fn test_rescan_picks_up_new_uploads() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("first.mp3"), sample_bytes(10)).unwrap();

    let catalog = LibraryCatalog::open(dir.path()).await.unwrap();
    assert_eq!(catalog.list_resources().await.len(), 1);

    std::fs::write(dir.path().join("second.MP3"), sample_bytes(20)).unwrap();
    assert_eq!(catalog.scan().await.unwrap(), 2);

    let second = catalog
        .lookup_resource(&ResourceId::new("second").unwrap())
        .await
        .unwrap();
    assert_eq!(second.total_length, 20);
}
