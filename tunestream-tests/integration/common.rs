//! Shared fixtures for router-level tests

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, header};
use tower::ServiceExt;
use tunestream_core::{
    BackingRef, InMemoryCatalog, MediaResource, MemoryStore, RangeStreamHandler, ResourceId,
};
use tunestream_web::{AppState, StaticTokenAuthorizer, build_router};

pub const TOKEN: &str = "integration-token";

/// Deterministic audio-like payload so byte offsets are checkable.
pub fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// In-memory library that the router tests can extend.
pub struct Fixture {
    pub catalog: Arc<InMemoryCatalog>,
    pub store: Arc<MemoryStore>,
    chunk_size: usize,
}

impl Fixture {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            catalog: Arc::new(InMemoryCatalog::new()),
            store: Arc::new(MemoryStore::new()),
            chunk_size,
        }
    }

    /// Register a resource whose bytes are present in the store.
    pub async fn add(&self, id: &str, data: Vec<u8>) {
        self.add_metadata_only(id, data.len() as u64).await;
        self.store
            .insert(BackingRef::new(format!("{id}.mp3")), data)
            .await;
    }

    /// Register a catalog entry without stored bytes.
    pub async fn add_metadata_only(&self, id: &str, total_length: u64) {
        let resource = MediaResource::new(
            ResourceId::new(id).unwrap(),
            BackingRef::new(format!("{id}.mp3")),
            total_length,
        );
        self.catalog.insert(resource).await;
    }

    pub fn router(&self) -> Router {
        let handler =
            RangeStreamHandler::new(self.catalog.clone(), self.store.clone(), self.chunk_size);
        build_router(AppState::new(
            handler,
            Arc::new(StaticTokenAuthorizer::new([TOKEN])),
        ))
    }
}

/// Authenticated stream request, optionally with a Range header.
pub fn stream_request(id: &str, range: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(format!("/resources/{id}/stream"))
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
    if let Some(range) = range {
        builder = builder.header(header::RANGE, range);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(router: Router, request: Request<Body>) -> Response<Body> {
    router.oneshot(request).await.unwrap()
}

pub fn header_str<'a>(response: &'a Response<Body>, name: header::HeaderName) -> Option<&'a str> {
    response
        .headers()
        .get(name)
        .map(|value| value.to_str().unwrap())
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
