//! Range request handler for audio streaming.
//!
//! Implements single-range RFC 7233 semantics: full content (200) without a
//! Range header or with a malformed one, partial content (206) for a valid
//! range, and 416 for a range outside the resource.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::{debug, info, warn};

use super::range::{ByteRange, RangeError, parse_range_header};
use super::session::StreamSession;
use super::{AuthVerdict, StreamError};
use crate::config::StorageConfig;
use crate::media::{MediaResource, ResourceId};
use crate::storage::{BackingStore, MediaCatalog, StoreError};

/// Resolves stream requests against a catalog and a backing store.
///
/// The handler is stateless across requests; every call gets its own
/// [`StreamSession`], opened only after the range has been validated.
#[derive(Clone)]
pub struct RangeStreamHandler {
    catalog: Arc<dyn MediaCatalog>,
    store: Arc<dyn BackingStore>,
    chunk_size: usize,
}

impl RangeStreamHandler {
    /// Creates a handler reading at most `chunk_size` bytes per body chunk.
    pub fn new(
        catalog: Arc<dyn MediaCatalog>,
        store: Arc<dyn BackingStore>,
        chunk_size: usize,
    ) -> Self {
        Self {
            catalog,
            store,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Creates a handler using the configured chunk size.
    pub fn from_config(
        catalog: Arc<dyn MediaCatalog>,
        store: Arc<dyn BackingStore>,
        config: &StorageConfig,
    ) -> Self {
        Self::new(catalog, store, config.chunk_size)
    }

    /// Catalog used to resolve resource ids.
    pub fn catalog(&self) -> &Arc<dyn MediaCatalog> {
        &self.catalog
    }

    /// Handle one stream request.
    ///
    /// `range_header` is the raw `Range` header value, if any. A malformed
    /// header falls back to the full resource.
    ///
    /// # Errors
    /// - `StreamError::Unauthorized` - The verdict is negative
    /// - `StreamError::InvalidResourceId` - `resource_id` is not a valid id
    /// - `StreamError::ResourceNotFound` - The catalog has no such resource
    /// - `StreamError::BytesMissing` - The catalog entry has no stored bytes
    /// - `StreamError::RangeNotSatisfiable` - The range lies outside the resource
    /// - `StreamError::Store` - The read cursor could not be opened
    pub async fn handle(
        &self,
        resource_id: &str,
        range_header: Option<&str>,
        verdict: AuthVerdict,
    ) -> Result<StreamReply, StreamError> {
        if !verdict.is_authorized() {
            debug!("Rejecting stream request for {resource_id:?}: not authenticated");
            return Err(StreamError::Unauthorized);
        }

        let id = ResourceId::new(resource_id)?;

        let Some(resource) = self.catalog.lookup_resource(&id).await else {
            info!("Stream request for unknown resource {}", id);
            return Err(StreamError::ResourceNotFound { id });
        };

        if !self.store.contains(&resource.backing).await {
            warn!(
                "Resource {} is cataloged but {} is missing from {}",
                id,
                resource.backing,
                self.store.store_type()
            );
            return Err(StreamError::BytesMissing { id });
        }

        let total_length = resource.total_length;
        let requested = match range_header {
            None => None,
            Some(header) => match parse_range_header(header, total_length) {
                Ok(range) => Some(range),
                Err(RangeError::Malformed { reason }) => {
                    debug!(
                        "Ignoring Range header {:?} for {}: {}; serving full content",
                        header, id, reason
                    );
                    None
                }
                Err(RangeError::Unsatisfiable { start, .. }) => {
                    info!(
                        "Range starting at {} not satisfiable for {} ({} bytes)",
                        start, id, total_length
                    );
                    return Err(StreamError::RangeNotSatisfiable { id, total_length });
                }
            },
        };

        let (status, range) = match requested {
            Some(range) => (StatusCode::PARTIAL_CONTENT, Some(range)),
            None => (StatusCode::OK, ByteRange::full(total_length)),
        };

        let session = match range {
            Some(range) => Some(self.open_session(&resource, range).await?),
            None => None,
        };

        debug!(
            "Streaming {} ({}): status={}, range={:?}",
            id, resource.backing, status, range
        );

        Ok(StreamReply {
            status,
            resource,
            range,
            session,
        })
    }

    async fn open_session(
        &self,
        resource: &MediaResource,
        range: ByteRange,
    ) -> Result<StreamSession, StreamError> {
        match self.store.open(&resource.backing, range).await {
            Ok(reader) => Ok(StreamSession::new(
                resource.id.clone(),
                range,
                reader,
                self.chunk_size,
            )),
            Err(StoreError::NotFound { .. }) => {
                warn!(
                    "Bytes for {} vanished before the read cursor opened",
                    resource.id
                );
                Err(StreamError::BytesMissing {
                    id: resource.id.clone(),
                })
            }
            Err(source) => {
                warn!("Failed to open {}: {}", resource.backing, source);
                Err(StreamError::Store {
                    id: resource.id.clone(),
                    source,
                })
            }
        }
    }
}

/// Successful stream outcome, ready to become an HTTP response.
#[derive(Debug)]
pub struct StreamReply {
    status: StatusCode,
    resource: MediaResource,
    range: Option<ByteRange>,
    session: Option<StreamSession>,
}

impl StreamReply {
    /// Either `200 OK` or `206 Partial Content`.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The resource being streamed.
    pub fn resource(&self) -> &MediaResource {
        &self.resource
    }

    /// Bytes covered by the body; `None` for an empty resource.
    pub fn range(&self) -> Option<ByteRange> {
        self.range
    }

    /// Value of the `Content-Length` header.
    pub fn content_length(&self) -> u64 {
        self.range.map(|range| range.length()).unwrap_or(0)
    }

    /// Value of the `Content-Range` header, present only for partial content.
    pub fn content_range(&self) -> Option<String> {
        if self.status != StatusCode::PARTIAL_CONTENT {
            return None;
        }
        self.range
            .map(|range| range.content_range(self.resource.total_length))
    }
}

impl IntoResponse for StreamReply {
    fn into_response(self) -> Response {
        let mut response = Response::builder()
            .status(self.status)
            .header(header::CONTENT_TYPE, self.resource.content_type)
            .header(header::CONTENT_LENGTH, self.content_length().to_string())
            .header(header::ACCEPT_RANGES, "bytes");

        if let Some(content_range) = self.content_range() {
            response = response.header(header::CONTENT_RANGE, content_range);
        }

        let body = match self.session {
            Some(session) => Body::from_stream(session.into_stream()),
            None => Body::empty(),
        };

        response
            .body(body)
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::media::BackingRef;
    use crate::storage::{InMemoryCatalog, MemoryStore};

    fn test_data() -> Vec<u8> {
        (0..1000u32).map(|i| (i * 7 % 256) as u8).collect()
    }

    async fn create_test_handler() -> (RangeStreamHandler, InMemoryCatalog, MemoryStore) {
        let catalog = InMemoryCatalog::new();
        let store = MemoryStore::new();

        let song = ResourceId::new("song").unwrap();
        catalog
            .insert(MediaResource::new(song, BackingRef::new("song.mp3"), 1000))
            .await;
        store
            .insert(BackingRef::new("song.mp3"), Bytes::from(test_data()))
            .await;

        let handler = RangeStreamHandler::new(
            Arc::new(catalog.clone()),
            Arc::new(store.clone()),
            64,
        );
        (handler, catalog, store)
    }

    async fn body_bytes(reply: StreamReply) -> Bytes {
        axum::body::to_bytes(reply.into_response().into_body(), usize::MAX)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_full_content_without_range() {
        let (handler, _, _) = create_test_handler().await;
        let reply = handler
            .handle("song", None, AuthVerdict::Authorized)
            .await
            .unwrap();

        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.content_length(), 1000);
        assert_eq!(reply.content_range(), None);

        let response = reply.into_response();
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "audio/mpeg");
        assert_eq!(response.headers().get(header::CONTENT_LENGTH).unwrap(), "1000");
        assert!(response.headers().get(header::CONTENT_RANGE).is_none());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body.as_ref(), test_data().as_slice());
    }

    #[tokio::test]
    async fn test_partial_content() {
        let (handler, _, _) = create_test_handler().await;
        let reply = handler
            .handle("song", Some("bytes=200-299"), AuthVerdict::Authorized)
            .await
            .unwrap();

        assert_eq!(reply.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(reply.content_length(), 100);
        assert_eq!(reply.content_range().as_deref(), Some("bytes 200-299/1000"));
        assert_eq!(body_bytes(reply).await.as_ref(), &test_data()[200..300]);
    }

    #[tokio::test]
    async fn test_open_ended_range() {
        let (handler, _, _) = create_test_handler().await;
        let reply = handler
            .handle("song", Some("bytes=900-"), AuthVerdict::Authorized)
            .await
            .unwrap();

        assert_eq!(reply.content_range().as_deref(), Some("bytes 900-999/1000"));
        assert_eq!(reply.content_length(), 100);
        assert_eq!(body_bytes(reply).await.as_ref(), &test_data()[900..]);
    }

    #[tokio::test]
    async fn test_malformed_range_falls_back_to_full_content() {
        let (handler, _, _) = create_test_handler().await;
        let reply = handler
            .handle("song", Some("bytes=abc-def"), AuthVerdict::Authorized)
            .await
            .unwrap();

        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(body_bytes(reply).await.len(), 1000);
    }

    #[tokio::test]
    async fn test_unsatisfiable_range() {
        let (handler, _, _) = create_test_handler().await;
        let result = handler
            .handle("song", Some("bytes=1000-"), AuthVerdict::Authorized)
            .await;

        assert!(matches!(
            result,
            Err(StreamError::RangeNotSatisfiable {
                total_length: 1000,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_checked_first() {
        let (handler, _, _) = create_test_handler().await;
        let result = handler
            .handle("does-not-exist", None, AuthVerdict::Unauthorized)
            .await;
        assert!(matches!(result, Err(StreamError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_not_found_and_bytes_missing() {
        let (handler, catalog, store) = create_test_handler().await;

        let result = handler.handle("ghost", None, AuthVerdict::Authorized).await;
        assert!(matches!(result, Err(StreamError::ResourceNotFound { .. })));

        store.remove(&BackingRef::new("song.mp3")).await;
        let result = handler.handle("song", None, AuthVerdict::Authorized).await;
        assert!(matches!(result, Err(StreamError::BytesMissing { .. })));

        catalog.remove(&ResourceId::new("song").unwrap()).await;
        let result = handler.handle("song", None, AuthVerdict::Authorized).await;
        assert!(matches!(result, Err(StreamError::ResourceNotFound { .. })));
    }

    #[tokio::test]
    async fn test_invalid_id() {
        let (handler, _, _) = create_test_handler().await;
        let result = handler.handle("..", None, AuthVerdict::Authorized).await;
        assert!(matches!(result, Err(StreamError::InvalidResourceId(_))));
    }

    #[tokio::test]
    async fn test_catalog_length_longer_than_store_fails_before_headers() {
        let (handler, catalog, _) = create_test_handler().await;
        let liar = ResourceId::new("liar").unwrap();
        catalog
            .insert(MediaResource::new(liar, BackingRef::new("song.mp3"), 5000))
            .await;

        let result = handler.handle("liar", None, AuthVerdict::Authorized).await;
        match result {
            Err(err @ StreamError::Store { .. }) => {
                assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
            }
            other => panic!("expected store error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_resource() {
        let (handler, catalog, store) = create_test_handler().await;
        catalog
            .insert(MediaResource::new(
                ResourceId::new("silence").unwrap(),
                BackingRef::new("silence.mp3"),
                0,
            ))
            .await;
        store
            .insert(BackingRef::new("silence.mp3"), Bytes::new())
            .await;

        let reply = handler
            .handle("silence", None, AuthVerdict::Authorized)
            .await
            .unwrap();
        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.content_length(), 0);
        assert!(body_bytes(reply).await.is_empty());

        let result = handler
            .handle("silence", Some("bytes=0-"), AuthVerdict::Authorized)
            .await;
        assert!(matches!(
            result,
            Err(StreamError::RangeNotSatisfiable { .. })
        ));
    }

    #[tokio::test]
    async fn test_repeated_requests_are_identical() {
        let (handler, _, _) = create_test_handler().await;
        let mut bodies = Vec::new();
        for _ in 0..3 {
            let reply = handler
                .handle("song", Some("bytes=10-640"), AuthVerdict::Authorized)
                .await
                .unwrap();
            bodies.push(body_bytes(reply).await);
        }
        assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
    }
}
