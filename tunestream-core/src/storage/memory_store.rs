//! In-memory backing store for tests and demos.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{BackingStore, RangeReader, StoreError, ensure_length};
use crate::media::BackingRef;
use crate::streaming::ByteRange;

/// Backing store holding whole resources as shared `Bytes`.
///
/// Opening a range slices the stored buffer without copying.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: Arc<RwLock<HashMap<BackingRef, Bytes>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores bytes under a reference, replacing any previous value.
    pub async fn insert(&self, reference: BackingRef, data: impl Into<Bytes>) {
        self.blobs.write().await.insert(reference, data.into());
    }

    /// Removes bytes for a reference, returning whether they existed.
    pub async fn remove(&self, reference: &BackingRef) -> bool {
        self.blobs.write().await.remove(reference).is_some()
    }
}

#[async_trait]
impl BackingStore for MemoryStore {
    async fn contains(&self, reference: &BackingRef) -> bool {
        self.blobs.read().await.contains_key(reference)
    }

    async fn open(
        &self,
        reference: &BackingRef,
        range: ByteRange,
    ) -> Result<RangeReader, StoreError> {
        let blobs = self.blobs.read().await;
        let data = blobs.get(reference).ok_or_else(|| StoreError::NotFound {
            reference: reference.clone(),
        })?;

        ensure_length(reference, range, data.len() as u64)?;

        let start = range.start() as usize;
        let end = range.end() as usize + 1;
        Ok(Box::pin(Cursor::new(data.slice(start..end))))
    }

    fn store_type(&self) -> &'static str {
        "memory_store"
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    #[tokio::test]
    async fn test_open_slices_stored_bytes() {
        let store = MemoryStore::new();
        let reference = BackingRef::new("song");
        store
            .insert(reference.clone(), (0..100u8).collect::<Vec<_>>())
            .await;

        let mut reader = store
            .open(&reference, ByteRange::new(10, 19).unwrap())
            .await
            .unwrap();
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await.unwrap();

        assert_eq!(buffer, (10..20u8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_contains_and_remove() {
        let store = MemoryStore::new();
        let reference = BackingRef::new("song");
        assert!(!store.contains(&reference).await);

        store.insert(reference.clone(), Bytes::from_static(b"abc")).await;
        assert!(store.contains(&reference).await);

        assert!(store.remove(&reference).await);
        assert!(!store.contains(&reference).await);
        assert!(!store.remove(&reference).await);
    }

    #[tokio::test]
    async fn test_open_errors() {
        let store = MemoryStore::new();
        let reference = BackingRef::new("song");

        let result = store.open(&reference, ByteRange::new(0, 0).unwrap()).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));

        store.insert(reference.clone(), Bytes::from_static(b"abc")).await;
        let result = store.open(&reference, ByteRange::new(0, 3).unwrap()).await;
        assert!(matches!(
            result,
            Err(StoreError::LengthMismatch {
                expected: 4,
                actual: 3,
                ..
            })
        ));
    }
}
