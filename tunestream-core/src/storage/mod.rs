//! Storage layer for uploaded audio.
//!
//! Defines the injected backing store capability that owns raw bytes, and
//! the catalog collaborator that maps song ids to those bytes.

pub mod catalog;
pub mod file_library;
pub mod file_store;
pub mod memory_store;

use std::pin::Pin;

use async_trait::async_trait;
pub use catalog::{InMemoryCatalog, MediaCatalog};
pub use file_library::LibraryCatalog;
pub use file_store::FileStore;
pub use memory_store::MemoryStore;
use tokio::io::AsyncRead;

use crate::media::BackingRef;
use crate::streaming::ByteRange;

/// Read cursor over a single byte range of a backing store.
///
/// Dropping the reader releases whatever handle the store opened.
pub type RangeReader = Pin<Box<dyn AsyncRead + Send>>;

/// Access to the raw bytes behind media resources.
///
/// Implementations treat stored bytes as immutable once written; the stream
/// handler never mutates a store.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Checks whether bytes exist for the reference.
    async fn contains(&self, reference: &BackingRef) -> bool;

    /// Opens a read cursor positioned at `range.start` and limited to
    /// `range.length()` bytes.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` - If no bytes exist for the reference
    /// - `StoreError::LengthMismatch` - If fewer bytes exist than the range needs
    /// - `StoreError::Io` - If the underlying storage operation failed
    async fn open(&self, reference: &BackingRef, range: ByteRange)
    -> Result<RangeReader, StoreError>;

    /// Get the name/identifier for this store type
    fn store_type(&self) -> &'static str;
}

/// Errors that occur while accessing a backing store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No bytes are stored under the reference
    #[error("Backing bytes not found: {reference}")]
    NotFound {
        /// The missing reference
        reference: BackingRef,
    },

    /// The store holds fewer bytes than the requested range requires
    #[error("Stored length mismatch for {reference}: need {expected} bytes, have {actual}")]
    LengthMismatch {
        /// The reference being opened
        reference: BackingRef,
        /// Minimum number of bytes the range requires
        expected: u64,
        /// Number of bytes actually stored
        actual: u64,
    },

    /// The reference does not resolve inside the store
    #[error("Invalid backing reference: {reference}")]
    InvalidReference {
        /// The rejected reference
        reference: BackingRef,
    },

    /// Standard I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Checks that a store holding `actual` bytes can serve `range`.
///
/// # Errors
///
/// - `StoreError::LengthMismatch` - If `actual` is shorter than `range.end + 1`
pub fn ensure_length(
    reference: &BackingRef,
    range: ByteRange,
    actual: u64,
) -> Result<(), StoreError> {
    let expected = range.end() + 1;
    if actual < expected {
        return Err(StoreError::LengthMismatch {
            reference: reference.clone(),
            expected,
            actual,
        });
    }
    Ok(())
}
