//! TuneStream Core - Byte-range audio streaming
//!
//! This crate provides the building blocks for serving uploaded audio over
//! HTTP range requests: media identifiers, the backing store capability, the
//! song catalog collaborator, range parsing, and the request-scoped stream
//! handler that ties them together.

pub mod config;
pub mod media;
pub mod storage;
pub mod streaming;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::{ConfigError, TuneStreamConfig};
pub use media::{AUDIO_MPEG, BackingRef, MediaResource, ResourceId, ResourceIdError};
pub use storage::{
    BackingStore, FileStore, InMemoryCatalog, LibraryCatalog, MediaCatalog, MemoryStore,
    StoreError,
};
pub use streaming::{
    AuthVerdict, ByteRange, RangeError, RangeStreamHandler, StreamError, StreamReply,
    StreamSession,
};
