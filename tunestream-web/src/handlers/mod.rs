//! HTTP request handlers organized by functionality

pub mod api;
pub mod streaming;

// Re-export handler functions
pub use api::health;
pub use streaming::stream_resource;
