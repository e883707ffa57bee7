//! Integration tests for TuneStream
//!
//! These tests drive the assembled axum router the way a browser audio
//! element does: authenticated GETs with and without Range headers.

#[path = "integration/common.rs"]
mod common;

#[path = "integration/range_streaming.rs"]
mod range_streaming;

#[path = "integration/auth_and_errors.rs"]
mod auth_and_errors;

#[path = "integration/library_streaming.rs"]
mod library_streaming;
