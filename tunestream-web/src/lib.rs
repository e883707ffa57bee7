//! TuneStream Web - JSON API Server

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
//!
//! Serves uploaded audio over HTTP range requests behind a bearer token
//! check. Song metadata and accounts live in other services; this crate only
//! wires the streaming core into an axum router.

pub mod auth;
pub mod handlers;
pub mod server;

// Re-export main types
pub use auth::{AllowAllAuthorizer, Authorizer, StaticTokenAuthorizer, bearer_token};
pub use server::{AppState, ServerError, build_router, run_server};
