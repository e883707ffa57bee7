//! Byte-range streaming of media resources.
//!
//! [`RangeStreamHandler`] resolves a resource through the catalog, validates
//! the requested range, and hands back a [`StreamReply`] whose body pulls
//! bounded chunks from the backing store on demand.

pub mod handler;
pub mod range;
pub mod session;

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
pub use handler::{RangeStreamHandler, StreamReply};
pub use range::{ByteRange, RangeError, parse_range_header};
use serde_json::json;
pub use session::StreamSession;

use crate::media::{ResourceId, ResourceIdError};
use crate::storage::StoreError;

/// Outcome of the external authentication check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthVerdict {
    /// Caller presented an accepted credential
    Authorized,
    /// Caller presented no credential or a rejected one
    Unauthorized,
}

impl AuthVerdict {
    /// Returns true for [`AuthVerdict::Authorized`].
    pub fn is_authorized(self) -> bool {
        matches!(self, AuthVerdict::Authorized)
    }
}

/// Failures a stream request can resolve to before the body starts.
///
/// Failures after headers are sent travel through the body stream as
/// `std::io::Error` and abort the connection instead.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// No accepted credential accompanied the request
    #[error("Authentication required")]
    Unauthorized,

    /// The id in the request path is not a valid resource id
    #[error("Invalid resource id: {0}")]
    InvalidResourceId(#[from] ResourceIdError),

    /// The catalog has no entry for the id
    #[error("Resource {id} not found in catalog")]
    ResourceNotFound {
        /// The requested id
        id: ResourceId,
    },

    /// The catalog knows the id but the backing store has no bytes for it
    #[error("Bytes for resource {id} missing from storage")]
    BytesMissing {
        /// The requested id
        id: ResourceId,
    },

    /// The requested range lies outside the resource
    #[error("Range not satisfiable for resource {id} ({total_length} bytes)")]
    RangeNotSatisfiable {
        /// The requested id
        id: ResourceId,
        /// Length of the resource
        total_length: u64,
    },

    /// Opening the read cursor failed
    #[error("Storage error for resource {id}: {source}")]
    Store {
        /// The requested id
        id: ResourceId,
        /// The underlying store error
        #[source]
        source: StoreError,
    },
}

impl StreamError {
    /// HTTP status this failure resolves to.
    pub fn status(&self) -> StatusCode {
        match self {
            StreamError::Unauthorized => StatusCode::UNAUTHORIZED,
            StreamError::InvalidResourceId(_) => StatusCode::BAD_REQUEST,
            StreamError::ResourceNotFound { .. } | StreamError::BytesMissing { .. } => {
                StatusCode::NOT_FOUND
            }
            StreamError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            StreamError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short client-facing message for the JSON error body.
    pub fn user_message(&self) -> &'static str {
        match self {
            StreamError::Unauthorized => "Authentication required",
            StreamError::InvalidResourceId(_) => "Invalid resource id",
            StreamError::ResourceNotFound { .. } => "Resource not found",
            StreamError::BytesMissing { .. } => "Audio file missing from storage",
            StreamError::RangeNotSatisfiable { .. } => "Range not satisfiable",
            StreamError::Store { .. } => "Failed to stream audio",
        }
    }
}

impl IntoResponse for StreamError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (status, Json(json!({ "message": self.user_message() }))).into_response();

        if let StreamError::RangeNotSatisfiable { total_length, .. } = self {
            let value = HeaderValue::from_str(&format!("bytes */{total_length}"))
                .unwrap_or_else(|_| HeaderValue::from_static("bytes */0"));
            response.headers_mut().insert(header::CONTENT_RANGE, value);
        }

        response
    }
}
