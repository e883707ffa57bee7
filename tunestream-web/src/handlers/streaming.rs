//! Audio streaming endpoint

use axum::extract::{Path, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::server::AppState;

/// `GET /resources/{id}/stream`
///
/// Runs the authorizer, then delegates range handling to the core stream
/// handler. A `Range` header that is not valid UTF-8 is ignored like any
/// other malformed range.
pub async fn stream_resource(
    State(state): State<AppState>,
    Path(resource_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let verdict = state.authorizer.authorize(&headers).await;
    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok());

    debug!("Stream request for {resource_id:?}: range={range:?}, verdict={verdict:?}");

    match state
        .stream_handler
        .handle(&resource_id, range, verdict)
        .await
    {
        Ok(reply) => reply.into_response(),
        Err(e) => e.into_response(),
    }
}
