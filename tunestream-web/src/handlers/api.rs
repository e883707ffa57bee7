//! Service status endpoints

use axum::response::Json;
use serde_json::{Value, json};

/// Liveness probe; requires no credential.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
