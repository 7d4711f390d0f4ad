//! Liveness endpoint

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

/// GET /health - answers while the process is serving
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
