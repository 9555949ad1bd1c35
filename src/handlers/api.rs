//! Plain HTTP endpoints.

use axum::Json;
use serde_json::{Value, json};

/// Health check endpoint.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "parley-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
