//! Conversational WebSocket route.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::handlers::llm::llm_websocket_handler;
use crate::state::AppState;

/// Router for the per-call WebSocket endpoint.
///
/// The path parameter is the platform's call identifier; one connection
/// serves one call.
pub fn create_llm_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/llm-websocket/{call_id}", get(llm_websocket_handler))
        .layer(TraceLayer::new_for_http())
}
