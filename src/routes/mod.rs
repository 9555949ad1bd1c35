//! Route definitions.

mod llm;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::handlers::api::health_check;
use crate::state::AppState;

pub use llm::create_llm_router;

/// Assemble the full application router.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .merge(create_llm_router())
        .with_state(state)
}
