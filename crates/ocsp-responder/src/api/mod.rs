//! HTTP surface of the responder

pub mod error;
pub mod handlers;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use ocsp_core::Serial;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::storage::StorageError;
pub use handlers::AppState;

pub const HEALTHY: &str = "OCSP Responder is healthy";
pub const UNHEALTHY: &str = "OCSP Responder is not healthy";

/// Liveness probe
///
/// GET /health
///
/// Looks up serial 0 as a connectivity check. A miss or a hit is healthy;
/// any other store error is not.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.store.lookup(&Serial::from(0)).await {
        Ok(_) | Err(StorageError::NotFound(_)) => (StatusCode::OK, HEALTHY),
        Err(e) => {
            error!(error = %e, "Health probe failed");
            (StatusCode::INTERNAL_SERVER_ERROR, UNHEALTHY)
        }
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/",
            get(handlers::ocsp_get_root).post(handlers::ocsp_post),
        )
        .route(
            "/{*request}",
            get(handlers::ocsp_get).post(handlers::ocsp_post),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
