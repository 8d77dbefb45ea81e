// crates/server/src/lib.rs
//! Querydeck server library.
//!
//! Axum-based HTTP server fronting the asynchronous query job subsystem:
//! submit a SQL job against a named backend database, poll its status,
//! cancel it mid-flight.

pub mod error;
pub mod jobs;
pub mod metrics;
pub mod routes;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use error::*;
pub use metrics::init_metrics;
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes (health, sql submit/status/cancel/execute, metrics)
/// - CORS for development (allows any origin)
/// - Request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Integration Tests
// ============================================================================
