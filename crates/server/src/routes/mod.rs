// crates/server/src/routes/mod.rs
//! API route handlers for the querydeck server.

pub mod health;
pub mod metrics;
pub mod queries;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router.
///
/// Routes:
/// - GET  /api/health — Health check
/// - POST /api/sql/submit — Submit an asynchronous query job
/// - GET  /api/sql/status/{job_id} — Poll a job's status
/// - POST /api/sql/cancel/{job_id} — Cancel a pending/running job
/// - POST /api/sql/execute — Synchronous query execution
/// - GET  /metrics — Prometheus metrics (no /api prefix)
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", queries::router())
        .merge(metrics::router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockExecutor;

    #[tokio::test]
    async fn test_api_routes_creation() {
        let state = AppState::new(Arc::new(MockExecutor::instant_rows(0)));
        let _router = api_routes(state);
    }
}
