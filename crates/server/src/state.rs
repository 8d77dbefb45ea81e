// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use querydeck_core::QueryExecutor;

use crate::jobs::JobStore;

/// Shared application state accessible from all route handlers.
///
/// Constructed exactly once at startup and passed by `Arc` — there is no
/// module-level singleton; the registry's lifetime is the state's lifetime.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Registry of submitted query jobs.
    pub jobs: Arc<JobStore>,
    /// Query-execution backend the job subsystem drives.
    pub executor: Arc<dyn QueryExecutor>,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Arc<Self> {
        Self::with_jobs(executor, Arc::new(JobStore::new()))
    }

    /// Create with an externally-constructed job store (custom retention,
    /// tests that pre-seed jobs).
    pub fn with_jobs(executor: Arc<dyn QueryExecutor>, jobs: Arc<JobStore>) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            jobs,
            executor,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
