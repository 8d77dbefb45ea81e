// crates/server/src/jobs/mod.rs
//! Asynchronous query job subsystem.
//!
//! Provides:
//! - `JobStore` — registry of job records with time-based eviction
//! - `spawn_query_job` — background executor driving one job to a terminal state
//! - `cancel_job` — explicit cancellation (local abort + best-effort remote kill)
//! - `describe` — status snapshots with an advisory poll backoff

pub mod cancel;
pub mod runner;
pub mod status;
pub mod store;
pub mod types;

pub use cancel::{cancel_job, CancelOutcome};
pub use runner::spawn_query_job;
pub use status::{describe, JobStatusResponse};
pub use store::JobStore;
pub use types::{Job, JobId, JobStatus};
