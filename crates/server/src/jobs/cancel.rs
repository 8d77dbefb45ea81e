// crates/server/src/jobs/cancel.rs
//! Cancellation coordination: stop a query locally and, best-effort, on the
//! backend.
//!
//! The SQL-comment marker convention lives entirely in this module so its
//! format can change without touching the state machine or the executor.

use querydeck_core::QueryExecutor;

use super::store::JobStore;
use super::types::{Job, JobStatus};

/// Marker embedded in submitted SQL so the backend can identify the
/// statement to kill.
pub fn job_marker(id: &str) -> String {
    format!("job:{id}")
}

/// Prefix `sql` with the cancellation marker comment for `id`.
pub fn tag_sql(sql: &str, id: &str) -> String {
    format!("/* {} */ {}", job_marker(id), sql)
}

/// Fire the job's cancel token so the in-flight backend call stops waiting.
pub fn abort_local(job: &Job) {
    job.cancel_token.cancel();
}

/// Ask the backend to kill the statement tagged with this job's marker.
///
/// Best-effort: a failed or rejected request is logged and swallowed — the
/// local cancellation has already released client-side resources, and the
/// backend's own statement timeout is the fallback. The job's terminal
/// status is never affected by the outcome here.
pub async fn request_remote_kill(
    executor: &dyn QueryExecutor,
    database_id: &str,
    job_id: &str,
) -> bool {
    let marker = job_marker(job_id);
    let sent = executor.request_cancel_on_backend(database_id, &marker).await;
    if sent {
        tracing::info!(job_id = %job_id, "remote kill requested");
    } else {
        tracing::warn!(job_id = %job_id, "remote kill could not be delivered");
    }
    sent
}

/// Outcome of an explicit cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The job moved to `cancelled`; carries whether a remote kill was sent.
    Cancelled { remote_cancel_sent: bool },
    /// No such job (never existed, or already evicted).
    NotFound,
    /// The job had already reached a terminal state; nothing was mutated.
    NotRunning { status: JobStatus },
}

/// Explicit cancel entry point.
///
/// `cancelled` always wins its race with the background executor: the
/// terminal write happens before the local abort, so a concurrent
/// `mark_running` or terminal write is refused by the store. If the
/// executor's own terminal write got there first, this reports
/// `NotRunning` instead of pretending to have cancelled anything.
pub async fn cancel_job(
    store: &JobStore,
    executor: &dyn QueryExecutor,
    id: &str,
) -> CancelOutcome {
    let Some(job) = store.get(id) else {
        return CancelOutcome::NotFound;
    };
    if job.status.is_terminal() {
        return CancelOutcome::NotRunning { status: job.status };
    }

    if !store.cancel(id, "cancelled by user") {
        // Lost the race with the executor's terminal transition.
        let status = store
            .get(id)
            .map(|j| j.status)
            .unwrap_or(JobStatus::Cancelled);
        return CancelOutcome::NotRunning { status };
    }

    abort_local(&job);
    crate::metrics::record_job_finished("cancelled", None);
    let remote_cancel_sent = request_remote_kill(executor, &job.database_id, &job.id).await;
    tracing::info!(job_id = %id, remote_cancel_sent, "job cancelled");
    CancelOutcome::Cancelled { remote_cancel_sent }
}
