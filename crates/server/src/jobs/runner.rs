// crates/server/src/jobs/runner.rs
//! Background executor: drives one submitted job to a terminal state.

use std::sync::Arc;
use std::time::Duration;

use querydeck_core::{QueryError, QueryExecutor};

use super::cancel;
use super::store::JobStore;
use super::types::JobId;

/// Spawn the detached task that executes `job_id`.
///
/// Fire-and-forget: the submit handler returns as soon as this is scheduled.
/// Every outcome of the backend call is absorbed into exactly one terminal
/// transition; nothing propagates out of the task.
pub fn spawn_query_job(
    store: Arc<JobStore>,
    executor: Arc<dyn QueryExecutor>,
    job_id: JobId,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move { run_query_job(store, executor, job_id).await })
}

async fn run_query_job(store: Arc<JobStore>, executor: Arc<dyn QueryExecutor>, job_id: JobId) {
    let Some(job) = store.get(&job_id) else {
        tracing::warn!(job_id = %job_id, "job vanished before execution");
        return;
    };

    if !store.mark_running(&job_id) {
        // Cancelled while still pending; the backend is never touched.
        tracing::debug!(job_id = %job_id, "job no longer pending, skipping execution");
        return;
    }

    let timeout = Duration::from_secs(job.timeout_secs);
    let started = std::time::Instant::now();
    let outcome = executor
        .execute_with_timeout(&job.database_id, &job.sql, timeout, job.cancel_token.clone())
        .await;
    let elapsed = started.elapsed();

    // One mutating transition per job: the store refuses the write if an
    // explicit cancel reached the terminal state first.
    match outcome {
        Ok(result) => {
            let rows = result.row_count;
            if store.complete(&job_id, result) {
                crate::metrics::record_job_finished("complete", Some(elapsed));
                tracing::info!(
                    job_id = %job_id,
                    rows,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "query complete"
                );
            }
        }
        Err(err @ QueryError::Cancelled) => {
            if store.cancel(&job_id, err.to_string()) {
                crate::metrics::record_job_finished("cancelled", Some(elapsed));
                tracing::info!(job_id = %job_id, "query cancelled in flight");
            }
        }
        Err(err @ QueryError::TimedOut { .. }) => {
            if store.time_out(&job_id, err.to_string()) {
                crate::metrics::record_job_finished("timeout", Some(elapsed));
                tracing::warn!(
                    job_id = %job_id,
                    timeout_secs = job.timeout_secs,
                    "query timed out, requesting remote kill"
                );
                cancel::request_remote_kill(executor.as_ref(), &job.database_id, &job_id).await;
            }
        }
        Err(err) => {
            if store.fail(&job_id, err.to_string()) {
                crate::metrics::record_job_finished("failed", Some(elapsed));
                tracing::error!(job_id = %job_id, error = %err, "query failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::JobStatus;
    use crate::jobs::cancel::cancel_job;
    use crate::testing::MockExecutor;
    use std::sync::atomic::Ordering;

    /// Poll until the job leaves the live states or the deadline passes.
    async fn wait_terminal(store: &JobStore, id: &str) -> JobStatus {
        for _ in 0..200 {
            if let Some(job) = store.get(id) {
                if job.status.is_terminal() {
                    return job.status;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {id} never reached a terminal state");
    }

    #[tokio::test]
    async fn test_fast_query_completes() {
        let store = Arc::new(JobStore::new());
        let executor: Arc<MockExecutor> = Arc::new(MockExecutor::instant_rows(3));
        let job = store.create("db-1", "SELECT * FROM sales", 60);

        spawn_query_job(store.clone(), executor.clone(), job.id.clone());
        assert_eq!(wait_terminal(&store, &job.id).await, JobStatus::Complete);

        let done = store.get(&job.id).unwrap();
        assert_eq!(done.row_count(), Some(3));
        assert!(done.error.is_none());
        assert!(done.started_at.is_some());
        assert!(done.completed_at.is_some());
        assert_eq!(executor.kills_requested.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_backend_error_fails_job_with_verbatim_message() {
        let store = Arc::new(JobStore::new());
        let executor: Arc<MockExecutor> =
            Arc::new(MockExecutor::failing("relation \"salez\" does not exist"));
        let job = store.create("db-1", "SELECT * FROM salez", 60);

        spawn_query_job(store.clone(), executor, job.id.clone());
        assert_eq!(wait_terminal(&store, &job.id).await, JobStatus::Failed);

        let failed = store.get(&job.id).unwrap();
        assert_eq!(
            failed.error.as_deref(),
            Some("relation \"salez\" does not exist")
        );
        assert!(failed.result.is_none());
    }

    #[tokio::test]
    async fn test_slow_query_times_out_with_one_remote_kill() {
        let store = Arc::new(JobStore::new());
        let executor: Arc<MockExecutor> = Arc::new(MockExecutor::slow(Duration::from_secs(5)));
        // 1-second ceiling against a 5-second query.
        let job = store.create("db-1", "SELECT pg_sleep(5)", 1);

        spawn_query_job(store.clone(), executor.clone(), job.id.clone());
        assert_eq!(wait_terminal(&store, &job.id).await, JobStatus::TimedOut);

        let timed_out = store.get(&job.id).unwrap();
        assert!(
            timed_out
                .error
                .as_deref()
                .unwrap()
                .contains("timed out after 1 seconds"),
            "unexpected error: {:?}",
            timed_out.error
        );
        assert_eq!(executor.kills_requested.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_timeout_times_out_immediately() {
        let store = Arc::new(JobStore::new());
        let executor: Arc<MockExecutor> = Arc::new(MockExecutor::slow(Duration::from_secs(5)));
        let job = store.create("db-1", "SELECT pg_sleep(5)", 0);

        spawn_query_job(store.clone(), executor, job.id.clone());
        assert_eq!(wait_terminal(&store, &job.id).await, JobStatus::TimedOut);
    }

    #[tokio::test]
    async fn test_cancel_before_executor_runs_sticks() {
        let store = Arc::new(JobStore::new());
        let executor: Arc<MockExecutor> = Arc::new(MockExecutor::instant_rows(1));
        let job = store.create("db-1", "SELECT 1", 60);

        // Cancel lands before the spawned task gets to mark_running.
        let outcome = cancel_job(&store, executor.as_ref(), &job.id).await;
        assert!(matches!(outcome, crate::jobs::CancelOutcome::Cancelled { .. }));

        spawn_query_job(store.clone(), executor.clone(), job.id.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;

        let cancelled = store.get(&job.id).unwrap();
        assert_eq!(cancelled.status, JobStatus::Cancelled);
        assert!(cancelled.started_at.is_none());
        // The backend call never happened.
        assert_eq!(executor.executed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_flight() {
        let store = Arc::new(JobStore::new());
        let executor: Arc<MockExecutor> = Arc::new(MockExecutor::slow(Duration::from_secs(5)));
        let job = store.create("db-1", "SELECT pg_sleep(5)", 60);

        spawn_query_job(store.clone(), executor.clone(), job.id.clone());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.get(&job.id).unwrap().status, JobStatus::Running);

        let outcome = cancel_job(&store, executor.as_ref(), &job.id).await;
        assert!(matches!(outcome, crate::jobs::CancelOutcome::Cancelled { .. }));

        // The in-flight call observes the token and unwinds; status stays
        // cancelled, not failed.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let cancelled = store.get(&job.id).unwrap();
        assert_eq!(cancelled.status, JobStatus::Cancelled);
        assert!(cancelled.completed_at.is_some());
        assert_eq!(executor.kills_requested.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_jobs_are_isolated() {
        let store = Arc::new(JobStore::new());
        let ok: Arc<MockExecutor> = Arc::new(MockExecutor::instant_rows(2));
        let bad: Arc<MockExecutor> = Arc::new(MockExecutor::failing("boom"));

        let a = store.create("db-1", "SELECT 1", 60);
        let b = store.create("db-2", "SELECT 2", 60);
        assert_ne!(a.id, b.id);

        spawn_query_job(store.clone(), ok, a.id.clone());
        spawn_query_job(store.clone(), bad, b.id.clone());

        assert_eq!(wait_terminal(&store, &a.id).await, JobStatus::Complete);
        assert_eq!(wait_terminal(&store, &b.id).await, JobStatus::Failed);

        // Progress on one never leaked into the other.
        assert_eq!(store.get(&a.id).unwrap().row_count(), Some(2));
        assert!(store.get(&b.id).unwrap().result.is_none());
    }

    #[tokio::test]
    async fn test_vanished_job_is_a_no_op() {
        let store = Arc::new(JobStore::new());
        let executor: Arc<MockExecutor> = Arc::new(MockExecutor::instant_rows(1));

        let handle = spawn_query_job(store.clone(), executor.clone(), "gone".to_string());
        handle.await.unwrap();
        assert_eq!(executor.executed.load(Ordering::SeqCst), 0);
    }
}
