// crates/server/src/jobs/store.rs
//! In-memory registry of query jobs.
//!
//! Sole owner of every [`Job`] record. All mutation goes through the
//! transition methods below, which enforce the forward-only state machine:
//! `pending -> running -> {complete | failed | timeout | cancelled}`, with
//! `pending -> cancelled` allowed directly. Terminal states absorb any later
//! write, which is what makes an explicit cancel always win its race with
//! the background executor.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use querydeck_core::QueryResult;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::cancel;
use super::types::{Job, JobId, JobStatus};

/// Administrative ceiling on a caller-supplied timeout (30 minutes).
pub const MAX_TIMEOUT_SECS: u64 = 1800;

/// Terminal jobs older than this are dropped by [`JobStore::evict`].
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

/// How often the background eviction task runs.
pub const DEFAULT_EVICTION_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Thread-safe store of every live and recently-finished job.
///
/// Readers get snapshot clones; the lock is never held across an await.
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
    retention: Duration,
}

impl JobStore {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    /// Create a store that evicts terminal jobs older than `retention`.
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            retention,
        }
    }

    /// Create a job record in `pending` and return a snapshot of it.
    ///
    /// Generates a fresh id, clamps the timeout to `[0, MAX_TIMEOUT_SECS]`,
    /// tags the SQL with the cancellation marker, and allocates the job's
    /// cancel token.
    pub fn create(&self, database_id: impl Into<String>, sql: &str, timeout_secs: u64) -> Job {
        let id = Uuid::new_v4().to_string();
        let job = Job {
            id: id.clone(),
            database_id: database_id.into(),
            sql: cancel::tag_sql(sql, &id),
            status: JobStatus::Pending,
            submitted_at: Utc::now(),
            started_at: None,
            completed_at: None,
            timeout_secs: timeout_secs.min(MAX_TIMEOUT_SECS),
            result: None,
            error: None,
            cancel_token: CancellationToken::new(),
        };
        match self.jobs.write() {
            Ok(mut jobs) => {
                jobs.insert(id, job.clone());
            }
            Err(e) => tracing::error!("RwLock poisoned inserting job: {e}"),
        }
        job
    }

    /// Snapshot of a job. `None` for unknown or evicted ids is a normal,
    /// expected outcome.
    pub fn get(&self, id: &str) -> Option<Job> {
        match self.jobs.read() {
            Ok(jobs) => jobs.get(id).cloned(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading job: {e}");
                None
            }
        }
    }

    /// `pending -> running`, stamping `started_at`.
    ///
    /// Returns false without writing if the job is unknown or no longer
    /// pending — in particular when a cancel landed first.
    pub fn mark_running(&self, id: &str) -> bool {
        match self.jobs.write() {
            Ok(mut jobs) => match jobs.get_mut(id) {
                Some(job) if job.status == JobStatus::Pending => {
                    job.status = JobStatus::Running;
                    job.started_at = Some(Utc::now());
                    true
                }
                _ => false,
            },
            Err(e) => {
                tracing::error!("RwLock poisoned marking job running: {e}");
                false
            }
        }
    }

    /// Single choke point for terminal writes: refuses to touch a record
    /// that already reached a terminal state.
    fn finish(
        &self,
        id: &str,
        status: JobStatus,
        result: Option<QueryResult>,
        error: Option<String>,
    ) -> bool {
        debug_assert!(status.is_terminal());
        match self.jobs.write() {
            Ok(mut jobs) => match jobs.get_mut(id) {
                Some(job) if !job.status.is_terminal() => {
                    job.status = status;
                    job.completed_at = Some(Utc::now());
                    job.result = result;
                    job.error = error;
                    true
                }
                _ => false,
            },
            Err(e) => {
                tracing::error!("RwLock poisoned finishing job: {e}");
                false
            }
        }
    }

    /// `running -> complete` with the success payload.
    pub fn complete(&self, id: &str, result: QueryResult) -> bool {
        self.finish(id, JobStatus::Complete, Some(result), None)
    }

    /// `running -> failed` with the backend's message verbatim.
    pub fn fail(&self, id: &str, error: impl Into<String>) -> bool {
        self.finish(id, JobStatus::Failed, None, Some(error.into()))
    }

    /// `running -> timeout`.
    pub fn time_out(&self, id: &str, error: impl Into<String>) -> bool {
        self.finish(id, JobStatus::TimedOut, None, Some(error.into()))
    }

    /// `pending|running -> cancelled`.
    pub fn cancel(&self, id: &str, error: impl Into<String>) -> bool {
        self.finish(id, JobStatus::Cancelled, None, Some(error.into()))
    }

    /// Whole seconds from `started_at` (or `submitted_at` while pending) to
    /// `completed_at` (or now while live). 0 for unknown ids. Frozen once
    /// the job is terminal.
    pub fn elapsed_seconds(&self, id: &str) -> i64 {
        match self.get(id) {
            Some(job) => {
                let start = job.started_at.unwrap_or(job.submitted_at);
                let end = job.completed_at.unwrap_or_else(Utc::now);
                (end - start).num_seconds().max(0)
            }
            None => 0,
        }
    }

    /// Drop every record that is terminal AND older than the retention
    /// window. Pending and running jobs are never evicted, regardless of
    /// age. Returns the number of records removed.
    pub fn evict(&self) -> usize {
        let cutoff = Utc::now() - chrono::Duration::seconds(self.retention.as_secs() as i64);
        match self.jobs.write() {
            Ok(mut jobs) => {
                let before = jobs.len();
                jobs.retain(|_, job| !(job.status.is_terminal() && job.submitted_at < cutoff));
                let removed = before - jobs.len();
                if removed > 0 {
                    tracing::debug!(removed, "evicted finished jobs");
                }
                removed
            }
            Err(e) => {
                tracing::error!("RwLock poisoned during eviction: {e}");
                0
            }
        }
    }

    /// Number of records currently tracked (all states).
    pub fn len(&self) -> usize {
        match self.jobs.read() {
            Ok(jobs) => jobs.len(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading job count: {e}");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run [`evict`](Self::evict) every `interval` until `shutdown` fires.
    pub fn spawn_eviction_task(
        self: &Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; skip it so a fresh store
            // is not scanned at startup.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        store.evict();
                    }
                    _ = shutdown.cancelled() => {
                        tracing::debug!("eviction task stopping");
                        break;
                    }
                }
            }
        })
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}
