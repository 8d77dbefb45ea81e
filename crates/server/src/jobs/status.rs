// crates/server/src/jobs/status.rs
//! Read-only status reporting over the job store.

use querydeck_core::QueryResult;
use serde::Serialize;

use super::types::Job;

/// Suggested delay before the next status poll, growing with elapsed time.
/// Purely advisory; nothing server-side enforces it.
fn suggested_poll_secs(elapsed_secs: i64) -> u64 {
    match elapsed_secs {
        e if e < 10 => 3,
        e if e < 30 => 5,
        e if e < 60 => 10,
        _ => 30,
    }
}

/// Wire response for `GET /api/sql/status/{job_id}`.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: String,
    pub elapsed_seconds: i64,
    /// Present only while the job is still live.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_after_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<QueryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build the status view for one job snapshot.
pub fn describe(job: &Job, elapsed_seconds: i64) -> JobStatusResponse {
    let poll_after_secs =
        (!job.status.is_terminal()).then(|| suggested_poll_secs(elapsed_seconds));
    JobStatusResponse {
        job_id: job.id.clone(),
        status: job.status.as_str().to_string(),
        elapsed_seconds,
        poll_after_secs,
        row_count: job.row_count(),
        result: job.result.clone(),
        error: job.error.clone(),
    }
}
