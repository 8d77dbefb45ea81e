// crates/server/src/routes/queries.rs
//! SQL query API routes.
//!
//! - POST /sql/submit          — Submit an asynchronous query job
//! - GET  /sql/status/{job_id} — Poll a job's status
//! - POST /sql/cancel/{job_id} — Cancel a pending/running job
//! - POST /sql/execute         — Synchronous execution (no job record)

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, ApiResult};
use crate::jobs::store::MAX_TIMEOUT_SECS;
use crate::jobs::{self, CancelOutcome, JobStatusResponse};
use crate::state::AppState;

/// Timeout applied when the caller does not supply one (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Request body for POST /api/sql/submit and POST /api/sql/execute.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlRequest {
    pub database_id: String,
    pub sql: String,
    /// Seconds; clamped to the administrative maximum. Negative values are
    /// rejected at deserialization.
    pub timeout_seconds: Option<u64>,
}

impl SqlRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.database_id.trim().is_empty() {
            return Err(ApiError::BadRequest("databaseId must not be empty".into()));
        }
        if self.sql.trim().is_empty() {
            return Err(ApiError::BadRequest("sql must not be empty".into()));
        }
        Ok(())
    }

    fn timeout_secs(&self) -> u64 {
        self.timeout_seconds
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .min(MAX_TIMEOUT_SECS)
    }
}

/// Response for POST /api/sql/submit (202 Accepted).
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub job_id: String,
    pub timeout_seconds: u64,
    pub status: String,
}

/// Response for POST /api/sql/cancel/{job_id}.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub job_id: String,
    pub status: String,
    pub remote_cancel_sent: bool,
}

/// Response for POST /api/sql/execute.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
}

/// POST /api/sql/submit — create a job and start it detached.
///
/// Returns as soon as the executor task is scheduled, before it runs.
async fn submit_query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SqlRequest>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    req.validate()?;

    let job = state.jobs.create(&req.database_id, &req.sql, req.timeout_secs());
    crate::metrics::record_job_submitted();
    tracing::info!(
        job_id = %job.id,
        database_id = %req.database_id,
        timeout_secs = job.timeout_secs,
        "query job submitted"
    );

    jobs::spawn_query_job(state.jobs.clone(), state.executor.clone(), job.id.clone());

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            job_id: job.id,
            timeout_seconds: job.timeout_secs,
            status: "pending".to_string(),
        }),
    ))
}

/// GET /api/sql/status/{job_id} — snapshot of one job.
///
/// Finished jobs stay pollable until the registry evicts them.
async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job = state
        .jobs
        .get(&job_id)
        .ok_or_else(|| ApiError::JobNotFound(job_id.clone()))?;
    let elapsed = state.jobs.elapsed_seconds(&job_id);
    Ok(Json(jobs::describe(&job, elapsed)))
}

/// POST /api/sql/cancel/{job_id} — cancel a pending or running job.
async fn cancel_query(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<CancelResponse>> {
    match jobs::cancel_job(&state.jobs, state.executor.as_ref(), &job_id).await {
        CancelOutcome::Cancelled { remote_cancel_sent } => Ok(Json(CancelResponse {
            job_id,
            status: "cancelled".to_string(),
            remote_cancel_sent,
        })),
        CancelOutcome::NotFound => Err(ApiError::JobNotFound(job_id)),
        CancelOutcome::NotRunning { status } => Err(ApiError::JobNotRunning(format!(
            "job {} is not running (status: {})",
            job_id,
            status.as_str()
        ))),
    }
}

/// POST /api/sql/execute — the synchronous sibling of submit.
///
/// Blocks the request on the backend call; no job record is created, so
/// there is nothing to poll or cancel. Same timeout clamp as submit.
async fn execute_query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SqlRequest>,
) -> ApiResult<Json<ExecuteResponse>> {
    req.validate()?;

    let timeout = Duration::from_secs(req.timeout_secs());
    let result = state
        .executor
        .execute_with_timeout(&req.database_id, &req.sql, timeout, CancellationToken::new())
        .await?;

    Ok(Json(ExecuteResponse {
        columns: result.columns,
        row_count: result.row_count,
        rows: result.rows,
    }))
}

/// Build the SQL routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sql/submit", post(submit_query))
        .route("/sql/status/{job_id}", get(job_status))
        .route("/sql/cancel/{job_id}", post(cancel_query))
        .route("/sql/execute", post(execute_query))
}
