// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use querydeck_core::QueryError;
use serde::Serialize;
use thiserror::Error;

/// Structured JSON error response for API errors
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Job not running: {0}")]
    JobNotRunning(String),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::JobNotFound(id) => {
                // Unknown or evicted ids are a normal outcome of polling.
                tracing::debug!(job_id = %id, "Job not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_details("Job not found", format!("Job ID: {}", id)),
                )
            }
            ApiError::JobNotRunning(detail) => {
                tracing::debug!(message = %detail, "Job not running");
                (
                    StatusCode::CONFLICT,
                    ErrorResponse::with_details("Job not running", detail.clone()),
                )
            }
            ApiError::Query(query_err) => {
                let (status, error_msg) = match query_err {
                    QueryError::TimedOut { .. } => {
                        tracing::warn!(error = %query_err, "Query timed out");
                        (StatusCode::GATEWAY_TIMEOUT, "Query timed out")
                    }
                    QueryError::Cancelled => {
                        tracing::warn!("Query cancelled");
                        (StatusCode::BAD_GATEWAY, "Query cancelled")
                    }
                    QueryError::Backend(_)
                    | QueryError::Http(_)
                    | QueryError::InvalidResponse(_) => {
                        tracing::error!(error = %query_err, "Query execution failed");
                        (StatusCode::BAD_GATEWAY, "Query execution failed")
                    }
                };
                (
                    status,
                    ErrorResponse::with_details(error_msg, query_err.to_string()),
                )
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "Bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Bad request", msg.clone()),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(message = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
