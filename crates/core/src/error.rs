// crates/core/src/error.rs
use thiserror::Error;

/// Errors surfaced by a query-execution backend.
///
/// `Cancelled` and `TimedOut` are contractually distinguishable from every
/// other failure: the job executor branches on them to pick the job's
/// terminal state.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The in-flight call observed its cancellation token.
    #[error("query cancelled")]
    Cancelled,

    /// The deadline elapsed before the backend answered.
    #[error("query timed out after {timeout_secs} seconds")]
    TimedOut { timeout_secs: u64 },

    /// The backend executed the request and reported a failure (SQL error,
    /// unknown database, permission denial). Message passed through verbatim.
    #[error("{0}")]
    Backend(String),

    /// Transport-level failure talking to the backend.
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a payload we could not interpret.
    #[error("unexpected backend response: {0}")]
    InvalidResponse(String),
}

impl QueryError {
    /// Whether this error came from the cancel token rather than the backend.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether this error is the deadline expiring.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_includes_seconds() {
        let err = QueryError::TimedOut { timeout_secs: 1 };
        assert_eq!(err.to_string(), "query timed out after 1 seconds");

        let err = QueryError::TimedOut { timeout_secs: 300 };
        assert_eq!(err.to_string(), "query timed out after 300 seconds");
    }

    #[test]
    fn test_backend_message_passes_through_verbatim() {
        let err = QueryError::Backend("syntax error at or near \"FORM\"".to_string());
        assert_eq!(err.to_string(), "syntax error at or near \"FORM\"");
    }

    #[test]
    fn test_error_classification() {
        assert!(QueryError::Cancelled.is_cancelled());
        assert!(!QueryError::Cancelled.is_timeout());
        assert!(QueryError::TimedOut { timeout_secs: 5 }.is_timeout());
        assert!(!QueryError::Backend("boom".into()).is_cancelled());
        assert!(!QueryError::Backend("boom".into()).is_timeout());
    }
}
