// crates/server/src/jobs/types.rs
//! Types for the asynchronous query job subsystem.

use chrono::{DateTime, Utc};
use querydeck_core::QueryResult;
use tokio_util::sync::CancellationToken;

/// Unique identifier for a submitted query job (uuid v4, never reused).
pub type JobId = String;

/// Lifecycle status of a query job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Complete,
    Failed,
    TimedOut,
    Cancelled,
}

impl JobStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Complete | Self::Failed | Self::TimedOut | Self::Cancelled
        )
    }

    /// Wire string used in API responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::TimedOut => "timeout",
            Self::Cancelled => "cancelled",
        }
    }
}

/// One tracked query job.
///
/// Records are owned by the [`JobStore`](super::JobStore); everything handed
/// out is a clone, so holding one never blocks the registry. The
/// `cancel_token` clone shares state with the stored one — cancelling any
/// clone cancels them all.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub database_id: String,
    /// Query text as sent to the backend, including the cancellation marker
    /// comment prepended at submission.
    pub sql: String,
    pub status: JobStatus,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Caller-supplied ceiling, clamped to the administrative maximum at
    /// creation.
    pub timeout_secs: u64,
    /// Success payload; mutually exclusive with `error`, write-once.
    pub result: Option<QueryResult>,
    /// Failure reason; set only on `failed`, `timeout`, `cancelled`.
    pub error: Option<String>,
    /// Created atomically with the record, never replaced. Single-use.
    pub cancel_token: CancellationToken,
}

impl Job {
    /// Row count of the result, when one is present.
    pub fn row_count(&self) -> Option<usize> {
        self.result.as_ref().map(|r| r.row_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_classification() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Complete.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::TimedOut.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_wire_strings() {
        assert_eq!(JobStatus::Pending.as_str(), "pending");
        assert_eq!(JobStatus::Running.as_str(), "running");
        assert_eq!(JobStatus::Complete.as_str(), "complete");
        assert_eq!(JobStatus::Failed.as_str(), "failed");
        assert_eq!(JobStatus::TimedOut.as_str(), "timeout");
        assert_eq!(JobStatus::Cancelled.as_str(), "cancelled");
    }
}
