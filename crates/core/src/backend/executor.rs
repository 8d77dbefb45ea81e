// crates/core/src/backend/executor.rs
//! QueryExecutor trait defining the interface for query backends.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::types::QueryResult;
use crate::error::QueryError;

/// Trait for backends that can execute SQL against a named database.
///
/// Implementations include:
/// - [`RestQueryExecutor`](super::RestQueryExecutor) — calls the BI product's REST API
/// - scripted test doubles in the server crate's job tests
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute `sql` against `database_id`, bounded by `timeout` and `cancel`.
    ///
    /// The deadline lives inside this call: implementations must resolve with
    /// [`QueryError::Cancelled`] promptly once `cancel` fires, and with
    /// [`QueryError::TimedOut`] once `timeout` elapses, each distinct from
    /// any other failure. Exactly one of the four outcomes comes back.
    async fn execute_with_timeout(
        &self,
        database_id: &str,
        sql: &str,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<QueryResult, QueryError>;

    /// Ask the backend to terminate any in-flight statement tagged with
    /// `marker`.
    ///
    /// Best-effort: returns whether a cancel signal was sent, not whether
    /// the statement actually died.
    async fn request_cancel_on_backend(&self, database_id: &str, marker: &str) -> bool;

    /// Backend name for logging/display (e.g. "rest", "mock").
    fn name(&self) -> &str;
}
