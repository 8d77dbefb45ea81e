// crates/server/src/testing.rs
//! Scripted backend double shared across the server's test modules.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use querydeck_core::{QueryError, QueryExecutor, QueryResult};
use tokio_util::sync::CancellationToken;

/// What the mock backend does once its delay has passed.
pub enum MockOutcome {
    Rows(usize),
    Error(String),
}

/// Test [`QueryExecutor`]: waits `delay`, then yields the configured
/// outcome, honoring the same timeout/cancel contract as the real client.
pub struct MockExecutor {
    pub delay: Duration,
    pub outcome: MockOutcome,
    /// Calls that actually reached `execute_with_timeout`.
    pub executed: AtomicUsize,
    /// Remote-kill requests received.
    pub kills_requested: AtomicUsize,
    kill_response: bool,
}

impl MockExecutor {
    pub fn instant_rows(rows: usize) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: MockOutcome::Rows(rows),
            executed: AtomicUsize::new(0),
            kills_requested: AtomicUsize::new(0),
            kill_response: true,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::instant_rows(1)
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: MockOutcome::Error(message.into()),
            ..Self::instant_rows(0)
        }
    }

    pub fn with_kill_response(mut self, sent: bool) -> Self {
        self.kill_response = sent;
        self
    }
}

/// Fixed-shape result payload for assertions.
pub fn rows_result(rows: usize) -> QueryResult {
    let data = (0..rows)
        .map(|i| vec![serde_json::json!(i), serde_json::json!(format!("row-{i}"))])
        .collect::<Vec<_>>();
    QueryResult::new(vec!["id".to_string(), "value".to_string()], data)
}

#[async_trait]
impl QueryExecutor for MockExecutor {
    async fn execute_with_timeout(
        &self,
        _database_id: &str,
        _sql: &str,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<QueryResult, QueryError> {
        self.executed.fetch_add(1, Ordering::SeqCst);
        tokio::select! {
            _ = cancel.cancelled() => Err(QueryError::Cancelled),
            finished = tokio::time::timeout(timeout, tokio::time::sleep(self.delay)) => {
                match finished {
                    Ok(()) => match &self.outcome {
                        MockOutcome::Rows(n) => Ok(rows_result(*n)),
                        MockOutcome::Error(msg) => Err(QueryError::Backend(msg.clone())),
                    },
                    Err(_) => Err(QueryError::TimedOut {
                        timeout_secs: timeout.as_secs(),
                    }),
                }
            }
        }
    }

    async fn request_cancel_on_backend(&self, _database_id: &str, _marker: &str) -> bool {
        self.kills_requested.fetch_add(1, Ordering::SeqCst);
        self.kill_response
    }

    fn name(&self) -> &str {
        "mock"
    }
}
