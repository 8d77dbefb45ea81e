// crates/core/src/backend/rest.rs
//! REST implementation of [`QueryExecutor`].
//!
//! Wraps the BI product's query API: `POST /api/v1/query` to execute and
//! `POST /api/v1/query/cancel` to request a server-side kill by marker.
//! The per-call deadline and cancel token are raced against the HTTP call
//! here, so callers get exactly one of success / `Cancelled` / `TimedOut` /
//! backend failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::config::BackendConfig;
use super::executor::QueryExecutor;
use super::types::QueryResult;
use crate::error::QueryError;

/// Wire request for the backend's execute endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteBody<'a> {
    database_id: &'a str,
    sql: &'a str,
}

/// Wire request for the backend's cancel endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CancelBody<'a> {
    database_id: &'a str,
    marker: &'a str,
}

/// Successful execute response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteReply {
    columns: Vec<String>,
    rows: Vec<Vec<serde_json::Value>>,
}

/// Error body the backend returns on non-2xx.
#[derive(Debug, Deserialize)]
struct ErrorReply {
    message: String,
}

/// Production [`QueryExecutor`] over the BI backend's REST API.
pub struct RestQueryExecutor {
    client: Client,
    config: BackendConfig,
}

impl RestQueryExecutor {
    pub fn new(config: BackendConfig) -> Result<Self, QueryError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// One round trip to the execute endpoint, no deadline of its own.
    async fn post_execute(&self, database_id: &str, sql: &str) -> Result<QueryResult, QueryError> {
        let req = self
            .client
            .post(self.endpoint("/api/v1/query"))
            .json(&ExecuteBody { database_id, sql });
        let resp = self.authorized(req).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ErrorReply>()
                .await
                .map(|e| e.message)
                .unwrap_or_else(|_| format!("backend returned {status}"));
            return Err(QueryError::Backend(message));
        }

        let reply: ExecuteReply = resp
            .json()
            .await
            .map_err(|e| QueryError::InvalidResponse(e.to_string()))?;
        Ok(QueryResult::new(reply.columns, reply.rows))
    }
}

#[async_trait]
impl QueryExecutor for RestQueryExecutor {
    async fn execute_with_timeout(
        &self,
        database_id: &str,
        sql: &str,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<QueryResult, QueryError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(QueryError::Cancelled),
            outcome = tokio::time::timeout(timeout, self.post_execute(database_id, sql)) => {
                match outcome {
                    Ok(result) => result,
                    Err(_) => Err(QueryError::TimedOut {
                        timeout_secs: timeout.as_secs(),
                    }),
                }
            }
        }
    }

    async fn request_cancel_on_backend(&self, database_id: &str, marker: &str) -> bool {
        let req = self
            .client
            .post(self.endpoint("/api/v1/query/cancel"))
            .json(&CancelBody {
                database_id,
                marker,
            });
        match self.authorized(req).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                tracing::warn!(
                    marker = %marker,
                    status = %resp.status(),
                    "backend rejected cancel request"
                );
                false
            }
            Err(e) => {
                tracing::warn!(marker = %marker, error = %e, "cancel request failed to send");
                false
            }
        }
    }

    fn name(&self) -> &str {
        "rest"
    }
}
