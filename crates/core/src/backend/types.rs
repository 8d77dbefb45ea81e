// crates/core/src/backend/types.rs
//! Result types shared between the job subsystem and query backends.

use serde::{Deserialize, Serialize};

/// Tabular payload returned by a successful query.
///
/// Rows are untyped JSON values, the way the BI product's API returns them;
/// nothing in this service interprets cell contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
}

impl QueryResult {
    /// Build a result, deriving `row_count` from the row set.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
        }
    }

    /// A result with no columns and no rows (DDL, empty selects).
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}
