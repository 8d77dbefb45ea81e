// crates/core/src/lib.rs
//! Querydeck core library.
//!
//! Defines the query-execution boundary the job subsystem drives: the
//! [`QueryExecutor`] trait, the REST implementation that talks to the BI
//! backend, and the shared result/error types.

pub mod backend;
pub mod error;

pub use backend::{BackendConfig, QueryExecutor, QueryResult, RestQueryExecutor};
pub use error::QueryError;
