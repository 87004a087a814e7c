//! Query execution tool.
//!
//! This module implements the `pg_query` MCP tool. Statements that look
//! mutating are refused unless the caller sets `unsafe`.

use crate::db::{QueryExecutor, RowSource};
use crate::error::DbResult;
use crate::models::{QueryEnvelope, QueryRequest};
use schemars::JsonSchema;
use serde::Deserialize;
use std::future::Future;

/// Input for the query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryInput {
    /// SQL query to execute
    pub query: String,
    /// Set to true to run statements containing DROP, TRUNCATE, DELETE, UPDATE,
    /// ALTER, CREATE or INSERT. Default: false
    #[serde(rename = "unsafe", default)]
    pub allow_unsafe: bool,
}

impl From<QueryInput> for QueryRequest {
    fn from(input: QueryInput) -> Self {
        QueryRequest::new(input.query).with_unsafe(input.allow_unsafe)
    }
}

/// Handler for the query tool.
pub struct QueryToolHandler<S> {
    executor: QueryExecutor<S>,
}

impl<S: RowSource> QueryToolHandler<S> {
    pub fn new(executor: QueryExecutor<S>) -> Self {
        Self { executor }
    }

    /// Handle the query tool call.
    pub async fn query(
        &self,
        input: QueryInput,
        cancelled: impl Future<Output = ()>,
    ) -> DbResult<QueryEnvelope> {
        let request = QueryRequest::from(input);
        self.executor.execute(&request, cancelled).await
    }
}
