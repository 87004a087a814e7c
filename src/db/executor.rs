//! Query execution engine.
//!
//! This module provides query execution functionality with support for:
//! - The advisory safety gate (skipped when the caller sets `unsafe`)
//! - Query timeouts and client cancellation
//! - Result streaming through the row normalizer
//!
//! # Architecture
//!
//! [`QueryExecutor`] is generic over a [`RowSource`], so the same pipeline runs
//! against PostgreSQL in production and against in-memory doubles in tests. The
//! whole database round trip sits inside [`run_bounded`]; when the timeout fires
//! or the caller cancels, the in-flight future is dropped and the cursor with it.

use crate::config::DEFAULT_QUERY_TIMEOUT_SECS;
use crate::db::source::{RowCursor, RowSource};
use crate::db::types::normalize_row;
use crate::error::{DbError, DbResult};
use crate::models::{QueryEnvelope, QueryRequest};
use crate::tools::guard::{SafetyVerdict, classify};
use futures_util::StreamExt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Query executor that handles database query execution.
pub struct QueryExecutor<S> {
    source: S,
    query_timeout: Duration,
}

impl<S: RowSource> QueryExecutor<S> {
    /// Create a new query executor with the default timeout.
    pub fn new(source: S) -> Self {
        Self::with_timeout(source, Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS))
    }

    /// Create a new query executor with a custom timeout.
    pub fn with_timeout(source: S, query_timeout: Duration) -> Self {
        Self {
            source,
            query_timeout,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Execute a query and return its normalized result envelope.
    ///
    /// `cancelled` resolves when the caller abandons the request. Blank and
    /// blocked queries are rejected without touching the database.
    pub async fn execute(
        &self,
        request: &QueryRequest,
        cancelled: impl Future<Output = ()>,
    ) -> DbResult<QueryEnvelope> {
        if request.is_blank() {
            return Err(DbError::invalid_input("query parameter required"));
        }

        if !request.allow_unsafe {
            if let SafetyVerdict::Denied { keyword } = classify(&request.text) {
                warn!(
                    keyword = keyword.trim_end(),
                    "Blocked potentially unsafe query"
                );
                return Err(DbError::unsafe_query_blocked(keyword));
            }
        }

        let start = Instant::now();
        debug!(
            sql = %request.text,
            allow_unsafe = request.allow_unsafe,
            timeout_secs = self.query_timeout.as_secs(),
            "Executing query"
        );

        let envelope = run_bounded(
            "query execution",
            self.query_timeout,
            cancelled,
            self.fetch(&request.text),
        )
        .await?;

        info!(
            columns = envelope.columns().len(),
            rows = envelope.row_count(),
            allow_unsafe = request.allow_unsafe,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query executed"
        );
        Ok(envelope)
    }

    async fn fetch(&self, sql: &str) -> DbResult<QueryEnvelope> {
        let RowCursor { columns, mut rows } = self.source.open(sql).await?;

        let mut json_rows = Vec::new();
        while let Some(values) = rows.next().await {
            json_rows.push(normalize_row(&columns, values?)?);
        }

        let names = columns.into_iter().map(|col| col.name).collect();
        Ok(QueryEnvelope::from_rows(names, json_rows))
    }
}

/// Drive `work` to completion unless `cancelled` resolves or `limit` elapses first.
///
/// The losing future is dropped, which releases any cursor or pooled connection
/// it holds.
pub(crate) async fn run_bounded<T>(
    operation: &str,
    limit: Duration,
    cancelled: impl Future<Output = ()>,
    work: impl Future<Output = DbResult<T>>,
) -> DbResult<T> {
    tokio::select! {
        biased;
        _ = cancelled => {
            debug!(operation, "Cancelled by client");
            Err(DbError::cancelled(operation))
        }
        result = timeout(limit, work) => match result {
            Ok(outcome) => outcome,
            Err(_) => Err(timeout_error(operation, limit)),
        },
    }
}

fn timeout_error(operation: &str, limit: Duration) -> DbError {
    DbError::timeout(operation, limit.as_secs() as u32)
}
