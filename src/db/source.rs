//! Driver adapter.
//!
//! The executor and the schema aggregator never talk to sqlx directly. They go
//! through [`RowSource`] and [`CatalogSource`], which hand back columns and rows
//! already decoded into [`RawValue`]s. [`PgSource`] is the PostgreSQL
//! implementation; tests plug in in-memory doubles.

use crate::db::pool::pool_error;
use crate::db::schema::CATALOG_QUERY;
use crate::db::types::{RawValue, postgres::decode_row};
use crate::error::DbResult;
use crate::models::{ColumnDescriptor, SchemaRow};
use futures_util::stream::{self, BoxStream};
use futures_util::{StreamExt, TryStreamExt, future};
use sqlx::postgres::{PgColumn, PgRow};
use sqlx::{Column, Connection, Either, Executor, PgPool, Row, Statement, TypeInfo};
use std::future::Future;
use tracing::debug;

/// An open result set: column descriptors plus a lazy row stream.
///
/// Dropping the cursor releases the underlying connection, whether or not the
/// stream was drained.
pub struct RowCursor<'a> {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: BoxStream<'a, DbResult<Vec<RawValue>>>,
}

impl std::fmt::Debug for RowCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowCursor")
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

/// Source of query result sets.
pub trait RowSource: Send + Sync {
    /// Run `sql` and return its cursor.
    ///
    /// Column descriptors are known even when the statement yields no rows,
    /// unless the text holds several statements and none of them returns rows.
    fn open<'a>(&'a self, sql: &'a str)
    -> impl Future<Output = DbResult<RowCursor<'a>>> + Send + 'a;
}

/// Source of catalog rows for schema introspection.
pub trait CatalogSource: Send + Sync {
    /// Stream one row per (column, constraint) pair of the tables in `schema`,
    /// ordered by table name then column position. `table` restricts the result
    /// to a single table.
    fn schema_rows<'a>(
        &'a self,
        schema: &'a str,
        table: Option<&'a str>,
    ) -> BoxStream<'a, DbResult<SchemaRow>>;
}

/// PostgreSQL adapter over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgSource {
    pool: PgPool,
}

impl PgSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Describe `sql` without leaving its metadata in the connection's
    /// statement cache, so later DDL is never masked by a stale entry.
    async fn describe_columns(&self, sql: &str) -> DbResult<Option<Vec<ColumnDescriptor>>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| pool_error(&self.pool, e))?;
        let described = (&mut *conn)
            .prepare(sql)
            .await
            .map(|statement| column_descriptors(statement.columns()));
        conn.clear_cached_statements().await?;

        match described {
            Ok(columns) => Ok(Some(columns)),
            Err(e) => {
                // Multi-statement text cannot be prepared
                debug!(error = %e, "Statement could not be described");
                Ok(None)
            }
        }
    }
}

impl RowSource for PgSource {
    fn open<'a>(
        &'a self,
        sql: &'a str,
    ) -> impl Future<Output = DbResult<RowCursor<'a>>> + Send + 'a {
        async move {
            // Simple query protocol: nothing is cached and several statements may run.
            let mut results = sqlx::raw_sql(sql).fetch_many(&self.pool);

            let first = loop {
                match results.try_next().await.map_err(|e| pool_error(&self.pool, e))? {
                    Some(Either::Right(row)) => break Some(row),
                    Some(Either::Left(_)) => continue,
                    None => break None,
                }
            };

            let Some(first) = first else {
                drop(results);
                let columns = self.describe_columns(sql).await?.unwrap_or_default();
                return Ok(RowCursor {
                    columns,
                    rows: stream::empty().boxed(),
                });
            };

            // Only the first result set that returns rows is reported; later
            // statements still run and their errors still fail the call.
            let columns = column_descriptors(first.columns());
            let mut first_set_done = false;
            let rest = results.filter_map(move |item| {
                let next = match item {
                    Err(e) => Some(Err(pool_error(&self.pool, e))),
                    Ok(Either::Left(_)) => {
                        first_set_done = true;
                        None
                    }
                    Ok(Either::Right(_)) if first_set_done => None,
                    Ok(Either::Right(row)) => Some(decode_row(&row)),
                };
                future::ready(next)
            });
            let rows = stream::once(future::ready(decode_row(&first)))
                .chain(rest)
                .boxed();

            Ok(RowCursor { columns, rows })
        }
    }
}

fn column_descriptors(columns: &[PgColumn]) -> Vec<ColumnDescriptor> {
    columns
        .iter()
        .map(|col| ColumnDescriptor::new(col.name(), col.type_info().name()))
        .collect()
}

impl CatalogSource for PgSource {
    fn schema_rows<'a>(
        &'a self,
        schema: &'a str,
        table: Option<&'a str>,
    ) -> BoxStream<'a, DbResult<SchemaRow>> {
        sqlx::query(CATALOG_QUERY)
            .bind(schema)
            .bind(table)
            .fetch(&self.pool)
            .map(|row| {
                row.map_err(|e| pool_error(&self.pool, e))
                    .and_then(|row| read_schema_row(&row))
            })
            .boxed()
    }
}

fn read_schema_row(row: &PgRow) -> DbResult<SchemaRow> {
    Ok(SchemaRow {
        table_name: row.try_get("table_name")?,
        column_name: row.try_get("column_name")?,
        data_type: row.try_get("data_type")?,
        is_nullable: row.try_get("is_nullable")?,
        column_default: row.try_get("column_default")?,
        constraint_type: row.try_get("constraint_type")?,
    })
}
