//! Schema introspection module.
//!
//! Runs one catalog query over `information_schema` and folds the flat row
//! stream into a table → columns structure.

use crate::config::DEFAULT_QUERY_TIMEOUT_SECS;
use crate::db::executor::run_bounded;
use crate::db::source::CatalogSource;
use crate::error::DbResult;
use crate::models::{ColumnInfo, SchemaEnvelope, SchemaRow, TableDescriptor};
use futures_util::StreamExt;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Columns of every table in schema `$1`, each paired with the constraints it
/// takes part in. `$2` optionally restricts the result to one table.
pub const CATALOG_QUERY: &str = r#"
    SELECT
        t.table_name::text AS table_name,
        c.column_name::text AS column_name,
        c.data_type::text AS data_type,
        c.is_nullable::text AS is_nullable,
        c.column_default::text AS column_default,
        tc.constraint_type::text AS constraint_type
    FROM information_schema.tables t
    JOIN information_schema.columns c
        ON c.table_schema = t.table_schema
        AND c.table_name = t.table_name
    LEFT JOIN information_schema.key_column_usage kcu
        ON kcu.table_schema = c.table_schema
        AND kcu.table_name = c.table_name
        AND kcu.column_name = c.column_name
    LEFT JOIN information_schema.table_constraints tc
        ON tc.constraint_schema = kcu.constraint_schema
        AND tc.constraint_name = kcu.constraint_name
        AND tc.table_schema = kcu.table_schema
        AND tc.table_name = kcu.table_name
    WHERE t.table_schema = $1
        AND ($2::text IS NULL OR t.table_name = $2)
    ORDER BY t.table_name, c.ordinal_position
"#;

/// Builds the schema envelope from catalog rows.
pub struct SchemaAggregator<C> {
    source: C,
    schema: String,
    query_timeout: Duration,
}

impl<C: CatalogSource> SchemaAggregator<C> {
    /// Inspect `schema` with the default timeout.
    pub fn new(source: C, schema: impl Into<String>) -> Self {
        Self::with_timeout(
            source,
            schema,
            Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        )
    }

    pub fn with_timeout(source: C, schema: impl Into<String>, query_timeout: Duration) -> Self {
        Self {
            source,
            schema: schema.into(),
            query_timeout,
        }
    }

    pub fn source(&self) -> &C {
        &self.source
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Describe every table in the schema, or only `table` when given.
    ///
    /// An empty or whitespace-only `table` means no filter.
    pub async fn describe(
        &self,
        table: Option<&str>,
        cancelled: impl Future<Output = ()>,
    ) -> DbResult<SchemaEnvelope> {
        let filter = table.map(str::trim).filter(|name| !name.is_empty());
        let start = Instant::now();
        debug!(schema = %self.schema, table = ?filter, "Fetching schema information");

        let tables = run_bounded(
            "schema introspection",
            self.query_timeout,
            cancelled,
            self.collect(filter),
        )
        .await?;

        info!(
            schema = %self.schema,
            tables = tables.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Schema described"
        );
        Ok(SchemaEnvelope::from_tables(tables, filter))
    }

    async fn collect(&self, filter: Option<&str>) -> DbResult<Vec<TableDescriptor>> {
        let mut rows = self.source.schema_rows(&self.schema, filter);
        let mut grouper = TableGrouper::default();
        while let Some(row) = rows.next().await {
            grouper.push(row?);
        }
        Ok(grouper.finish())
    }
}

/// Groups catalog rows by table, keeping column order within each table.
#[derive(Debug, Default)]
pub struct TableGrouper {
    tables: BTreeMap<String, Vec<ColumnInfo>>,
}

impl TableGrouper {
    pub fn push(&mut self, row: SchemaRow) {
        let (table_name, column) = row.into_column();
        self.tables.entry(table_name).or_default().push(column);
    }

    /// Tables sorted by name.
    pub fn finish(self) -> Vec<TableDescriptor> {
        self.tables
            .into_iter()
            .map(|(table_name, columns)| TableDescriptor {
                table_name,
                columns,
            })
            .collect()
    }
}

/// Fold already-collected catalog rows into table descriptors.
pub fn aggregate(rows: impl IntoIterator<Item = SchemaRow>) -> Vec<TableDescriptor> {
    let mut grouper = TableGrouper::default();
    for row in rows {
        grouper.push(row);
    }
    grouper.finish()
}
