//! Schema introspection tool.
//!
//! This module implements the `pg_schema_info` MCP tool.

use crate::db::{CatalogSource, SchemaAggregator};
use crate::error::DbResult;
use crate::models::SchemaEnvelope;
use schemars::JsonSchema;
use serde::Deserialize;
use std::future::Future;

/// Input for the schema info tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct SchemaInfoInput {
    /// Table to describe. Omit to describe every table in the schema.
    #[serde(default)]
    pub table: Option<String>,
}

/// Handler for the schema info tool.
pub struct SchemaToolHandler<C> {
    aggregator: SchemaAggregator<C>,
}

impl<C: CatalogSource> SchemaToolHandler<C> {
    pub fn new(aggregator: SchemaAggregator<C>) -> Self {
        Self { aggregator }
    }

    /// Handle the schema info tool call.
    pub async fn schema_info(
        &self,
        input: SchemaInfoInput,
        cancelled: impl Future<Output = ()>,
    ) -> DbResult<SchemaEnvelope> {
        self.aggregator
            .describe(input.table.as_deref(), cancelled)
            .await
    }
}
