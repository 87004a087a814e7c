//! MCP tool implementations.
//!
//! This module contains the database tool handlers:
//! - `query`: Execute a query behind the safety gate (`pg_query`)
//! - `schema`: Describe tables and columns (`pg_schema_info`)
//! - `guard`: Keyword classifier used by the safety gate

pub mod guard;
pub mod query;
pub mod schema;

pub use query::{QueryInput, QueryToolHandler};
pub use schema::{SchemaInfoInput, SchemaToolHandler};

use crate::error::{DbError, DbResult};
use rmcp::model::CallToolResult;
use serde::Serialize;

/// Turn a handler outcome into a tool result.
///
/// Success carries the envelope as structured content (and as JSON text);
/// failure becomes an `isError` result.
pub fn to_tool_result<T: Serialize>(outcome: DbResult<T>) -> CallToolResult {
    let value = outcome.and_then(|envelope| {
        serde_json::to_value(&envelope)
            .map_err(|e| DbError::internal(format!("Failed to serialize result: {}", e)))
    });
    match value {
        Ok(value) => CallToolResult::structured(value),
        Err(err) => err.into(),
    }
}
