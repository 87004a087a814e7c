//! Data models for the PostgreSQL MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod query;
pub mod schema;

// Re-export commonly used types
pub use query::{ColumnDescriptor, NO_ROWS_MESSAGE, QueryEnvelope, QueryRequest};
pub use schema::{ColumnInfo, SchemaEnvelope, SchemaRow, TableDescriptor};
