//! Database layer.
//!
//! This module provides database access functionality:
//! - Connection pool setup
//! - Driver adapter traits and the PostgreSQL adapter
//! - Query execution
//! - Schema introspection
//! - Row normalization

pub mod executor;
pub mod pool;
pub mod schema;
pub mod source;
pub mod types;

pub use executor::QueryExecutor;
pub use schema::{SchemaAggregator, TableGrouper, aggregate};
pub use source::{CatalogSource, PgSource, RowCursor, RowSource};
pub use types::{RawValue, TypeCategory, normalize};
