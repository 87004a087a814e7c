//! Query-related data models.
//!
//! This module defines types for SQL query requests and results.

use serde::Serialize;
use serde_json::Value as JsonValue;

/// Message returned in place of rows when a query produced none.
pub const NO_ROWS_MESSAGE: &str = "Query executed successfully with no rows returned";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub text: String,
    /// Skip the safety classifier. Default: false
    pub allow_unsafe: bool,
}

impl QueryRequest {
    /// Create a new query request with the safety gate enabled.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            allow_unsafe: false,
        }
    }

    /// Enable or disable the unsafe override.
    pub fn with_unsafe(mut self, allow_unsafe: bool) -> Self {
        self.allow_unsafe = allow_unsafe;
        self
    }

    /// True when the query text is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Name and driver-reported type tag of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Driver type tag (e.g., "INT8", "TEXT", "NUMERIC")
    pub declared_type: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }
}

/// JSON-safe result of a query.
///
/// Serializes as `{columns, rows, count}` or, when nothing came back,
/// `{message, columns}` without `rows` and `count`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryEnvelope {
    Rows {
        columns: Vec<String>,
        rows: Vec<serde_json::Map<String, JsonValue>>,
        count: usize,
    },
    Empty {
        message: String,
        columns: Vec<String>,
    },
}

impl QueryEnvelope {
    /// Build the envelope, choosing the zero-row form when `rows` is empty.
    pub fn from_rows(columns: Vec<String>, rows: Vec<serde_json::Map<String, JsonValue>>) -> Self {
        if rows.is_empty() {
            Self::Empty {
                message: NO_ROWS_MESSAGE.to_string(),
                columns,
            }
        } else {
            let count = rows.len();
            Self::Rows {
                columns,
                rows,
                count,
            }
        }
    }

    pub fn columns(&self) -> &[String] {
        match self {
            Self::Rows { columns, .. } | Self::Empty { columns, .. } => columns,
        }
    }

    /// Number of rows returned.
    pub fn row_count(&self) -> usize {
        match self {
            Self::Rows { count, .. } => *count,
            Self::Empty { .. } => 0,
        }
    }
}
