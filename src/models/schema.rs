//! Schema-related data models.
//!
//! This module defines types for database schema introspection.

use serde::Serialize;

/// One row of the catalog query: a column of a table, possibly paired with a
/// constraint it participates in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRow {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    /// Catalog text, "YES" or "NO"
    pub is_nullable: String,
    pub column_default: Option<String>,
    /// e.g., "PRIMARY KEY", "FOREIGN KEY", "UNIQUE"
    pub constraint_type: Option<String>,
}

impl SchemaRow {
    /// Create a row with no default and no constraint.
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        data_type: impl Into<String>,
        is_nullable: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            data_type: data_type.into(),
            is_nullable: is_nullable.into(),
            column_default: None,
            constraint_type: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.column_default = Some(default.into());
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint_type = Some(constraint.into());
        self
    }

    /// Split into the owning table name and the column record.
    pub fn into_column(self) -> (String, ColumnInfo) {
        let column = ColumnInfo {
            column_name: self.column_name,
            data_type: self.data_type,
            is_nullable: self.is_nullable == "YES",
            default_value: self.column_default,
            constraint: self.constraint_type,
        };
        (self.table_name, column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    pub table_name: String,
    pub columns: Vec<ColumnInfo>,
}

/// Result of a schema introspection call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SchemaEnvelope {
    Tables { tables: Vec<TableDescriptor> },
    Empty { message: String },
}

impl SchemaEnvelope {
    /// Build the envelope, choosing the not-found message when `tables` is empty.
    pub fn from_tables(tables: Vec<TableDescriptor>, table_filter: Option<&str>) -> Self {
        if !tables.is_empty() {
            return Self::Tables { tables };
        }
        let message = match table_filter {
            Some(name) => format!("Table '{}' not found.", name),
            None => "No tables found in the database.".to_string(),
        };
        Self::Empty { message }
    }

    /// Number of tables described.
    pub fn table_count(&self) -> usize {
        match self {
            Self::Tables { tables } => tables.len(),
            Self::Empty { .. } => 0,
        }
    }
}
