//! Error types for the PostgreSQL MCP Server.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Every variant maps onto one caller-visible [`ErrorKind`], and every error is turned
//! into a tool-level error result at the MCP boundary instead of failing the request.

use crate::config::DEFAULT_ACQUIRE_TIMEOUT_SECS;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Caller-visible error category reported with every failed tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or empty required parameter. Nothing was executed.
    Validation,
    /// Query rejected by the safety classifier. Nothing was executed.
    SafetyDenied,
    /// Connectivity, SQL, permission, timeout or cancellation failure.
    Execution,
    /// A row or column could not be decoded.
    Decoding,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::SafetyDenied => write!(f, "safety_denied"),
            Self::Execution => write!(f, "execution"),
            Self::Decoding => write!(f, "decoding"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u32,
    },

    #[error("Cancelled: {operation} was cancelled by the client")]
    Cancelled { operation: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Potentially unsafe query detected. Set 'unsafe' to true to execute.")]
    UnsafeQueryBlocked {
        /// Denylist token that matched, trailing space included
        keyword: &'static str,
    },

    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u32) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// No pooled connection became free within `acquire_timeout`.
    pub fn pool_timed_out(acquire_timeout: Duration) -> Self {
        Self::timeout("connection pool acquire", acquire_timeout.as_secs() as u32)
    }

    /// Create a cancellation error.
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an unsafe query error for the matched denylist token.
    pub fn unsafe_query_blocked(keyword: &'static str) -> Self {
        Self::UnsafeQueryBlocked { keyword }
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Caller-visible category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::Validation,
            Self::UnsafeQueryBlocked { .. } => ErrorKind::SafetyDenied,
            Self::Decode { .. } => ErrorKind::Decoding,
            Self::Connection { .. }
            | Self::Database { .. }
            | Self::Timeout { .. }
            | Self::Cancelled { .. }
            | Self::Internal { .. } => ErrorKind::Execution,
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { suggestion, .. } => Some(suggestion),
            Self::Timeout { .. } => {
                Some("Consider increasing --query-timeout or optimizing the query")
            }
            Self::UnsafeQueryBlocked { .. } => {
                Some("Review the statement, then retry with unsafe=true if the change is intended")
            }
            _ => None,
        }
    }

    /// Message shown to the caller. Database errors carry their SQLSTATE.
    pub fn user_message(&self) -> String {
        match self {
            Self::Database {
                sql_state: Some(code),
                ..
            } => format!("{} (SQLSTATE: {})", self, code),
            _ => self.to_string(),
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::database(
                    db_err.message(),
                    code,
                    "Check the SQL syntax and referenced objects",
                )
            }
            sqlx::Error::RowNotFound => DbError::database(
                "No rows returned",
                None,
                "Verify the query conditions match existing data",
            ),
            sqlx::Error::PoolTimedOut => {
                DbError::pool_timed_out(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS))
            }
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Restart the server")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration (sslmode) and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::TypeNotFound { type_name } => {
                DbError::decode(format!("Type not found: {}", type_name))
            }
            sqlx::Error::ColumnNotFound(col) => {
                DbError::decode(format!("Column not found: {}", col))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::decode(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::decode(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::decode(format!("{}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Turn a failed call into an MCP tool error result.
///
/// The failure stays inside the tool result (`isError: true`) so the client sees a
/// short message plus `{kind, message, suggestion}` structured content, and the
/// JSON-RPC request itself still succeeds.
impl From<DbError> for CallToolResult {
    fn from(err: DbError) -> Self {
        let message = err.user_message();
        let mut data = serde_json::json!({
            "kind": err.kind(),
            "message": message,
        });
        if let Some(suggestion) = err.suggestion() {
            data["suggestion"] = serde_json::Value::String(suggestion.to_string());
        }

        let mut result = CallToolResult::error(vec![Content::text(message)]);
        result.structured_content = Some(data);
        result
    }
}
