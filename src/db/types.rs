//! Row normalization.
//!
//! This module turns driver values into JSON-safe cells.
//!
//! # Architecture
//!
//! Conversion uses a two-phase approach:
//! 1. The driver adapter decodes every cell into the closed [`RawValue`] variant
//!    (see the `postgres` submodule for PostgreSQL rows)
//! 2. [`normalize`] picks a rule from the column's declared type tag and maps the
//!    raw value onto a JSON null, number, boolean or string
//!
//! Normalization never fails. A value that does not match its declared type is
//! passed through with its own natural JSON projection instead.

use crate::error::{DbError, DbResult};
use crate::models::ColumnDescriptor;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::Value as JsonValue;

/// One cell as produced by the driver adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Integer(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Text(String),
    /// Server-side text rendering of a type without a native mapping
    /// (numeric, timestamps, uuid, json, arrays, ...)
    Opaque(String),
}

/// Normalization rule selected by a declared type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    /// Text and everything else
    Text,
}

/// Classify a driver type tag.
pub fn categorize_type(declared_type: &str) -> TypeCategory {
    const INTEGER_TAGS: [&str; 3] = ["INT2", "INT4", "INT8"];
    const FLOAT_TAGS: [&str; 2] = ["FLOAT4", "FLOAT8"];

    if INTEGER_TAGS
        .iter()
        .any(|tag| declared_type.eq_ignore_ascii_case(tag))
    {
        TypeCategory::Integer
    } else if FLOAT_TAGS
        .iter()
        .any(|tag| declared_type.eq_ignore_ascii_case(tag))
    {
        TypeCategory::Float
    } else {
        TypeCategory::Text
    }
}

/// Normalize one raw value using its column's declared type.
pub fn normalize(raw: RawValue, declared_type: &str) -> JsonValue {
    match (categorize_type(declared_type), raw) {
        (_, RawValue::Null) => JsonValue::Null,
        (TypeCategory::Integer, RawValue::Integer(v)) => JsonValue::from(v),
        (TypeCategory::Float, RawValue::Float(v)) => float_value(v),
        (TypeCategory::Text, RawValue::Bytes(bytes)) => decode_binary_value(&bytes),
        (_, other) => passthrough(other),
    }
}

/// Natural JSON projection of a raw value, used when no declared-type rule applies.
fn passthrough(raw: RawValue) -> JsonValue {
    match raw {
        RawValue::Null => JsonValue::Null,
        RawValue::Integer(v) => JsonValue::from(v),
        RawValue::Float(v) => float_value(v),
        RawValue::Bool(v) => JsonValue::Bool(v),
        RawValue::Bytes(bytes) => decode_binary_value(&bytes),
        RawValue::Text(s) | RawValue::Opaque(s) => JsonValue::String(s),
    }
}

/// JSON has no NaN or infinity; those are emitted as their string rendering.
fn float_value(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

/// Decode binary data as UTF-8 text, falling back to base64 when it is not valid UTF-8.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

/// Normalize a full row into a column-name → cell map.
///
/// The row must hold exactly one value per column. With duplicate column names the
/// last value wins.
pub fn normalize_row(
    columns: &[ColumnDescriptor],
    values: Vec<RawValue>,
) -> DbResult<serde_json::Map<String, JsonValue>> {
    if values.len() != columns.len() {
        return Err(DbError::decode(format!(
            "row has {} values but the result has {} columns",
            values.len(),
            columns.len()
        )));
    }

    Ok(columns
        .iter()
        .zip(values)
        .map(|(col, raw)| (col.name.clone(), normalize(raw, &col.declared_type)))
        .collect())
}

// =============================================================================
// PostgreSQL Decoder
// =============================================================================

pub(crate) mod postgres {
    use super::*;
    use sqlx::postgres::{PgColumn, PgRow, PgValueFormat, PgValueRef};
    use sqlx::{Column, Decode, Postgres, Row, Type, TypeInfo, ValueRef};

    /// Decode every cell of a row into raw values, in column order.
    pub fn decode_row(row: &PgRow) -> DbResult<Vec<RawValue>> {
        row.columns()
            .iter()
            .map(|col| decode_column(row, col))
            .collect()
    }

    fn decode_column(row: &PgRow, col: &PgColumn) -> DbResult<RawValue> {
        let idx = col.ordinal();
        let value = row
            .try_get_raw(idx)
            .map_err(|e| column_error(col, e))?;
        if value.is_null() {
            return Ok(RawValue::Null);
        }

        let raw = match col.type_info().name() {
            "INT2" => RawValue::Integer(get::<i16>(row, col)?.into()),
            "INT4" => RawValue::Integer(get::<i32>(row, col)?.into()),
            "INT8" => RawValue::Integer(get::<i64>(row, col)?),
            "FLOAT4" => RawValue::Float(get::<f32>(row, col)?.into()),
            "FLOAT8" => RawValue::Float(get::<f64>(row, col)?),
            "BOOL" => RawValue::Bool(get::<bool>(row, col)?),
            "BYTEA" => RawValue::Bytes(get::<Vec<u8>>(row, col)?),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "UNKNOWN" => {
                RawValue::Text(get::<String>(row, col)?)
            }
            _ => opaque(col, value)?,
        };
        Ok(raw)
    }

    fn get<'r, T>(row: &'r PgRow, col: &PgColumn) -> DbResult<T>
    where
        T: Decode<'r, Postgres> + Type<Postgres>,
    {
        row.try_get::<T, _>(col.ordinal())
            .map_err(|e| column_error(col, e))
    }

    /// Text-format values keep the server's rendering; binary ones stay bytes.
    fn opaque(col: &PgColumn, value: PgValueRef<'_>) -> DbResult<RawValue> {
        match value.format() {
            PgValueFormat::Text => value
                .as_str()
                .map(|s| RawValue::Opaque(s.to_string()))
                .map_err(|e| column_error(col, e)),
            PgValueFormat::Binary => value
                .as_bytes()
                .map(|b| RawValue::Bytes(b.to_vec()))
                .map_err(|e| column_error(col, e)),
        }
    }

    fn column_error(col: &PgColumn, err: impl std::fmt::Display) -> DbError {
        DbError::decode(format!(
            "Failed to decode column '{}' ({}): {}",
            col.name(),
            col.type_info().name(),
            err
        ))
    }
}
