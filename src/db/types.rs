//! Result set types and Snowflake type mappings.
//!
//! The SQL API returns every cell as a string (or null) together with a
//! `rowType` description per column. This module classifies those column
//! types and decodes cells into JSON values.
//!
//! # Architecture
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. `decode_cell` turns the raw cell text into a JSON value for that category

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for Snowflake column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Decimal,
    Float,
    Boolean,
    Text,
    SemiStructured,
    Unknown,
}

/// Classify a Snowflake `rowType` type name into a logical category.
///
/// `FIXED` columns are integers when their scale is zero and decimals otherwise.
pub fn categorize_type(type_name: &str, scale: Option<i32>) -> TypeCategory {
    let lower = type_name.to_lowercase();
    match lower.as_str() {
        "fixed" | "number" | "decimal" | "numeric" => {
            if scale.unwrap_or(0) == 0 {
                TypeCategory::Integer
            } else {
                TypeCategory::Decimal
            }
        }
        "int" | "integer" | "bigint" | "smallint" | "tinyint" | "byteint" => TypeCategory::Integer,
        "real" | "float" | "float4" | "float8" | "double" | "double precision" => {
            TypeCategory::Float
        }
        "boolean" => TypeCategory::Boolean,
        "text" | "varchar" | "string" | "char" | "character" => TypeCategory::Text,
        "variant" | "object" | "array" => TypeCategory::SemiStructured,
        // Dates, timestamps, binary and geography stay as the text Snowflake sends
        _ => TypeCategory::Unknown,
    }
}

/// Decode one raw cell into a JSON value.
///
/// Values that do not parse as their declared category fall back to a string,
/// so no data is lost.
pub fn decode_cell(raw: Option<&str>, category: TypeCategory) -> JsonValue {
    let Some(raw) = raw else {
        return JsonValue::Null;
    };

    match category {
        TypeCategory::Integer => raw
            .parse::<i64>()
            .map(JsonValue::from)
            .unwrap_or_else(|_| JsonValue::String(raw.to_string())),
        TypeCategory::Float => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(raw.to_string())),
        TypeCategory::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" => JsonValue::Bool(true),
            "false" | "0" => JsonValue::Bool(false),
            _ => JsonValue::String(raw.to_string()),
        },
        TypeCategory::SemiStructured => serde_json::from_str(raw)
            .unwrap_or_else(|_| JsonValue::String(raw.to_string())),
        // Decimals keep their exact textual representation
        TypeCategory::Decimal | TypeCategory::Text | TypeCategory::Unknown => {
            JsonValue::String(raw.to_string())
        }
    }
}

// =============================================================================
// Result Sets
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnMetadata {
    pub name: String,
    /// Snowflake type (e.g., "fixed", "text", "variant")
    pub type_name: String,
    pub nullable: bool,
}

impl ColumnMetadata {
    /// Create new column metadata.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable,
        }
    }
}

/// Rows returned by one statement, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<ColumnMetadata>,
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
}

impl RowSet {
    /// Build a row set from column metadata and already-decoded rows.
    ///
    /// Duplicate column names (e.g. a table that has its own `TABLE_NAME`
    /// column next to the injected one) are made unique with a `_<n>` suffix
    /// so no value is overwritten.
    pub fn from_values(columns: Vec<ColumnMetadata>, values: Vec<Vec<JsonValue>>) -> Self {
        let columns = dedupe_column_names(columns);
        let rows = values
            .into_iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| c.name.clone())
                    .zip(row.into_iter().chain(std::iter::repeat(JsonValue::Null)))
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    /// Column names in result order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn dedupe_column_names(columns: Vec<ColumnMetadata>) -> Vec<ColumnMetadata> {
    let mut seen: Vec<String> = Vec::with_capacity(columns.len());
    columns
        .into_iter()
        .map(|mut column| {
            let base = column.name.clone();
            let mut suffix = 1;
            while seen.contains(&column.name) {
                column.name = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            seen.push(column.name.clone());
            column
        })
        .collect()
}

/// Read a string field from a row, matching the column name case-insensitively.
///
/// `SHOW` commands return lowercase column names while `INFORMATION_SCHEMA`
/// views return uppercase ones.
pub fn row_str<'a>(row: &'a serde_json::Map<String, JsonValue>, column: &str) -> Option<&'a str> {
    row.get(column)
        .or_else(|| {
            row.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(column))
                .map(|(_, v)| v)
        })
        .and_then(JsonValue::as_str)
}
