//! Catalog-related data models.
//!
//! This module defines the database → schema → table → column hierarchy
//! discovered through `INFORMATION_SCHEMA`.

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reserved schema that is never offered for selection.
pub const INFORMATION_SCHEMA: &str = "INFORMATION_SCHEMA";

/// Table type reported by `INFORMATION_SCHEMA.TABLES` for regular tables.
pub const BASE_TABLE: &str = "BASE TABLE";

/// Column types that hold text or semi-structured data.
pub const TEXT_SEARCH_TYPES: [&str; 5] = ["VARCHAR", "VARIANT", "ARRAY", "TEXT", "OBJECT"];

/// A base table, identified by its schema and name.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct TableRef {
    /// Schema containing the table
    pub schema: String,
    /// Table name
    pub name: String,
}

impl TableRef {
    /// Create a new table reference.
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Display key in `SCHEMA.TABLE` form.
    pub fn key(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// A column of a base table with its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ColumnRef {
    pub schema: String,
    pub table: String,
    pub name: String,
    /// Snowflake data type as reported by `INFORMATION_SCHEMA.COLUMNS` (e.g. `TEXT`)
    pub data_type: String,
}

impl ColumnRef {
    /// Create a new column reference.
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        name: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            name: name.into(),
            data_type: data_type.into(),
        }
    }

    /// The table this column belongs to.
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.schema, &self.table)
    }

    /// Whether this column belongs to the given table.
    pub fn belongs_to(&self, table: &TableRef) -> bool {
        self.schema == table.schema && self.table == table.name
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{} ({})",
            self.schema, self.table, self.name, self.data_type
        )
    }
}

/// Which columns column discovery offers for selection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnTypePolicy {
    /// Only textual and semi-structured columns (VARCHAR, VARIANT, ARRAY, TEXT, OBJECT)
    #[default]
    TextOnly,
    /// Every column regardless of type
    All,
}

impl ColumnTypePolicy {
    /// Type names the catalog query must be restricted to, if any.
    pub fn allowed_types(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::TextOnly => Some(&TEXT_SEARCH_TYPES),
            Self::All => None,
        }
    }
}

impl std::fmt::Display for ColumnTypePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TextOnly => write!(f, "text-only"),
            Self::All => write!(f, "all"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_key() {
        let table = TableRef::new("PUBLIC", "CUSTOMERS");
        assert_eq!(table.key(), "PUBLIC.CUSTOMERS");
        assert_eq!(table.to_string(), "PUBLIC.CUSTOMERS");
    }

    #[test]
    fn test_column_display_and_table() {
        let column = ColumnRef::new("PUBLIC", "CUSTOMERS", "EMAIL", "TEXT");
        assert_eq!(column.to_string(), "PUBLIC.CUSTOMERS.EMAIL (TEXT)");
        assert_eq!(column.table_ref(), TableRef::new("PUBLIC", "CUSTOMERS"));
        assert!(column.belongs_to(&TableRef::new("PUBLIC", "CUSTOMERS")));
        assert!(!column.belongs_to(&TableRef::new("SALES", "CUSTOMERS")));
    }

    #[test]
    fn test_text_only_policy() {
        let types = ColumnTypePolicy::TextOnly.allowed_types().unwrap();
        assert!(types.contains(&"TEXT"));
        assert!(types.contains(&"VARIANT"));
        assert!(!types.contains(&"NUMBER"));
    }

    #[test]
    fn test_all_policy() {
        let policy = ColumnTypePolicy::All;
        assert!(policy.allowed_types().is_none());
    }
}
