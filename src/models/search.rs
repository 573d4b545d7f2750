//! Search-related data models.
//!
//! This module defines the search scope, per-table search plans and the
//! aggregated results of a search.

use crate::models::catalog::{ColumnRef, TableRef};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Default cap on rows returned per table.
pub const DEFAULT_SEARCH_ROW_LIMIT: u32 = 1000;

/// Hard cap on rows per table; settings and per-call limits can only lower it.
pub const MAX_SEARCH_ROW_LIMIT: u32 = DEFAULT_SEARCH_ROW_LIMIT;

/// Column count above which a table is searched with a whole-row wildcard.
pub const DEFAULT_WILDCARD_THRESHOLD: usize = 15;

/// Names of the identifier columns injected in front of every result row.
pub const SCHEMA_NAME_COLUMN: &str = "SCHEMA_NAME";
pub const TABLE_NAME_COLUMN: &str = "TABLE_NAME";

/// Schemas and tables a search is restricted to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct SearchScope {
    pub schemas: Vec<String>,
    pub tables: Vec<TableRef>,
}

impl SearchScope {
    /// Create a new search scope.
    pub fn new(schemas: Vec<String>, tables: Vec<TableRef>) -> Self {
        Self { schemas, tables }
    }

    /// A column is in scope when its schema is a scoped schema and its table a scoped table.
    pub fn contains(&self, column: &ColumnRef) -> bool {
        self.schemas.iter().any(|s| s == &column.schema)
            && self.tables.iter().any(|t| column.belongs_to(t))
    }
}

/// What the `SEARCH` predicate of one table matches against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredicateShape {
    /// Every column of the row (`"TABLE".*`)
    Wildcard,
    /// The exact selected columns
    Columns { columns: Vec<String> },
}

impl PredicateShape {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }
}

/// Why a table is searched with a wildcard predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum WildcardReason {
    Forced,
    ColumnCount { count: usize },
}

/// The search of a single table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct TableSearchPlan {
    pub table: TableRef,
    /// Selected columns of this table, in selection order
    pub columns: Vec<String>,
    pub predicate: PredicateShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wildcard_reason: Option<WildcardReason>,
}

/// Everything needed to execute a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct SearchPlan {
    pub database: String,
    pub term: String,
    pub row_limit: u32,
    pub scope: SearchScope,
    pub tables: Vec<TableSearchPlan>,
}

impl SearchPlan {
    /// Total number of selected columns across all tables.
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }
}

/// Rows found in one table.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct TableResult {
    pub table: TableRef,
    /// Result columns in query order, starting with the injected identifier columns
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    /// True if the per-table row cap was reached
    pub truncated: bool,
}

impl TableResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Aggregated results of one search, in table execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
pub struct SearchResults {
    pub term: String,
    pub tables: Vec<TableResult>,
}

impl SearchResults {
    /// Results with no tables.
    pub fn empty(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            tables: Vec::new(),
        }
    }

    /// Sum of row counts across tables.
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(TableResult::row_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Look up the result of one table.
    pub fn get(&self, table: &TableRef) -> Option<&TableResult> {
        self.tables.iter().find(|t| &t.table == table)
    }
}
