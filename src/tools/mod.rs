//! MCP tool implementations.
//!
//! This module contains all tool handlers:
//! - `navigator`: `list_databases`, `select_database`, `list_schemas`, `select_schemas`,
//!   `list_tables`, `select_tables`, `list_columns`, `select_columns`, `set_wildcard`,
//!   `get_selection`
//! - `search`: Run `SEARCH` over the selected columns
//! - `export`: Export the last search as CSV
//! - `format`: ASCII / Markdown / CSV rendering helpers

pub mod export;
pub mod format;
pub mod navigator;
pub mod search;

pub use export::{ExportInput, ExportOutput};
pub use format::OutputFormat;
pub use navigator::{
    CatalogNavigator, ColumnKey, ListColumnsOutput, ListDatabasesOutput, ListSchemasOutput,
    ListTablesOutput, SelectColumnsInput, SelectDatabaseInput, SelectSchemasInput,
    SelectTablesInput, SelectionOutput, SetWildcardInput,
};
pub use search::{SearchInput, SearchOrchestrator, SearchOutput};
