//! Data models for the Snowflake Search MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod catalog;
pub mod notice;
pub mod selection;
pub mod search;

// Re-export commonly used types
pub use catalog::{
    BASE_TABLE, ColumnRef, ColumnTypePolicy, INFORMATION_SCHEMA, TEXT_SEARCH_TYPES, TableRef,
};
pub use notice::{Notice, NoticeLevel, Notices};
pub use search::{
    DEFAULT_SEARCH_ROW_LIMIT, DEFAULT_WILDCARD_THRESHOLD, MAX_SEARCH_ROW_LIMIT, PredicateShape,
    SCHEMA_NAME_COLUMN, SearchPlan, SearchResults, SearchScope, TABLE_NAME_COLUMN, TableResult,
    TableSearchPlan, WildcardReason,
};
pub use selection::{
    ColumnSelection, SelectionChange, SelectionLevel, SelectionState, apply_selection,
};
