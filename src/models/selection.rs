//! Cascading selection state.
//!
//! The selection is an explicit value threaded through every interaction.
//! [`apply_selection`] is the only way to change it: it returns a new state
//! in which every selection and cached option list below the changed level
//! has been cleared, so stale descendants can never survive a parent change.

use crate::models::catalog::{ColumnRef, TableRef};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Level of the catalog hierarchy a selection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SelectionLevel {
    Database,
    Schemas,
    Tables,
    Columns,
}

/// Which columns are selected for searching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "mode", content = "columns", rename_all = "snake_case")]
pub enum ColumnSelection {
    /// Every column currently offered for the selected tables
    All,
    /// An explicit subset of the offered columns
    Explicit(Vec<ColumnRef>),
}

impl Default for ColumnSelection {
    fn default() -> Self {
        Self::Explicit(Vec::new())
    }
}

/// A single user-driven change to the selection.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionChange {
    Database(Option<String>),
    Schemas(Vec<String>),
    Tables(Vec<TableRef>),
    Columns(ColumnSelection),
    /// Force whole-row wildcard search. Turning it on selects all columns.
    Wildcard(bool),
}

impl SelectionChange {
    /// The level this change applies to.
    pub fn level(&self) -> SelectionLevel {
        match self {
            Self::Database(_) => SelectionLevel::Database,
            Self::Schemas(_) => SelectionLevel::Schemas,
            Self::Tables(_) => SelectionLevel::Tables,
            Self::Columns(_) | Self::Wildcard(_) => SelectionLevel::Columns,
        }
    }
}

/// Current selections plus the option lists they were chosen from.
///
/// Option lists are `None` until fetched; the navigator fills them lazily.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub database: Option<String>,
    pub schemas: Vec<String>,
    pub tables: Vec<TableRef>,
    pub columns: ColumnSelection,
    pub force_wildcard: bool,
    pub available_schemas: Option<Vec<String>>,
    pub available_tables: Option<Vec<TableRef>>,
    pub available_columns: Option<Vec<ColumnRef>>,
}

impl SelectionState {
    /// Columns the search will consider, resolving "all" against the offered columns.
    pub fn selected_columns(&self) -> Vec<ColumnRef> {
        match &self.columns {
            ColumnSelection::All => self.available_columns.clone().unwrap_or_default(),
            ColumnSelection::Explicit(columns) => columns.clone(),
        }
    }

    /// Whether the given change would actually alter this state.
    pub fn differs(&self, change: &SelectionChange) -> bool {
        match change {
            SelectionChange::Database(database) => &self.database != database,
            SelectionChange::Schemas(schemas) => &self.schemas != schemas,
            SelectionChange::Tables(tables) => &self.tables != tables,
            SelectionChange::Columns(columns) => &self.columns != columns,
            SelectionChange::Wildcard(on) => self.force_wildcard != *on,
        }
    }

    /// Clear every selection and option cache strictly below `level`.
    fn clear_below(&mut self, level: SelectionLevel) {
        if level < SelectionLevel::Schemas {
            self.schemas.clear();
            self.available_schemas = None;
        }
        if level < SelectionLevel::Tables {
            self.tables.clear();
            self.available_tables = None;
        }
        if level < SelectionLevel::Columns {
            self.columns = ColumnSelection::default();
            self.force_wildcard = false;
            self.available_columns = None;
        }
    }
}

/// Apply one change and return the resulting state.
///
/// A change equal to the current value returns an identical state, so
/// re-submitting a selection never throws away descendant work.
pub fn apply_selection(state: &SelectionState, change: SelectionChange) -> SelectionState {
    if !state.differs(&change) {
        return state.clone();
    }

    let mut next = state.clone();
    next.clear_below(change.level());

    match change {
        SelectionChange::Database(database) => next.database = database,
        SelectionChange::Schemas(schemas) => next.schemas = schemas,
        SelectionChange::Tables(tables) => next.tables = tables,
        SelectionChange::Columns(columns) => next.columns = columns,
        SelectionChange::Wildcard(on) => {
            next.force_wildcard = on;
            next.columns = if on {
                ColumnSelection::All
            } else {
                ColumnSelection::default()
            };
        }
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> SelectionState {
        SelectionState {
            database: Some("SANDBOX".to_string()),
            schemas: vec!["PUBLIC".to_string()],
            tables: vec![TableRef::new("PUBLIC", "CUSTOMERS")],
            columns: ColumnSelection::Explicit(vec![ColumnRef::new(
                "PUBLIC",
                "CUSTOMERS",
                "NAME",
                "TEXT",
            )]),
            force_wildcard: false,
            available_schemas: Some(vec!["PUBLIC".to_string(), "SALES".to_string()]),
            available_tables: Some(vec![TableRef::new("PUBLIC", "CUSTOMERS")]),
            available_columns: Some(vec![ColumnRef::new("PUBLIC", "CUSTOMERS", "NAME", "TEXT")]),
        }
    }

    #[test]
    fn test_database_change_clears_everything_below() {
        let next = apply_selection(
            &populated(),
            SelectionChange::Database(Some("PROD".to_string())),
        );
        assert_eq!(next.database.as_deref(), Some("PROD"));
        assert!(next.schemas.is_empty());
        assert!(next.tables.is_empty());
        assert_eq!(next.columns, ColumnSelection::default());
        assert!(next.available_schemas.is_none());
        assert!(next.available_tables.is_none());
        assert!(next.available_columns.is_none());
    }

    #[test]
    fn test_schema_change_keeps_schema_options() {
        let next = apply_selection(
            &populated(),
            SelectionChange::Schemas(vec!["SALES".to_string()]),
        );
        assert_eq!(next.schemas, vec!["SALES".to_string()]);
        assert!(next.available_schemas.is_some());
        assert!(next.tables.is_empty());
        assert!(next.available_tables.is_none());
        assert!(next.available_columns.is_none());
        assert_eq!(next.columns, ColumnSelection::default());
    }

    #[test]
    fn test_table_change_clears_columns_only() {
        let state = populated();
        let next = apply_selection(
            &state,
            SelectionChange::Tables(vec![TableRef::new("PUBLIC", "ORDERS")]),
        );
        assert_eq!(next.schemas, state.schemas);
        assert_eq!(next.available_tables, state.available_tables);
        assert!(next.available_columns.is_none());
        assert_eq!(next.columns, ColumnSelection::default());
    }

    #[test]
    fn test_unchanged_value_is_noop() {
        let state = populated();
        let next = apply_selection(&state, SelectionChange::Schemas(state.schemas.clone()));
        assert_eq!(next, state);
    }

    #[test]
    fn test_wildcard_selects_all_columns() {
        let next = apply_selection(&populated(), SelectionChange::Wildcard(true));
        assert!(next.force_wildcard);
        assert_eq!(next.columns, ColumnSelection::All);
        assert_eq!(next.selected_columns().len(), 1);
        assert!(next.available_columns.is_some());

        let off = apply_selection(&next, SelectionChange::Wildcard(false));
        assert!(!off.force_wildcard);
        assert!(off.selected_columns().is_empty());
    }

    #[test]
    fn test_cascade_resets_wildcard() {
        let wild = apply_selection(&populated(), SelectionChange::Wildcard(true));
        let next = apply_selection(&wild, SelectionChange::Tables(Vec::new()));
        assert!(!next.force_wildcard);
    }

    #[test]
    fn test_change_levels() {
        assert_eq!(
            SelectionChange::Database(None).level(),
            SelectionLevel::Database
        );
        assert_eq!(
            SelectionChange::Wildcard(true).level(),
            SelectionLevel::Columns
        );
    }
}
