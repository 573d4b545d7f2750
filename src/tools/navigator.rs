//! Catalog navigation tools.
//!
//! This module implements the `list_*` / `select_*` / `set_wildcard` /
//! `get_selection` MCP tools on top of [`CatalogNavigator`].

use crate::config::ExplorerSettings;
use crate::db::{CatalogInspector, SqlSession};
use crate::models::{
    ColumnRef, ColumnSelection, Notice, Notices, SelectionChange, SelectionState, TableRef,
    apply_selection,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

// =============================================================================
// Tool inputs / outputs
// =============================================================================

/// Input for the select_database tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SelectDatabaseInput {
    /// Database name from list_databases
    pub database: String,
}

/// Input for the select_schemas tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SelectSchemasInput {
    /// Schema names from list_schemas. An empty list clears the selection.
    pub schemas: Vec<String>,
}

/// Input for the select_tables tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SelectTablesInput {
    /// Tables from list_tables. An empty list clears the selection.
    pub tables: Vec<TableRef>,
}

/// A column identified without its type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct ColumnKey {
    pub schema: String,
    pub table: String,
    pub name: String,
}

impl ColumnKey {
    fn matches(&self, column: &ColumnRef) -> bool {
        self.schema == column.schema && self.table == column.table && self.name == column.name
    }
}

impl std::fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.schema, self.table, self.name)
    }
}

/// Input for the select_columns tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SelectColumnsInput {
    /// Select every column offered by list_columns. Overrides `columns`.
    #[serde(default)]
    pub all: bool,
    /// Columns from list_columns
    #[serde(default)]
    pub columns: Vec<ColumnKey>,
}

/// Input for the set_wildcard tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetWildcardInput {
    /// Search whole rows of every table. Turning this on selects all columns,
    /// turning it off clears the column selection.
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListDatabasesOutput {
    pub databases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListSchemasOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    pub schemas: Vec<String>,
    pub selected: Vec<String>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListTablesOutput {
    pub tables: Vec<TableRef>,
    pub selected: Vec<TableRef>,
    pub count: usize,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListColumnsOutput {
    pub columns: Vec<ColumnRef>,
    pub selected: ColumnSelection,
    pub count: usize,
    pub notices: Vec<Notice>,
}

/// Snapshot of the current selection.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SelectionOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    pub schemas: Vec<String>,
    pub tables: Vec<TableRef>,
    pub columns: ColumnSelection,
    /// Selected columns with "all" resolved against the offered columns
    pub resolved_columns: Vec<ColumnRef>,
    pub force_wildcard: bool,
    pub notices: Vec<Notice>,
}

impl SelectionOutput {
    pub fn new(state: &SelectionState, notices: Notices) -> Self {
        Self {
            database: state.database.clone(),
            schemas: state.schemas.clone(),
            tables: state.tables.clone(),
            columns: state.columns.clone(),
            resolved_columns: state.selected_columns(),
            force_wildcard: state.force_wildcard,
            notices: notices.into_vec(),
        }
    }
}

// =============================================================================
// Navigator
// =============================================================================

/// Drives the database → schemas → tables → columns cascade.
///
/// Option lists are fetched lazily and cached in the [`SelectionState`];
/// every selection goes through [`apply_selection`]. Catalog failures never
/// escape: they become an error notice and an empty option list.
pub struct CatalogNavigator<'a> {
    session: &'a dyn SqlSession,
    settings: &'a ExplorerSettings,
}

impl<'a> CatalogNavigator<'a> {
    pub fn new(session: &'a dyn SqlSession, settings: &'a ExplorerSettings) -> Self {
        Self { session, settings }
    }

    /// All databases, or an empty list after an error notice.
    pub async fn databases(&self, notices: &mut Notices) -> Vec<String> {
        match CatalogInspector::list_databases(self.session).await {
            Ok(databases) => databases,
            Err(e) => {
                notices.error(format!("Error fetching databases: {e}"));
                Vec::new()
            }
        }
    }

    /// Select the default database when none is selected yet.
    ///
    /// Returns the database list that was fetched, if any.
    pub async fn ensure_database(
        &self,
        state: &mut SelectionState,
        notices: &mut Notices,
    ) -> Option<Vec<String>> {
        if state.database.is_some() {
            return None;
        }

        let databases = self.databases(notices).await;
        if let Some(default) = default_database(&databases, &self.settings.default_database) {
            debug!(database = %default, "Selecting default database");
            *state = apply_selection(state, SelectionChange::Database(Some(default)));
        }
        Some(databases)
    }

    /// Available schemas of the selected database.
    pub async fn schemas(&self, state: &mut SelectionState, notices: &mut Notices) -> Vec<String> {
        if let Some(cached) = &state.available_schemas {
            return cached.clone();
        }
        let Some(database) = state.database.clone() else {
            return Vec::new();
        };

        match CatalogInspector::list_schemas(self.session, &database).await {
            Ok(schemas) => {
                state.available_schemas = Some(schemas.clone());
                schemas
            }
            Err(e) => {
                notices.error(format!("Error fetching schemas from {database}: {e}"));
                Vec::new()
            }
        }
    }

    /// Available base tables of the selected schemas.
    pub async fn tables(&self, state: &mut SelectionState, notices: &mut Notices) -> Vec<TableRef> {
        if let Some(cached) = &state.available_tables {
            return cached.clone();
        }
        let Some(database) = state.database.clone() else {
            return Vec::new();
        };
        if state.schemas.is_empty() {
            return Vec::new();
        }

        match CatalogInspector::list_tables(self.session, &database, &state.schemas).await {
            Ok(tables) => {
                state.available_tables = Some(tables.clone());
                tables
            }
            Err(e) => {
                notices.error(format!("Error fetching tables from {database}: {e}"));
                Vec::new()
            }
        }
    }

    /// Available columns of the selected tables.
    pub async fn columns(
        &self,
        state: &mut SelectionState,
        notices: &mut Notices,
    ) -> Vec<ColumnRef> {
        if let Some(cached) = &state.available_columns {
            return cached.clone();
        }
        let Some(database) = state.database.clone() else {
            return Vec::new();
        };
        if state.tables.is_empty() {
            return Vec::new();
        }

        let result = CatalogInspector::list_columns(
            self.session,
            &database,
            &state.tables,
            self.settings.column_types,
        )
        .await;
        match result {
            Ok(columns) => {
                state.available_columns = Some(columns.clone());
                columns
            }
            Err(e) => {
                notices.error(format!("Error fetching columns from {database}: {e}"));
                Vec::new()
            }
        }
    }

    /// Select a database. Unknown names leave the state untouched.
    pub async fn select_database(
        &self,
        state: &mut SelectionState,
        database: &str,
        notices: &mut Notices,
    ) {
        let database = database.trim();
        let databases = self.databases(notices).await;
        if !databases.iter().any(|d| d == database) {
            notices.warn(format!("Database '{database}' is not available"));
            return;
        }
        *state = apply_selection(state, SelectionChange::Database(Some(database.to_string())));
    }

    /// Select schemas of the current database.
    pub async fn select_schemas(
        &self,
        state: &mut SelectionState,
        requested: Vec<String>,
        notices: &mut Notices,
    ) {
        if state.database.is_none() {
            notices.warn("Please select a database first.");
            return;
        }
        let options = self.schemas(state, notices).await;
        let schemas = keep_known(requested, &options, |r, o| r == o, "schema", notices);
        *state = apply_selection(state, SelectionChange::Schemas(schemas));
    }

    /// Select tables of the current schemas.
    pub async fn select_tables(
        &self,
        state: &mut SelectionState,
        requested: Vec<TableRef>,
        notices: &mut Notices,
    ) {
        if state.schemas.is_empty() {
            notices.warn("Please select schemas first to enable table filtering");
            return;
        }
        let options = self.tables(state, notices).await;
        let tables = keep_known(requested, &options, |r, o| r == o, "table", notices);
        *state = apply_selection(state, SelectionChange::Tables(tables));
    }

    /// Select all offered columns or an explicit subset of them.
    pub async fn select_columns(
        &self,
        state: &mut SelectionState,
        all: bool,
        requested: Vec<ColumnKey>,
        notices: &mut Notices,
    ) {
        if state.tables.is_empty() {
            notices.warn("Please select tables first to choose columns");
            return;
        }
        let options = self.columns(state, notices).await;

        let selection = if all {
            ColumnSelection::All
        } else {
            let known = keep_known(requested, &options, |r, o| r.matches(o), "column", notices);
            // Resolve to the catalog entries so data types are carried along
            let columns = known
                .iter()
                .filter_map(|key| options.iter().find(|o| key.matches(o)).cloned())
                .collect();
            ColumnSelection::Explicit(columns)
        };
        *state = apply_selection(state, SelectionChange::Columns(selection));
    }

    /// Toggle whole-row wildcard search.
    pub async fn set_wildcard(
        &self,
        state: &mut SelectionState,
        enabled: bool,
        notices: &mut Notices,
    ) {
        *state = apply_selection(state, SelectionChange::Wildcard(enabled));
        if enabled {
            // Resolve "all columns" right away
            self.columns(state, notices).await;
        }
    }
}

/// Pick the configured default database if present, otherwise the first one.
pub fn default_database(databases: &[String], preferred: &str) -> Option<String> {
    databases
        .iter()
        .find(|d| d.as_str() == preferred)
        .or_else(|| databases.first())
        .cloned()
}

/// Keep requested entries found in `options`, dropping duplicates and
/// warning about unknown ones.
fn keep_known<R, O>(
    requested: Vec<R>,
    options: &[O],
    matches: impl Fn(&R, &O) -> bool,
    kind: &str,
    notices: &mut Notices,
) -> Vec<R>
where
    R: PartialEq + std::fmt::Display,
{
    let mut kept: Vec<R> = Vec::with_capacity(requested.len());
    let mut unknown = Vec::new();
    for item in requested {
        if kept.contains(&item) {
            continue;
        }
        if options.iter().any(|o| matches(&item, o)) {
            kept.push(item);
        } else {
            unknown.push(item.to_string());
        }
    }
    if !unknown.is_empty() {
        notices.warn(format!(
            "Ignoring unknown {kind}(s): {}",
            unknown.join(", ")
        ));
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_database_prefers_configured() {
        let dbs = vec!["ANALYTICS".to_string(), "SANDBOX".to_string()];
        assert_eq!(default_database(&dbs, "SANDBOX").as_deref(), Some("SANDBOX"));
        assert_eq!(default_database(&dbs, "PROD").as_deref(), Some("ANALYTICS"));
        assert_eq!(default_database(&[], "SANDBOX"), None);
    }

    #[test]
    fn test_keep_known_drops_unknown_and_duplicates() {
        let mut notices = Notices::new();
        let options = vec!["PUBLIC".to_string(), "SALES".to_string()];
        let kept = keep_known(
            vec![
                "SALES".to_string(),
                "MISSING".to_string(),
                "SALES".to_string(),
                "PUBLIC".to_string(),
            ],
            &options,
            |r, o| r == o,
            "schema",
            &mut notices,
        );
        assert_eq!(kept, vec!["SALES".to_string(), "PUBLIC".to_string()]);
        assert!(notices.has_problems());
        assert!(notices.iter().any(|n| n.message.contains("MISSING")));
    }

    #[test]
    fn test_column_key_matches_ignoring_type() {
        let key = ColumnKey {
            schema: "PUBLIC".to_string(),
            table: "CUSTOMERS".to_string(),
            name: "NAME".to_string(),
        };
        assert!(key.matches(&ColumnRef::new("PUBLIC", "CUSTOMERS", "NAME", "TEXT")));
        assert!(!key.matches(&ColumnRef::new("PUBLIC", "ORDERS", "NAME", "TEXT")));
    }
}
