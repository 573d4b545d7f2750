//! Full-text search tool.
//!
//! This module implements the `search` MCP tool: it narrows the selected
//! columns to the requested scope, groups them by table, decides the
//! `SEARCH` predicate per table and runs one statement per table in order.
//!
//! # Failure semantics
//!
//! - Invalid input (blank term, empty selection or scope): warning, nothing executed
//! - A table whose statement fails: warning, table omitted, search continues
//! - Anything else (e.g. an identifier that cannot be rendered): error, empty results

use crate::config::ExplorerSettings;
use crate::db::{SqlSession, Statement, sql};
use crate::error::DbResult;
use crate::models::{
    ColumnRef, MAX_SEARCH_ROW_LIMIT, Notice, Notices, PredicateShape, SearchPlan, SearchResults,
    SearchScope, SelectionState, TableRef, TableResult, TableSearchPlan, WildcardReason,
};
use crate::tools::format::{ColumnInfo, OutputFormat, format_as_markdown, format_as_table};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Input for the search tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct SearchInput {
    /// Text to search for with Snowflake's SEARCH function
    pub term: String,
    /// Restrict the search to these selected schemas. Default: all selected schemas
    #[serde(default)]
    pub schemas: Option<Vec<String>>,
    /// Restrict the search to these selected tables. Default: all selected tables in scope
    #[serde(default)]
    pub tables: Option<Vec<TableRef>>,
    /// Maximum rows per table (default: server setting, max: 1000)
    #[serde(default)]
    pub limit: Option<u32>,
    /// Additional rendering of each table's rows: "json" (default), "table" or "markdown"
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output from the search tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SearchOutput {
    pub term: String,
    /// Total number of rows across all tables
    pub total_rows: usize,
    pub table_count: usize,
    pub tables: Vec<TableResult>,
    /// Per-table renderings when a non-JSON format was requested, keyed like `tables`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rendered: Vec<String>,
    pub execution_time_ms: u64,
    pub notices: Vec<Notice>,
}

impl SearchOutput {
    pub fn new(
        results: &SearchResults,
        format: OutputFormat,
        execution_time_ms: u64,
        notices: Notices,
    ) -> Self {
        let rendered = match format {
            OutputFormat::Json => Vec::new(),
            OutputFormat::Table | OutputFormat::Markdown => results
                .tables
                .iter()
                .map(|t| render_table(t, format, execution_time_ms))
                .collect(),
        };
        Self {
            term: results.term.clone(),
            total_rows: results.total_rows(),
            table_count: results.tables.len(),
            tables: results.tables.clone(),
            rendered,
            execution_time_ms,
            notices: notices.into_vec(),
        }
    }
}

fn render_table(table: &TableResult, format: OutputFormat, execution_time_ms: u64) -> String {
    let columns: Vec<ColumnInfo> = table.columns.iter().map(ColumnInfo::new).collect();
    let body = match format {
        OutputFormat::Markdown => format_as_markdown(&columns, &table.rows, table.row_count()),
        _ => format_as_table(&columns, &table.rows, table.row_count(), execution_time_ms),
    };
    format!("{}\n{}", table.table.key(), body)
}

// =============================================================================
// Planning
// =============================================================================

/// Keep the columns whose schema is scoped and whose table is scoped.
pub fn filter_scope(columns: &[ColumnRef], scope: &SearchScope) -> Vec<ColumnRef> {
    columns
        .iter()
        .filter(|c| scope.contains(c))
        .cloned()
        .collect()
}

/// Group columns by table, keeping first-seen table order and per-table column order.
pub fn group_by_table(columns: &[ColumnRef]) -> Vec<(TableRef, Vec<String>)> {
    let mut groups: Vec<(TableRef, Vec<String>)> = Vec::new();
    for column in columns {
        match groups.iter_mut().find(|(t, _)| column.belongs_to(t)) {
            Some((_, names)) => {
                if !names.contains(&column.name) {
                    names.push(column.name.clone());
                }
            }
            None => groups.push((column.table_ref(), vec![column.name.clone()])),
        }
    }
    groups
}

/// Decide how one table is searched.
///
/// A table is searched with a whole-row wildcard when forced or when it has
/// more than `threshold` selected columns.
pub fn choose_predicate(
    columns: &[String],
    force_wildcard: bool,
    threshold: usize,
) -> (PredicateShape, Option<WildcardReason>) {
    if force_wildcard {
        (PredicateShape::Wildcard, Some(WildcardReason::Forced))
    } else if columns.len() > threshold {
        (
            PredicateShape::Wildcard,
            Some(WildcardReason::ColumnCount {
                count: columns.len(),
            }),
        )
    } else {
        (
            PredicateShape::Columns {
                columns: columns.to_vec(),
            },
            None,
        )
    }
}

/// Resolve the requested scope against the selection, warning about dropped entries.
fn resolve_scope(state: &SelectionState, input: &SearchInput, notices: &mut Notices) -> SearchScope {
    let schemas = match &input.schemas {
        None => state.schemas.clone(),
        Some(requested) => {
            let (kept, dropped): (Vec<_>, Vec<_>) = requested
                .iter()
                .cloned()
                .partition(|s| state.schemas.contains(s));
            if !dropped.is_empty() {
                notices.warn(format!(
                    "Ignoring schema(s) outside the selection: {}",
                    dropped.join(", ")
                ));
            }
            dedup(kept)
        }
    };

    let in_schemas = |t: &TableRef| schemas.contains(&t.schema);
    let tables = match &input.tables {
        None => state.tables.iter().filter(|t| in_schemas(t)).cloned().collect(),
        Some(requested) => {
            let (kept, dropped): (Vec<_>, Vec<_>) = requested
                .iter()
                .cloned()
                .partition(|t| state.tables.contains(t) && in_schemas(t));
            if !dropped.is_empty() {
                let keys: Vec<String> = dropped.iter().map(TableRef::key).collect();
                notices.warn(format!(
                    "Ignoring table(s) outside the selection: {}",
                    keys.join(", ")
                ));
            }
            dedup(kept)
        }
    };

    SearchScope::new(schemas, tables)
}

fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Plans and executes searches over the selected columns.
pub struct SearchOrchestrator<'a> {
    session: &'a dyn SqlSession,
    settings: &'a ExplorerSettings,
}

impl<'a> SearchOrchestrator<'a> {
    pub fn new(session: &'a dyn SqlSession, settings: &'a ExplorerSettings) -> Self {
        Self { session, settings }
    }

    /// Validate the request and build a plan. `None` means the search was refused.
    pub fn plan(
        &self,
        state: &SelectionState,
        input: &SearchInput,
        notices: &mut Notices,
    ) -> Option<SearchPlan> {
        let term = input.term.trim();
        if term.is_empty() {
            notices.warn("Please enter a search string.");
            return None;
        }
        let Some(database) = state.database.clone() else {
            notices.warn("Please select a database first.");
            return None;
        };
        let selected = state.selected_columns();
        if selected.is_empty() {
            notices.warn("Please select at least one column to search in.");
            return None;
        }

        let scope = resolve_scope(state, input, notices);
        if scope.schemas.is_empty() {
            notices.warn("Please select at least one schema to search in.");
            return None;
        }
        if scope.tables.is_empty() {
            notices.warn("Please select at least one table to search in.");
            return None;
        }

        let filtered = filter_scope(&selected, &scope);
        if filtered.is_empty() {
            notices.warn(
                "No columns available for the selected search schemas and tables. \
                 Please adjust your filters.",
            );
            return None;
        }

        notices.info(format!(
            "Searching in {} schema(s): {}",
            scope.schemas.len(),
            scope.schemas.join(", ")
        ));
        let table_keys: Vec<String> = scope.tables.iter().map(TableRef::key).collect();
        notices.info(format!(
            "Searching {} table(s): {}",
            scope.tables.len(),
            table_keys.join(", ")
        ));
        notices.info(format!(
            "Searching across {} column(s) for: '{}'",
            filtered.len(),
            term
        ));

        let tables = group_by_table(&filtered)
            .into_iter()
            .map(|(table, columns)| {
                let (predicate, wildcard_reason) = choose_predicate(
                    &columns,
                    state.force_wildcard,
                    self.settings.wildcard_threshold,
                );
                match wildcard_reason {
                    Some(WildcardReason::Forced) => notices.info(format!(
                        "Using wildcard search for {} (user selected wildcard option)",
                        table.key()
                    )),
                    Some(WildcardReason::ColumnCount { count }) => notices.info(format!(
                        "Using wildcard search for {} ({} columns) - this searches all columns in the table",
                        table.key(),
                        count
                    )),
                    None => {}
                }
                TableSearchPlan {
                    table,
                    columns,
                    predicate,
                    wildcard_reason,
                }
            })
            .collect();

        let row_limit = input
            .limit
            .unwrap_or(self.settings.row_limit)
            .clamp(1, MAX_SEARCH_ROW_LIMIT);

        Some(SearchPlan {
            database,
            term: term.to_string(),
            row_limit,
            scope,
            tables,
        })
    }

    /// Execute a plan table by table.
    pub async fn execute(&self, plan: &SearchPlan, notices: &mut Notices) -> SearchResults {
        let statements = match build_statements(plan) {
            Ok(statements) => statements,
            Err(e) => {
                notices.error(format!("Error performing search: {e}"));
                return SearchResults::empty(&plan.term);
            }
        };

        let mut results = SearchResults::empty(&plan.term);
        for (table_plan, statement) in plan.tables.iter().zip(&statements) {
            let start = Instant::now();
            match self.session.execute(statement).await {
                Ok(rows) if rows.is_empty() => {
                    debug!(table = %table_plan.table, "No matches");
                }
                Ok(rows) => {
                    let row_count = rows.row_count();
                    debug!(
                        table = %table_plan.table,
                        rows = row_count,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Table searched"
                    );
                    results.tables.push(TableResult {
                        table: table_plan.table.clone(),
                        columns: rows.column_names(),
                        truncated: row_count >= plan.row_limit as usize,
                        rows: rows.rows,
                    });
                }
                Err(e) => {
                    notices.warn(format!("Error searching in {}: {e}", table_plan.table.key()));
                }
            }
        }

        let total = results.total_rows();
        if total > 0 {
            notices.info(format!(
                "Found {} result(s) containing '{}' across {} table(s)",
                total,
                plan.term,
                results.tables.len()
            ));
        } else {
            notices.info(format!(
                "No results found for '{}' in the selected schemas and tables.",
                plan.term
            ));
        }
        info!(
            term = %plan.term,
            tables = plan.tables.len(),
            columns = plan.column_count(),
            matched_tables = results.tables.len(),
            rows = total,
            "Search completed"
        );
        results
    }

    /// Plan and execute in one step.
    pub async fn search(
        &self,
        state: &SelectionState,
        input: &SearchInput,
        notices: &mut Notices,
    ) -> SearchResults {
        match self.plan(state, input, notices) {
            Some(plan) => self.execute(&plan, notices).await,
            None => SearchResults::empty(input.term.trim()),
        }
    }
}

/// Render every table statement up front so a bad identifier aborts the whole search.
fn build_statements(plan: &SearchPlan) -> DbResult<Vec<Statement>> {
    plan.tables
        .iter()
        .map(|t| sql::search_table(&plan.database, &t.table, &t.predicate, &plan.term, plan.row_limit))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(schema: &str, table: &str, name: &str) -> ColumnRef {
        ColumnRef::new(schema, table, name, "TEXT")
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("C{i}")).collect()
    }

    #[test]
    fn test_filter_scope_is_schema_and_table_subset() {
        let columns = vec![
            col("PUBLIC", "CUSTOMERS", "NAME"),
            col("PUBLIC", "ORDERS", "NOTE"),
            col("SALES", "LEADS", "EMAIL"),
        ];
        let scope = SearchScope::new(
            vec!["PUBLIC".to_string()],
            vec![
                TableRef::new("PUBLIC", "CUSTOMERS"),
                TableRef::new("SALES", "LEADS"),
            ],
        );
        assert_eq!(
            filter_scope(&columns, &scope),
            vec![col("PUBLIC", "CUSTOMERS", "NAME")]
        );
    }

    #[test]
    fn test_group_by_table_preserves_order() {
        let columns = vec![
            col("PUBLIC", "ORDERS", "NOTE"),
            col("PUBLIC", "CUSTOMERS", "NAME"),
            col("PUBLIC", "ORDERS", "STATUS"),
        ];
        let groups = group_by_table(&columns);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, TableRef::new("PUBLIC", "ORDERS"));
        assert_eq!(groups[0].1, vec!["NOTE", "STATUS"]);
        assert_eq!(groups[1].1, vec!["NAME"]);
        assert_eq!(group_by_table(&columns), groups);
    }

    #[test]
    fn test_choose_predicate_threshold() {
        let (shape, reason) = choose_predicate(&names(15), false, 15);
        assert!(!shape.is_wildcard());
        assert!(reason.is_none());

        let (shape, reason) = choose_predicate(&names(16), false, 15);
        assert!(shape.is_wildcard());
        assert_eq!(reason, Some(WildcardReason::ColumnCount { count: 16 }));
    }

    #[test]
    fn test_choose_predicate_forced() {
        let (shape, reason) = choose_predicate(&names(1), true, 15);
        assert!(shape.is_wildcard());
        assert_eq!(reason, Some(WildcardReason::Forced));
    }

    #[test]
    fn test_resolve_scope_drops_outside_entries() {
        let state = SelectionState {
            database: Some("SANDBOX".to_string()),
            schemas: vec!["PUBLIC".to_string()],
            tables: vec![TableRef::new("PUBLIC", "CUSTOMERS")],
            ..Default::default()
        };
        let input = SearchInput {
            term: "x".to_string(),
            schemas: Some(vec!["PUBLIC".to_string(), "OTHER".to_string()]),
            tables: Some(vec![
                TableRef::new("PUBLIC", "CUSTOMERS"),
                TableRef::new("PUBLIC", "ORDERS"),
            ]),
            ..Default::default()
        };
        let mut notices = Notices::new();
        let scope = resolve_scope(&state, &input, &mut notices);
        assert_eq!(scope.schemas, vec!["PUBLIC".to_string()]);
        assert_eq!(scope.tables, vec![TableRef::new("PUBLIC", "CUSTOMERS")]);
        assert_eq!(notices.iter().count(), 2);
    }

    #[test]
    fn test_default_scope_limits_tables_to_scoped_schemas() {
        let state = SelectionState {
            schemas: vec!["PUBLIC".to_string(), "SALES".to_string()],
            tables: vec![
                TableRef::new("PUBLIC", "CUSTOMERS"),
                TableRef::new("SALES", "LEADS"),
            ],
            ..Default::default()
        };
        let input = SearchInput {
            term: "x".to_string(),
            schemas: Some(vec!["SALES".to_string()]),
            ..Default::default()
        };
        let mut notices = Notices::new();
        let scope = resolve_scope(&state, &input, &mut notices);
        assert_eq!(scope.tables, vec![TableRef::new("SALES", "LEADS")]);
        assert!(notices.is_empty());
    }
}
