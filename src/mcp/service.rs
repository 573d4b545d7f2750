//! MCP service implementation using rmcp.
//!
//! This module defines the ExplorerService struct with all catalog and search
//! tools exposed via the MCP protocol using the rmcp framework's macros.
//! Each tool call is one user interaction against the session's selection.

use crate::config::ExplorerSettings;
use crate::db::SqlSession;
use crate::models::{ColumnSelection, Notices, SearchResults, SelectionState};
use crate::tools::export::{self, ExportInput, ExportOutput};
use crate::tools::navigator::{
    CatalogNavigator, ListColumnsOutput, ListDatabasesOutput, ListSchemasOutput,
    ListTablesOutput, SelectColumnsInput, SelectDatabaseInput, SelectSchemasInput,
    SelectTablesInput, SelectionOutput, SetWildcardInput,
};
use crate::tools::search::{SearchInput, SearchOrchestrator, SearchOutput};
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::debug;

/// Per-session state: the selection and the results of the last search.
#[derive(Debug, Default)]
pub struct ExplorerState {
    pub selection: SelectionState,
    pub last_search: Option<SearchResults>,
}

#[derive(Clone)]
pub struct ExplorerService {
    /// Shared Snowflake session
    session: Arc<dyn SqlSession>,
    settings: Arc<ExplorerSettings>,
    /// Held for the whole of each interaction, so requests run one at a time
    state: Arc<Mutex<ExplorerState>>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl ExplorerService {
    /// Create a new ExplorerService with a fresh selection.
    pub fn new(session: Arc<dyn SqlSession>, settings: Arc<ExplorerSettings>) -> Self {
        Self {
            session,
            settings,
            state: Arc::new(Mutex::new(ExplorerState::default())),
            tool_router: Self::tool_router(),
        }
    }

    fn navigator(&self) -> CatalogNavigator<'_> {
        CatalogNavigator::new(self.session.as_ref(), &self.settings)
    }

    /// Snapshot of the current selection.
    pub async fn selection(&self) -> SelectionState {
        self.state.lock().await.selection.clone()
    }
}

#[tool_router]
impl ExplorerService {
    #[tool(
        description = "List all databases visible to the configured role.\nIf no database is selected yet, SANDBOX (or the configured default) is selected when present, otherwise the first database."
    )]
    pub async fn list_databases(&self) -> Json<ListDatabasesOutput> {
        let mut state = self.state.lock().await;
        let mut notices = Notices::new();
        let navigator = self.navigator();

        let databases = match navigator
            .ensure_database(&mut state.selection, &mut notices)
            .await
        {
            Some(databases) => databases,
            None => navigator.databases(&mut notices).await,
        };

        Json(ListDatabasesOutput {
            databases,
            selected: state.selection.database.clone(),
            notices: notices.into_vec(),
        })
    }

    #[tool(
        description = "Select the database to browse.\nClears the schema, table and column selections when the database changes."
    )]
    pub async fn select_database(
        &self,
        Parameters(input): Parameters<SelectDatabaseInput>,
    ) -> Json<SelectionOutput> {
        let mut state = self.state.lock().await;
        let mut notices = Notices::new();
        self.navigator()
            .select_database(&mut state.selection, &input.database, &mut notices)
            .await;
        Json(SelectionOutput::new(&state.selection, notices))
    }

    #[tool(
        description = "List the schemas of the selected database (INFORMATION_SCHEMA excluded), ordered by name."
    )]
    pub async fn list_schemas(&self) -> Json<ListSchemasOutput> {
        let mut state = self.state.lock().await;
        let mut notices = Notices::new();
        let navigator = self.navigator();
        navigator
            .ensure_database(&mut state.selection, &mut notices)
            .await;
        let schemas = navigator.schemas(&mut state.selection, &mut notices).await;

        Json(ListSchemasOutput {
            database: state.selection.database.clone(),
            schemas,
            selected: state.selection.schemas.clone(),
            notices: notices.into_vec(),
        })
    }

    #[tool(
        description = "Select schemas of the current database. Unknown schemas are ignored with a warning.\nClears the table and column selections when the schemas change."
    )]
    pub async fn select_schemas(
        &self,
        Parameters(input): Parameters<SelectSchemasInput>,
    ) -> Json<SelectionOutput> {
        let mut state = self.state.lock().await;
        let mut notices = Notices::new();
        let navigator = self.navigator();
        navigator
            .ensure_database(&mut state.selection, &mut notices)
            .await;
        navigator
            .select_schemas(&mut state.selection, input.schemas, &mut notices)
            .await;
        Json(SelectionOutput::new(&state.selection, notices))
    }

    #[tool(
        description = "List the base tables of the selected schemas, ordered by schema and table name."
    )]
    pub async fn list_tables(&self) -> Json<ListTablesOutput> {
        let mut state = self.state.lock().await;
        let mut notices = Notices::new();
        if state.selection.schemas.is_empty() {
            notices.info("Please select schemas first to enable table filtering");
        }
        let tables = self
            .navigator()
            .tables(&mut state.selection, &mut notices)
            .await;

        Json(ListTablesOutput {
            count: tables.len(),
            tables,
            selected: state.selection.tables.clone(),
            notices: notices.into_vec(),
        })
    }

    #[tool(
        description = "Select tables from list_tables. Unknown tables are ignored with a warning.\nClears the column selection when the tables change."
    )]
    pub async fn select_tables(
        &self,
        Parameters(input): Parameters<SelectTablesInput>,
    ) -> Json<SelectionOutput> {
        let mut state = self.state.lock().await;
        let mut notices = Notices::new();
        self.navigator()
            .select_tables(&mut state.selection, input.tables, &mut notices)
            .await;
        Json(SelectionOutput::new(&state.selection, notices))
    }

    #[tool(
        description = "List the searchable columns of the selected tables, ordered by table and ordinal position.\nBy default only VARCHAR, VARIANT, ARRAY, TEXT and OBJECT columns are offered."
    )]
    pub async fn list_columns(&self) -> Json<ListColumnsOutput> {
        let mut state = self.state.lock().await;
        let mut notices = Notices::new();
        if state.selection.tables.is_empty() {
            notices.info("Please select tables first to choose columns");
        }
        let columns = self
            .navigator()
            .columns(&mut state.selection, &mut notices)
            .await;

        Json(ListColumnsOutput {
            count: columns.len(),
            columns,
            selected: state.selection.columns.clone(),
            notices: notices.into_vec(),
        })
    }

    #[tool(
        description = "Select the columns to search: either `all: true` or an explicit list of {schema, table, name} from list_columns."
    )]
    pub async fn select_columns(
        &self,
        Parameters(input): Parameters<SelectColumnsInput>,
    ) -> Json<SelectionOutput> {
        let mut state = self.state.lock().await;
        let mut notices = Notices::new();
        self.navigator()
            .select_columns(&mut state.selection, input.all, input.columns, &mut notices)
            .await;
        Json(SelectionOutput::new(&state.selection, notices))
    }

    #[tool(
        description = "Force whole-row wildcard search for every table.\nEnabling selects all columns; disabling clears the column selection."
    )]
    pub async fn set_wildcard(
        &self,
        Parameters(input): Parameters<SetWildcardInput>,
    ) -> Json<SelectionOutput> {
        let mut state = self.state.lock().await;
        let mut notices = Notices::new();
        self.navigator()
            .set_wildcard(&mut state.selection, input.enabled, &mut notices)
            .await;
        Json(SelectionOutput::new(&state.selection, notices))
    }

    #[tool(description = "Show the current database, schema, table and column selection.")]
    pub async fn get_selection(&self) -> Json<SelectionOutput> {
        let mut state = self.state.lock().await;
        let mut notices = Notices::new();
        if state.selection.columns == ColumnSelection::All {
            self.navigator()
                .columns(&mut state.selection, &mut notices)
                .await;
        }
        Json(SelectionOutput::new(&state.selection, notices))
    }

    #[tool(
        description = "Search the selected columns for a term using Snowflake's SEARCH function.\nOptionally restrict to a subset of the selected schemas/tables.\nTables with more than 15 selected columns, or all tables when wildcard is on, are searched across the whole row.\nReturns rows per table, each prefixed with SCHEMA_NAME and TABLE_NAME.\nOutput format: json (default), table, or markdown."
    )]
    pub async fn search(&self, Parameters(input): Parameters<SearchInput>) -> Json<SearchOutput> {
        let start = Instant::now();
        let mut state = self.state.lock().await;
        let mut notices = Notices::new();

        if state.selection.columns == ColumnSelection::All {
            self.navigator()
                .columns(&mut state.selection, &mut notices)
                .await;
        }

        let orchestrator = SearchOrchestrator::new(self.session.as_ref(), &self.settings);
        let results = orchestrator
            .search(&state.selection, &input, &mut notices)
            .await;

        let output = SearchOutput::new(
            &results,
            input.format,
            start.elapsed().as_millis() as u64,
            notices,
        );
        state.last_search = Some(results);
        Json(output)
    }

    #[tool(
        description = "Export the last search as CSV, either all tables combined (union of columns) or one table.\nReturns the file name, CSV text, row count and size. The file is also written when the server has an export directory."
    )]
    pub async fn export_results(
        &self,
        Parameters(input): Parameters<ExportInput>,
    ) -> Result<Json<ExportOutput>, McpError> {
        let state = self.state.lock().await;
        let results = state.last_search.as_ref().ok_or_else(|| {
            McpError::from(crate::error::DbError::invalid_input(
                "No search has been run yet. Call search first.",
            ))
        })?;

        let mut output = export::build_export(results, input.table.as_ref(), chrono::Local::now())?;
        if let Some(dir) = &self.settings.export_dir {
            let path = export::write_export(dir, &output).await?;
            output.path = Some(path.display().to_string());
        }
        debug!(file = %output.file_name, rows = output.row_count, "Export built");
        Ok(Json(output))
    }
}

#[tool_handler]
impl ServerHandler for ExplorerService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "snowflake-search-mcp".to_owned(),
                title: Some("Snowflake Search MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Browse a Snowflake catalog and full-text search selected columns.\n\
                \n\
                ## Workflow\n\
                1. `list_databases` (selects SANDBOX by default) or `select_database`\n\
                2. `list_schemas`, then `select_schemas`\n\
                3. `list_tables`, then `select_tables`\n\
                4. `list_columns`, then `select_columns` (or `set_wildcard` to search whole rows)\n\
                5. `search` with a term, optionally narrowing `schemas` / `tables`\n\
                6. `export_results` to get CSV of all tables or a single table\n\
                \n\
                ## Cascading selection\n\
                Changing a selection clears everything below it: a new database clears schemas,\n\
                tables and columns; new schemas clear tables and columns; new tables clear columns.\n\
                \n\
                ## Notices\n\
                Every tool returns `notices`. Warnings explain why nothing was searched (e.g. no\n\
                columns selected) or which table failed; errors report failed catalog queries."
                    .to_string(),
            ),
        }
    }
}
