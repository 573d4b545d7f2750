//! CSV export tests.

mod common;

use common::{scripted_session, service, service_with};
use rmcp::handler::server::wrapper::Parameters;
use snowflake_search_mcp::config::ExplorerSettings;
use snowflake_search_mcp::mcp::ExplorerService;
use snowflake_search_mcp::models::TableRef;
use snowflake_search_mcp::tools::{
    ExportInput, SearchInput, SelectColumnsInput, SelectSchemasInput, SelectTablesInput,
};

async fn search_smith(svc: &ExplorerService) {
    search_for(svc, "smith").await;
}

async fn search_for(svc: &ExplorerService, term: &str) {
    svc.list_databases().await;
    svc.select_schemas(Parameters(SelectSchemasInput {
        schemas: vec!["PUBLIC".to_string()],
    }))
    .await;
    svc.select_tables(Parameters(SelectTablesInput {
        tables: vec![
            TableRef::new("PUBLIC", "CUSTOMERS"),
            TableRef::new("PUBLIC", "ORDERS"),
        ],
    }))
    .await;
    svc.select_columns(Parameters(SelectColumnsInput {
        all: true,
        columns: vec![],
    }))
    .await;
    svc.search(Parameters(SearchInput {
        term: term.to_string(),
        ..Default::default()
    }))
    .await;
}

#[tokio::test]
async fn test_combined_export_uses_column_union() {
    let svc = service(scripted_session());
    search_smith(&svc).await;

    let out = svc
        .export_results(Parameters(ExportInput::default()))
        .await
        .unwrap()
        .0;

    assert!(out.file_name.starts_with("search_results_all_smith_"));
    assert!(out.file_name.ends_with(".csv"));
    assert_eq!(out.row_count, 3);
    assert!(out.path.is_none());

    let lines: Vec<&str> = out.csv.lines().collect();
    assert_eq!(
        lines[0],
        "SCHEMA_NAME,TABLE_NAME,NAME,EMAIL,NOTES,ORDER_ID,NOTE_01"
    );
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[3], "PUBLIC,ORDERS,,,,42,ship to smith");
}

#[tokio::test]
async fn test_single_table_export() {
    let svc = service(scripted_session());
    search_smith(&svc).await;

    let out = svc
        .export_results(Parameters(ExportInput {
            table: Some(TableRef::new("PUBLIC", "ORDERS")),
        }))
        .await
        .unwrap()
        .0;
    assert!(out.file_name.starts_with("search_results_PUBLIC_ORDERS_smith_"));
    assert_eq!(out.row_count, 1);
    assert_eq!(out.csv.lines().next(), Some("SCHEMA_NAME,TABLE_NAME,ORDER_ID,NOTE_01"));
}

#[tokio::test]
async fn test_export_of_table_without_results_fails() {
    let svc = service(scripted_session());
    search_smith(&svc).await;

    let err = svc
        .export_results(Parameters(ExportInput {
            table: Some(TableRef::new("SALES", "LEADS")),
        }))
        .await
        .err().expect("export should fail");
    assert!(err.message.contains("SALES.LEADS"));
}

#[tokio::test]
async fn test_export_is_written_to_configured_directory() {
    let dir = tempfile::tempdir().unwrap();
    let export_dir = dir.path().join("exports");
    let settings = ExplorerSettings {
        export_dir: Some(export_dir.clone()),
        ..Default::default()
    };
    let svc = service_with(scripted_session(), settings);
    search_smith(&svc).await;

    let out = svc
        .export_results(Parameters(ExportInput::default()))
        .await
        .unwrap()
        .0;

    let path = std::path::PathBuf::from(out.path.expect("export path"));
    assert_eq!(path.parent(), Some(export_dir.as_path()));
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, out.csv);
    assert_eq!(out.size_bytes, written.len() as u64);
    assert!(out.size_formatted.ends_with('B'));
}

#[tokio::test]
async fn test_export_with_reserved_characters_in_term() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ExplorerSettings {
        export_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let svc = service_with(scripted_session(), settings);
    search_for(&svc, "smith: \"vip\" <a|b>?*").await;

    let out = svc
        .export_results(Parameters(ExportInput::default()))
        .await
        .unwrap()
        .0;
    assert!(out.file_name.starts_with("search_results_all_smith_ _vip_ _a_b___"));
    let path = std::path::PathBuf::from(out.path.unwrap());
    assert_eq!(path.parent(), Some(dir.path()));
    assert!(path.exists());
}
