//! Shared fixtures for integration tests.
//!
//! The catalog is a `SANDBOX` database with two schemas:
//! - `PUBLIC.CUSTOMERS` (3 text columns) and `PUBLIC.ORDERS` (20 text columns)
//! - `SALES.LEADS` (2 text columns)

#![allow(dead_code)]

use snowflake_search_mcp::config::ExplorerSettings;
use snowflake_search_mcp::db::memory::text_rows;
use snowflake_search_mcp::db::MemorySession;
use snowflake_search_mcp::mcp::ExplorerService;
use std::sync::Arc;

pub const CUSTOMERS_SQL: &str = r#"FROM "SANDBOX"."PUBLIC"."CUSTOMERS""#;
pub const ORDERS_SQL: &str = r#"FROM "SANDBOX"."PUBLIC"."ORDERS""#;
pub const LEADS_SQL: &str = r#"FROM "SANDBOX"."SALES"."LEADS""#;

pub fn order_columns() -> Vec<String> {
    (1..=20).map(|i| format!("NOTE_{i:02}")).collect()
}

/// Register the catalog queries.
pub fn catalog(session: &MemorySession) {
    session.on(
        "SHOW DATABASES",
        text_rows(&["created_on", "name"], &[&["2024-01-01", "ANALYTICS"], &["2024-01-01", "SANDBOX"]]),
    );
    session.on(
        "INFORMATION_SCHEMA.SCHEMATA",
        text_rows(&["SCHEMA_NAME"], &[&["PUBLIC"], &["SALES"]]),
    );
    session.on(
        "INFORMATION_SCHEMA.TABLES",
        text_rows(
            &["TABLE_SCHEMA", "TABLE_NAME"],
            &[&["PUBLIC", "CUSTOMERS"], &["PUBLIC", "ORDERS"], &["SALES", "LEADS"]],
        ),
    );

    let mut columns: Vec<[String; 4]> = ["NAME", "EMAIL", "NOTES"]
        .iter()
        .map(|c| ["PUBLIC".into(), "CUSTOMERS".into(), c.to_string(), "TEXT".into()])
        .collect();
    columns.extend(
        order_columns()
            .into_iter()
            .map(|c| ["PUBLIC".into(), "ORDERS".into(), c, "TEXT".into()]),
    );
    columns.extend(
        ["COMPANY", "CONTACT"]
            .iter()
            .map(|c| ["SALES".into(), "LEADS".into(), c.to_string(), "VARCHAR".into()]),
    );
    let rows: Vec<Vec<&str>> = columns
        .iter()
        .map(|c| c.iter().map(String::as_str).collect())
        .collect();
    let rows: Vec<&[&str]> = rows.iter().map(Vec::as_slice).collect();
    session.on(
        "INFORMATION_SCHEMA.COLUMNS",
        text_rows(&["TABLE_SCHEMA", "TABLE_NAME", "COLUMN_NAME", "DATA_TYPE"], &rows),
    );
}

/// Register search results for CUSTOMERS (2 rows) and ORDERS (1 row); LEADS finds nothing.
pub fn search_hits(session: &MemorySession) {
    session.on(
        CUSTOMERS_SQL,
        text_rows(
            &["SCHEMA_NAME", "TABLE_NAME", "NAME", "EMAIL", "NOTES"],
            &[
                &["PUBLIC", "CUSTOMERS", "John Smith", "john@example.com", ""],
                &["PUBLIC", "CUSTOMERS", "Ann Smithers", "ann@example.com", "vip"],
            ],
        ),
    );
    session.on(
        ORDERS_SQL,
        text_rows(
            &["SCHEMA_NAME", "TABLE_NAME", "ORDER_ID", "NOTE_01"],
            &[&["PUBLIC", "ORDERS", "42", "ship to smith"]],
        ),
    );
}

pub fn scripted_session() -> Arc<MemorySession> {
    let session = Arc::new(MemorySession::new());
    search_hits(&session);
    catalog(&session);
    session
}

pub fn service_with(session: Arc<MemorySession>, settings: ExplorerSettings) -> ExplorerService {
    ExplorerService::new(session, Arc::new(settings))
}

pub fn service(session: Arc<MemorySession>) -> ExplorerService {
    service_with(session, ExplorerSettings::default())
}
