//! Catalog introspection.
//!
//! Reads databases, schemas, tables and columns through a [`SqlSession`].
//! Rows missing an expected field are skipped rather than failing the listing.

use crate::db::session::SqlSession;
use crate::db::sql;
use crate::db::types::{RowSet, row_str};
use crate::error::DbResult;
use crate::models::{ColumnRef, ColumnTypePolicy, TableRef};
use tracing::debug;

/// Catalog inspector for Snowflake `INFORMATION_SCHEMA` views.
pub struct CatalogInspector;

impl CatalogInspector {
    /// List all databases visible to the current role.
    pub async fn list_databases(session: &dyn SqlSession) -> DbResult<Vec<String>> {
        let rows = session.execute(&sql::show_databases()).await?;
        let databases = strings(&rows, "name");
        debug!(count = databases.len(), "Listed databases");
        Ok(databases)
    }

    /// List the schemas of a database, excluding `INFORMATION_SCHEMA`.
    pub async fn list_schemas(session: &dyn SqlSession, database: &str) -> DbResult<Vec<String>> {
        let rows = session.execute(&sql::list_schemas(database)?).await?;
        let schemas = strings(&rows, "SCHEMA_NAME");
        debug!(database, count = schemas.len(), "Listed schemas");
        Ok(schemas)
    }

    /// List the base tables of the given schemas.
    pub async fn list_tables(
        session: &dyn SqlSession,
        database: &str,
        schemas: &[String],
    ) -> DbResult<Vec<TableRef>> {
        if schemas.is_empty() {
            return Ok(Vec::new());
        }

        let rows = session
            .execute(&sql::list_tables(database, schemas)?)
            .await?;
        let tables: Vec<TableRef> = rows
            .rows
            .iter()
            .filter_map(|row| {
                Some(TableRef::new(
                    row_str(row, "TABLE_SCHEMA")?,
                    row_str(row, "TABLE_NAME")?,
                ))
            })
            .collect();
        debug!(database, count = tables.len(), "Listed tables");
        Ok(tables)
    }

    /// List the searchable columns of the given tables.
    pub async fn list_columns(
        session: &dyn SqlSession,
        database: &str,
        tables: &[TableRef],
        policy: ColumnTypePolicy,
    ) -> DbResult<Vec<ColumnRef>> {
        if tables.is_empty() {
            return Ok(Vec::new());
        }

        let stmt = sql::list_columns(database, tables, policy.allowed_types())?;
        let rows = session.execute(&stmt).await?;
        let columns: Vec<ColumnRef> = rows
            .rows
            .iter()
            .filter_map(|row| {
                Some(ColumnRef::new(
                    row_str(row, "TABLE_SCHEMA")?,
                    row_str(row, "TABLE_NAME")?,
                    row_str(row, "COLUMN_NAME")?,
                    row_str(row, "DATA_TYPE").unwrap_or_default(),
                ))
            })
            .collect();
        debug!(database, count = columns.len(), %policy, "Listed columns");
        Ok(columns)
    }
}

fn strings(rows: &RowSet, column: &str) -> Vec<String> {
    rows.rows
        .iter()
        .filter_map(|row| row_str(row, column))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{MemorySession, text_rows};

    #[tokio::test]
    async fn test_list_databases_reads_lowercase_name() {
        let session = MemorySession::new();
        session.on(
            "SHOW DATABASES",
            text_rows(&["created_on", "name"], &[&["x", "ANALYTICS"], &["x", "SANDBOX"]]),
        );
        let dbs = CatalogInspector::list_databases(&session).await.unwrap();
        assert_eq!(dbs, vec!["ANALYTICS", "SANDBOX"]);
    }

    #[tokio::test]
    async fn test_list_tables_skips_query_for_no_schemas() {
        let session = MemorySession::new();
        let tables = CatalogInspector::list_tables(&session, "SANDBOX", &[])
            .await
            .unwrap();
        assert!(tables.is_empty());
        assert!(session.executed().is_empty());
    }

    #[tokio::test]
    async fn test_list_columns_maps_rows() {
        let session = MemorySession::new();
        session.on(
            "INFORMATION_SCHEMA.COLUMNS",
            text_rows(
                &["TABLE_SCHEMA", "TABLE_NAME", "COLUMN_NAME", "DATA_TYPE"],
                &[&["PUBLIC", "CUSTOMERS", "NAME", "TEXT"]],
            ),
        );
        let cols = CatalogInspector::list_columns(
            &session,
            "SANDBOX",
            &[TableRef::new("PUBLIC", "CUSTOMERS")],
            ColumnTypePolicy::TextOnly,
        )
        .await
        .unwrap();
        assert_eq!(cols, vec![ColumnRef::new("PUBLIC", "CUSTOMERS", "NAME", "TEXT")]);
        assert!(session.executed()[0].sql.contains("DATA_TYPE IN"));
    }
}
