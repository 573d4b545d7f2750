//! CSV export of search results.
//!
//! This module implements the `export_results` MCP tool. The combined export
//! takes the union of all result columns in first-seen order; cells missing
//! from a table are left empty.

use crate::error::{DbError, DbResult};
use crate::models::{SearchResults, TableRef, TableResult};
use crate::tools::format::format_csv_cell;
use chrono::{DateTime, Local};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Input for the export_results tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ExportInput {
    /// Export a single table of the last search. Default: all tables combined
    #[serde(default)]
    pub table: Option<TableRef>,
}

/// Output from the export_results tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ExportOutput {
    pub file_name: String,
    /// CSV content with a header row
    pub csv: String,
    pub row_count: usize,
    pub size_bytes: u64,
    pub size_formatted: String,
    /// Where the file was written, when an export directory is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Build the export file name for the given target and time.
pub fn export_file_name(term: &str, table: Option<&TableRef>, at: DateTime<Local>) -> String {
    let stamp = at.format("%Y%m%d_%H%M%S");
    let term = sanitize(term);
    match table {
        Some(t) => format!(
            "search_results_{}_{}_{}_{}.csv",
            sanitize(&t.schema),
            sanitize(&t.name),
            term,
            stamp
        ),
        None => format!("search_results_all_{}_{}.csv", term, stamp),
    }
}

/// Replace path separators and characters Windows rejects in file names.
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .replace("..", "_")
}

/// Union of result columns in first-seen order.
pub fn union_columns(tables: &[&TableResult]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for table in tables {
        for column in &table.columns {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
    }
    columns
}

/// Encode tables as one CSV document.
pub fn to_csv(tables: &[&TableResult]) -> DbResult<String> {
    let columns = union_columns(tables);
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns).map_err(csv_error)?;

    for table in tables {
        for row in &table.rows {
            let record = columns.iter().map(|c| format_csv_cell(row.get(c)));
            writer.write_record(record).map_err(csv_error)?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DbError::internal(format!("Failed to finish CSV: {e}")))?;
    String::from_utf8(bytes).map_err(|e| DbError::internal(format!("CSV is not UTF-8: {e}")))
}

fn csv_error(err: csv::Error) -> DbError {
    DbError::internal(format!("Failed to write CSV: {err}"))
}

/// Build the export of the last search.
pub fn build_export(
    results: &SearchResults,
    table: Option<&TableRef>,
    at: DateTime<Local>,
) -> DbResult<ExportOutput> {
    if results.is_empty() {
        return Err(DbError::invalid_input(
            "No search results to export. Run a search with matches first.",
        ));
    }

    let tables: Vec<&TableResult> = match table {
        Some(t) => {
            let found = results.get(t).ok_or_else(|| {
                let available: Vec<String> = results.tables.iter().map(|r| r.table.key()).collect();
                DbError::table_not_found(
                    t.key(),
                    format!("Tables with results: {}", available.join(", ")),
                )
            })?;
            vec![found]
        }
        None => results.tables.iter().collect(),
    };

    let csv = to_csv(&tables)?;
    let size_bytes = csv.len() as u64;
    Ok(ExportOutput {
        file_name: export_file_name(&results.term, table, at),
        row_count: tables.iter().map(|t| t.row_count()).sum(),
        size_formatted: humansize::format_size(size_bytes, humansize::WINDOWS),
        size_bytes,
        csv,
        path: None,
    })
}

/// Write an export into `dir`, creating it if needed.
pub async fn write_export(dir: &Path, export: &ExportOutput) -> DbResult<PathBuf> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        DbError::internal(format!(
            "Failed to create export directory {}: {e}",
            dir.display()
        ))
    })?;

    let path = dir.join(&export.file_name);
    tokio::fs::write(&path, export.csv.as_bytes())
        .await
        .map_err(|e| DbError::internal(format!("Failed to write {}: {e}", path.display())))?;

    info!(path = %path.display(), size = %export.size_formatted, "Exported search results");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::Value as JsonValue;

    fn result(table: &str, columns: &[&str], rows: &[&[&str]]) -> TableResult {
        TableResult {
            table: TableRef::new("PUBLIC", table),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| {
                    columns
                        .iter()
                        .zip(r.iter())
                        .map(|(c, v)| (c.to_string(), JsonValue::from(*v)))
                        .collect()
                })
                .collect(),
            truncated: false,
        }
    }

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            export_file_name("smith", None, at()),
            "search_results_all_smith_20240309_140507.csv"
        );
        let table = TableRef::new("PUBLIC", "ORDERS");
        assert_eq!(
            export_file_name("smith", Some(&table), at()),
            "search_results_PUBLIC_ORDERS_smith_20240309_140507.csv"
        );
    }

    #[test]
    fn test_file_name_strips_path_separators() {
        let name = export_file_name("../etc/passwd", None, at());
        assert!(!name.contains('/'));
        assert!(!name.contains(".."));
    }

    #[test]
    fn test_file_name_is_portable() {
        let name = export_file_name("a:b*c?\"d\"<e>|f\tg", None, at());
        assert_eq!(name, "search_results_all_a_b_c__d__e__f_g_20240309_140507.csv");
        for c in [':', '*', '?', '"', '<', '>', '|', '\t'] {
            assert!(!name.contains(c));
        }
    }

    #[test]
    fn test_combined_csv_uses_column_union() {
        let a = result("CUSTOMERS", &["SCHEMA_NAME", "TABLE_NAME", "NAME"], &[&["PUBLIC", "CUSTOMERS", "Smith"]]);
        let b = result("ORDERS", &["SCHEMA_NAME", "TABLE_NAME", "NOTE"], &[&["PUBLIC", "ORDERS", "for smith, urgent"]]);
        let csv = to_csv(&[&a, &b]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "SCHEMA_NAME,TABLE_NAME,NAME,NOTE");
        assert_eq!(lines[1], "PUBLIC,CUSTOMERS,Smith,");
        assert_eq!(lines[2], "PUBLIC,ORDERS,,\"for smith, urgent\"");
    }

    #[test]
    fn test_build_export_single_table_and_missing_table() {
        let results = SearchResults {
            term: "smith".to_string(),
            tables: vec![result("CUSTOMERS", &["NAME"], &[&["Smith"], &["Smithers"]])],
        };
        let export = build_export(&results, Some(&TableRef::new("PUBLIC", "CUSTOMERS")), at()).unwrap();
        assert_eq!(export.row_count, 2);
        assert_eq!(export.size_bytes, export.csv.len() as u64);

        let err = build_export(&results, Some(&TableRef::new("PUBLIC", "ORDERS")), at()).unwrap_err();
        assert!(matches!(err, DbError::TableNotFound { .. }));
    }

    #[test]
    fn test_build_export_requires_results() {
        let err = build_export(&SearchResults::empty("x"), None, at()).unwrap_err();
        assert!(matches!(err, DbError::InvalidInput { .. }));
    }
}
