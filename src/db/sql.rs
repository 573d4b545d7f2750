//! SQL statement builders.
//!
//! Every identifier discovered from the catalog is rendered as a quoted
//! identifier through `sqlparser`'s AST, and every value (schema names in
//! filters, the search term) travels as a bind parameter. No user-supplied
//! text is ever spliced into SQL.

use crate::db::session::Statement;
use crate::error::{DbError, DbResult};
use crate::models::{BASE_TABLE, INFORMATION_SCHEMA, PredicateShape, TableRef};
use sqlparser::ast::Ident;

/// Render a double-quoted identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> DbResult<String> {
    if name.is_empty() {
        return Err(DbError::schema("Identifier is empty", name));
    }
    if name.contains('\0') {
        return Err(DbError::schema("Identifier contains a NUL character", name));
    }
    Ok(Ident::with_quote('"', name).to_string())
}

/// Render a dotted, fully quoted object name.
pub fn qualified_name(parts: &[&str]) -> DbResult<String> {
    let quoted = parts
        .iter()
        .map(|p| quote_ident(p))
        .collect::<DbResult<Vec<_>>>()?;
    Ok(quoted.join("."))
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// List all databases visible to the current role.
pub fn show_databases() -> Statement {
    Statement::new("SHOW DATABASES")
}

/// List the schemas of a database, excluding `INFORMATION_SCHEMA`.
pub fn list_schemas(database: &str) -> DbResult<Statement> {
    let sql = format!(
        "SELECT SCHEMA_NAME \
         FROM {}.INFORMATION_SCHEMA.SCHEMATA \
         WHERE SCHEMA_NAME <> ? \
         ORDER BY SCHEMA_NAME",
        quote_ident(database)?
    );
    Ok(Statement::new(sql).bind(INFORMATION_SCHEMA))
}

/// List the base tables of the given schemas.
pub fn list_tables(database: &str, schemas: &[String]) -> DbResult<Statement> {
    if schemas.is_empty() {
        return Err(DbError::invalid_input("At least one schema is required"));
    }

    let sql = format!(
        "SELECT DISTINCT TABLE_SCHEMA, TABLE_NAME \
         FROM {}.INFORMATION_SCHEMA.TABLES \
         WHERE TABLE_SCHEMA IN ({}) \
         AND TABLE_TYPE = ? \
         ORDER BY TABLE_SCHEMA, TABLE_NAME",
        quote_ident(database)?,
        placeholders(schemas.len())
    );

    let stmt = schemas
        .iter()
        .fold(Statement::new(sql), |stmt, schema| stmt.bind(schema.as_str()));
    Ok(stmt.bind(BASE_TABLE))
}

/// List the columns of the given tables, optionally restricted to some data types.
pub fn list_columns(
    database: &str,
    tables: &[TableRef],
    allowed_types: Option<&[&str]>,
) -> DbResult<Statement> {
    if tables.is_empty() {
        return Err(DbError::invalid_input("At least one table is required"));
    }

    let table_conditions = vec!["(TABLE_SCHEMA = ? AND TABLE_NAME = ?)"; tables.len()].join(" OR ");
    let type_filter = match allowed_types {
        Some(types) if !types.is_empty() => {
            format!(" AND DATA_TYPE IN ({})", placeholders(types.len()))
        }
        _ => String::new(),
    };

    let sql = format!(
        "SELECT TABLE_SCHEMA, TABLE_NAME, COLUMN_NAME, DATA_TYPE \
         FROM {}.INFORMATION_SCHEMA.COLUMNS \
         WHERE ({}){} \
         ORDER BY TABLE_SCHEMA, TABLE_NAME, ORDINAL_POSITION",
        quote_ident(database)?,
        table_conditions,
        type_filter
    );

    let mut stmt = Statement::new(sql);
    for table in tables {
        stmt = stmt.bind(table.schema.as_str()).bind(table.name.as_str());
    }
    for data_type in allowed_types.unwrap_or_default() {
        stmt = stmt.bind(*data_type);
    }
    Ok(stmt)
}

/// Render the argument list matched by `SEARCH`.
pub fn search_predicate(table: &TableRef, shape: &PredicateShape) -> DbResult<String> {
    match shape {
        PredicateShape::Wildcard => Ok(format!("{}.*", quote_ident(&table.name)?)),
        PredicateShape::Columns { columns } => {
            if columns.is_empty() {
                return Err(DbError::invalid_input(format!(
                    "No columns to search in {}",
                    table
                )));
            }
            let quoted = columns
                .iter()
                .map(|c| quote_ident(c))
                .collect::<DbResult<Vec<_>>>()?;
            Ok(quoted.join(", "))
        }
    }
}

/// Full-text search of one table.
///
/// Every row is prefixed with the schema and table it came from.
pub fn search_table(
    database: &str,
    table: &TableRef,
    shape: &PredicateShape,
    term: &str,
    row_limit: u32,
) -> DbResult<Statement> {
    let sql = format!(
        "SELECT ? AS SCHEMA_NAME, ? AS TABLE_NAME, * \
         FROM {} \
         WHERE SEARCH(({}), ?) \
         LIMIT {}",
        qualified_name(&[database, &table.schema, &table.name])?,
        search_predicate(table, shape)?,
        row_limit
    );

    Ok(Statement::new(sql)
        .bind(table.schema.as_str())
        .bind(table.name.as_str())
        .bind(term))
}
