//! Scripted in-memory session.
//!
//! Only compiled for tests or with the `test-util` feature.
//!
//! Responses are matched by SQL substring in registration order; the first
//! rule whose pattern occurs in the statement wins. Every executed statement
//! is recorded so callers can assert on what was sent.

use crate::db::session::{SqlSession, Statement};
use crate::db::types::{ColumnMetadata, RowSet};
use crate::error::{DbError, DbResult};
use futures_util::future::BoxFuture;
use serde_json::Value as JsonValue;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Reply {
    Rows(RowSet),
    Fail(DbError),
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    reply: Reply,
}

/// [`SqlSession`] answering from a fixed script.
#[derive(Debug, Default)]
pub struct MemorySession {
    rules: Mutex<Vec<Rule>>,
    executed: Mutex<Vec<Statement>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer statements containing `pattern` with `rows`.
    pub fn on(&self, pattern: impl Into<String>, rows: RowSet) -> &Self {
        self.push(pattern.into(), Reply::Rows(rows));
        self
    }

    /// Fail statements containing `pattern` with `error`.
    pub fn fail(&self, pattern: impl Into<String>, error: DbError) -> &Self {
        self.push(pattern.into(), Reply::Fail(error));
        self
    }

    fn push(&self, pattern: String, reply: Reply) {
        if let Ok(mut rules) = self.rules.lock() {
            rules.push(Rule { pattern, reply });
        }
    }

    /// Statements executed so far, in order.
    pub fn executed(&self) -> Vec<Statement> {
        self.executed
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    /// Number of executed statements whose SQL contains `pattern`.
    pub fn count(&self, pattern: &str) -> usize {
        self.executed()
            .iter()
            .filter(|s| s.sql.contains(pattern))
            .count()
    }

    fn reply(&self, statement: &Statement) -> DbResult<RowSet> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(statement.clone());
        }

        let rules = self
            .rules
            .lock()
            .map_err(|_| DbError::internal("Memory session lock poisoned"))?;
        match rules.iter().find(|r| statement.sql.contains(&r.pattern)) {
            Some(Rule {
                reply: Reply::Rows(rows),
                ..
            }) => Ok(rows.clone()),
            Some(Rule {
                reply: Reply::Fail(err),
                ..
            }) => Err(err.clone()),
            None => Ok(RowSet::default()),
        }
    }
}

impl SqlSession for MemorySession {
    fn execute<'a>(&'a self, statement: &'a Statement) -> BoxFuture<'a, DbResult<RowSet>> {
        Box::pin(async move { self.reply(statement) })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Build a text-typed row set from string literals.
pub fn text_rows(columns: &[&str], rows: &[&[&str]]) -> RowSet {
    let metadata = columns
        .iter()
        .map(|c| ColumnMetadata::new(*c, "text", true))
        .collect();
    let values = rows
        .iter()
        .map(|row| row.iter().map(|v| JsonValue::from(*v)).collect())
        .collect();
    RowSet::from_values(metadata, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_matching_rule_wins() {
        let session = MemorySession::new();
        session
            .on("SCHEMATA", text_rows(&["SCHEMA_NAME"], &[&["PUBLIC"]]))
            .fail("SCHEMA", DbError::internal("boom"));

        let rows = session
            .execute(&Statement::new("SELECT * FROM X.INFORMATION_SCHEMA.SCHEMATA"))
            .await
            .unwrap();
        assert_eq!(rows.row_count(), 1);

        let err = session
            .execute(&Statement::new("SELECT SCHEMA"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Internal { .. }));
        assert_eq!(session.executed().len(), 2);
    }

    #[tokio::test]
    async fn test_unmatched_statement_returns_empty() {
        let session = MemorySession::new();
        let rows = session.execute(&Statement::new("SELECT 1")).await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(session.count("SELECT 1"), 1);
    }
}
