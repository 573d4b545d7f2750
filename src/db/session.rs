//! Database session abstraction.
//!
//! Everything above this module talks to Snowflake through [`SqlSession`]:
//! one statement in, one row set out. The production implementation is
//! [`SnowflakeClient`](crate::db::SnowflakeClient); tests use the scripted
//! `MemorySession` (behind the `test-util` feature).

use crate::db::types::RowSet;
use crate::error::DbResult;
use futures_util::future::BoxFuture;

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Text(String),
}

impl Binding {
    /// Snowflake binding type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "TEXT",
        }
    }

    /// Value as sent on the wire (the SQL API transmits every binding as a string).
    pub fn value(&self) -> String {
        match self {
            Self::Text(v) => v.clone(),
        }
    }
}

/// SQL text plus positional bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub bindings: Vec<Binding>,
}

impl Statement {
    /// Create a statement without bindings.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            bindings: Vec::new(),
        }
    }

    /// Add a text binding for the next `?` placeholder.
    pub fn bind(mut self, value: impl Into<String>) -> Self {
        self.bindings.push(Binding::Text(value.into()));
        self
    }

    /// Number of `?` placeholders in the SQL text.
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

/// A connection able to execute statements sequentially.
pub trait SqlSession: Send + Sync {
    /// Execute one statement and return all of its rows.
    fn execute<'a>(&'a self, statement: &'a Statement) -> BoxFuture<'a, DbResult<RowSet>>;

    /// Get the name of this session type for logging.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings_in_order() {
        let stmt = Statement::new("SELECT ? , ?").bind("PUBLIC").bind("ORDERS");
        assert_eq!(
            stmt.bindings,
            vec![
                Binding::Text("PUBLIC".to_string()),
                Binding::Text("ORDERS".to_string())
            ]
        );
        assert_eq!(stmt.placeholder_count(), 2);
    }

    #[test]
    fn test_binding_wire_format() {
        assert_eq!(Binding::Text("a".to_string()).type_name(), "TEXT");
        assert_eq!(Binding::Text("a".to_string()).value(), "a");
    }
}
