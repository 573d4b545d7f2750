//! Database abstraction layer.
//!
//! This module provides Snowflake access functionality:
//! - Statement execution over the SQL API
//! - SQL builders with quoted identifiers and bind parameters
//! - Catalog introspection
//! - Type mappings

pub mod catalog;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod session;
pub mod snowflake;
pub mod sql;
pub mod types;

pub use catalog::CatalogInspector;
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemorySession;
pub use session::{Binding, SqlSession, Statement};
pub use snowflake::SnowflakeClient;
pub use types::{ColumnMetadata, RowSet};
