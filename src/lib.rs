//! Snowflake Search MCP Server Library
//!
//! This library provides MCP (Model Context Protocol) tools for AI assistants
//! to browse a Snowflake catalog (databases, schemas, tables, columns) and run
//! full-text `SEARCH` queries over the selected columns.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::ExplorerService;
