//! Configuration handling for the Snowflake Search MCP Server.
//!
//! This module provides configuration management via CLI arguments and environment variables.

use crate::models::{
    ColumnTypePolicy, DEFAULT_SEARCH_ROW_LIMIT, DEFAULT_WILDCARD_THRESHOLD, MAX_SEARCH_ROW_LIMIT,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_DATABASE: &str = "SANDBOX";

/// Suffix appended to bare account identifiers.
const ACCOUNT_HOST_SUFFIX: &str = ".snowflakecomputing.com";

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// HTTP with Server-Sent Events (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Kind of bearer token sent to the SQL API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TokenType {
    #[default]
    Oauth,
    KeypairJwt,
    ProgrammaticAccessToken,
}

impl TokenType {
    /// Value of the `X-Snowflake-Authorization-Token-Type` header.
    pub fn header_value(&self) -> &'static str {
        match self {
            Self::Oauth => "OAUTH",
            Self::KeypairJwt => "KEYPAIR_JWT",
            Self::ProgrammaticAccessToken => "PROGRAMMATIC_ACCESS_TOKEN",
        }
    }
}

/// Connection settings for the Snowflake SQL API.
#[derive(Debug, Clone)]
pub struct SnowflakeConfig {
    /// Base URL of the account, e.g. `https://myorg-myaccount.snowflakecomputing.com/`
    pub account_url: Url,
    /// Bearer token (sensitive - not logged).
    pub token: String,
    pub token_type: TokenType,
    pub warehouse: Option<String>,
    pub role: Option<String>,
    pub query_timeout: Duration,
    pub connect_timeout: Duration,
    /// Delay between status polls of a statement still running.
    pub poll_interval: Duration,
}

impl SnowflakeConfig {
    /// Parse an account URL or a bare account identifier.
    ///
    /// # Examples
    ///
    /// ```text
    /// myorg-myaccount                                  # -> https://myorg-myaccount.snowflakecomputing.com/
    /// https://myorg-myaccount.snowflakecomputing.com   # used as-is
    /// http://127.0.0.1:9000                            # local emulator
    /// ```
    pub fn parse_account_url(s: &str) -> Result<Url, String> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Snowflake account URL is empty".to_string());
        }

        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else if trimmed.contains('.') {
            format!("https://{}", trimmed)
        } else {
            format!("https://{}{}", trimmed, ACCOUNT_HOST_SUFFIX)
        };

        let mut url = Url::parse(&candidate).map_err(|e| format!("Invalid account URL: {e}"))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(format!(
                "Unsupported account URL scheme '{}', expected https",
                url.scheme()
            ));
        }
        if url.host_str().is_none() {
            return Err("Account URL has no host".to_string());
        }

        // Relative joins need a trailing slash on the base path
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url.set_query(None);
        Ok(url)
    }
}

/// Behavior of the catalog navigator and search orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerSettings {
    /// Database selected when none has been chosen yet, if it exists.
    pub default_database: String,
    /// Per-table row cap for search results.
    pub row_limit: u32,
    /// Tables with more selected columns than this are searched with a wildcard.
    pub wildcard_threshold: usize,
    pub column_types: ColumnTypePolicy,
    /// Directory CSV exports are also written to.
    pub export_dir: Option<PathBuf>,
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            default_database: DEFAULT_DATABASE.to_string(),
            row_limit: DEFAULT_SEARCH_ROW_LIMIT,
            wildcard_threshold: DEFAULT_WILDCARD_THRESHOLD,
            column_types: ColumnTypePolicy::default(),
            export_dir: None,
        }
    }
}

/// Configuration for the Snowflake Search MCP Server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "snowflake-search-mcp",
    about = "MCP server for browsing a Snowflake catalog and running SEARCH queries over selected columns",
    version,
    author
)]
pub struct Config {
    /// Snowflake account URL or account identifier (e.g. "myorg-myaccount")
    #[arg(long, value_name = "URL", env = "SNOWFLAKE_ACCOUNT_URL")]
    pub account_url: Option<String>,

    /// Bearer token for the SQL API (OAuth, key-pair JWT or programmatic access token)
    #[arg(long, env = "SNOWFLAKE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Kind of token passed with --token
    #[arg(long, value_enum, default_value = "oauth", env = "SNOWFLAKE_TOKEN_TYPE")]
    pub token_type: TokenType,

    /// Warehouse used to run statements
    #[arg(long, env = "SNOWFLAKE_WAREHOUSE")]
    pub warehouse: Option<String>,

    /// Role used to run statements
    #[arg(long, env = "SNOWFLAKE_ROLE")]
    pub role: Option<String>,

    /// Database selected by default when it exists
    #[arg(long, default_value = DEFAULT_DATABASE, env = "MCP_DEFAULT_DATABASE")]
    pub default_database: String,

    /// Maximum rows returned per searched table (max: 1000)
    #[arg(long, default_value_t = DEFAULT_SEARCH_ROW_LIMIT, env = "MCP_ROW_LIMIT")]
    pub row_limit: u32,

    /// Tables with more selected columns than this are searched with a whole-row wildcard
    #[arg(long, default_value_t = DEFAULT_WILDCARD_THRESHOLD, env = "MCP_WILDCARD_THRESHOLD")]
    pub wildcard_threshold: usize,

    /// Which columns column discovery offers
    #[arg(long, value_enum, default_value = "text-only", env = "MCP_COLUMN_TYPES")]
    pub column_types: ColumnTypePolicy,

    /// Directory CSV exports are written to (exports are only returned inline when unset)
    #[arg(long, value_name = "DIR", env = "MCP_EXPORT_DIR")]
    pub export_dir: Option<PathBuf>,

    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_HTTP_HOST,
        env = "MCP_HTTP_HOST"
    )]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(
        long,
        default_value_t = DEFAULT_HTTP_PORT,
        env = "MCP_HTTP_PORT"
    )]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_MCP_ENDPOINT,
        env = "MCP_ENDPOINT"
    )]
    pub mcp_endpoint: String,

    /// Statement timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_QUERY_TIMEOUT_SECS,
        env = "MCP_QUERY_TIMEOUT"
    )]
    pub query_timeout: u64,

    /// Connection timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS,
        env = "MCP_CONNECT_TIMEOUT"
    )]
    pub connect_timeout: u64,

    /// Delay between status polls of long-running statements, in milliseconds
    #[arg(
        long,
        default_value_t = DEFAULT_POLL_INTERVAL_MS,
        env = "MCP_POLL_INTERVAL_MS"
    )]
    pub poll_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,

    /// Enable logging output (written to stderr)
    #[arg(long, env = "MCP_ENABLE_LOGS")]
    pub enable_logs: bool,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            account_url: None,
            token: None,
            token_type: TokenType::Oauth,
            warehouse: None,
            role: None,
            default_database: DEFAULT_DATABASE.to_string(),
            row_limit: DEFAULT_SEARCH_ROW_LIMIT,
            wildcard_threshold: DEFAULT_WILDCARD_THRESHOLD,
            column_types: ColumnTypePolicy::TextOnly,
            export_dir: None,
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            query_timeout: DEFAULT_QUERY_TIMEOUT_SECS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            log_level: "info".to_string(),
            json_logs: false,
            enable_logs: false,
        }
    }

    /// Build the SQL API connection settings.
    pub fn snowflake_config(&self) -> Result<SnowflakeConfig, String> {
        let account_url = self
            .account_url
            .as_deref()
            .ok_or_else(|| "A Snowflake account URL is required (--account-url)".to_string())
            .and_then(SnowflakeConfig::parse_account_url)?;

        let token = self
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| "A Snowflake token is required (--token)".to_string())?
            .to_string();

        if self.query_timeout == 0 {
            return Err("query_timeout must be greater than 0".to_string());
        }

        Ok(SnowflakeConfig {
            account_url,
            token,
            token_type: self.token_type,
            warehouse: non_empty(&self.warehouse),
            role: non_empty(&self.role),
            query_timeout: self.query_timeout_duration(),
            connect_timeout: self.connect_timeout_duration(),
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
        })
    }

    /// Build the navigator / search settings, clamping out-of-range values.
    pub fn explorer_settings(&self) -> ExplorerSettings {
        ExplorerSettings {
            default_database: self.default_database.trim().to_string(),
            row_limit: self.row_limit.clamp(1, MAX_SEARCH_ROW_LIMIT),
            wildcard_threshold: self.wildcard_threshold,
            column_types: self.column_types,
            export_dir: self.export_dir.clone(),
        }
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Get the query timeout as a Duration.
    pub fn query_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.query_timeout)
    }

    /// Get the connection timeout as a Duration.
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.transport, TransportMode::Stdio);
        assert_eq!(config.http_host, DEFAULT_HTTP_HOST);
        assert_eq!(config.http_port, DEFAULT_HTTP_PORT);
        assert_eq!(config.default_database, "SANDBOX");
        assert_eq!(config.row_limit, 1000);
        assert_eq!(config.wildcard_threshold, 15);
    }

    #[test]
    fn test_http_bind_addr() {
        let config = Config {
            http_host: "0.0.0.0".to_string(),
            http_port: 3000,
            ..Config::default()
        };
        assert_eq!(config.http_bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_timeout_durations() {
        let config = Config {
            query_timeout: 90,
            connect_timeout: 15,
            ..Config::default()
        };
        assert_eq!(config.query_timeout_duration(), Duration::from_secs(90));
        assert_eq!(config.connect_timeout_duration(), Duration::from_secs(15));
    }

    #[test]
    fn test_parse_bare_account_identifier() {
        let url = SnowflakeConfig::parse_account_url("myorg-myaccount").unwrap();
        assert_eq!(
            url.as_str(),
            "https://myorg-myaccount.snowflakecomputing.com/"
        );
    }

    #[test]
    fn test_parse_account_host() {
        let url =
            SnowflakeConfig::parse_account_url("xy12345.eu-west-1.snowflakecomputing.com").unwrap();
        assert_eq!(
            url.as_str(),
            "https://xy12345.eu-west-1.snowflakecomputing.com/"
        );
    }

    #[test]
    fn test_parse_full_url_keeps_port_and_strips_query() {
        let url = SnowflakeConfig::parse_account_url("http://127.0.0.1:9000?x=1").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/");
    }

    #[test]
    fn test_parse_account_url_rejects_bad_input() {
        assert!(SnowflakeConfig::parse_account_url("").is_err());
        assert!(SnowflakeConfig::parse_account_url("ftp://host").is_err());
    }

    #[test]
    fn test_snowflake_config_requires_url_and_token() {
        let config = Config::default();
        assert!(config.snowflake_config().unwrap_err().contains("account URL"));

        let config = Config {
            account_url: Some("myorg-myaccount".to_string()),
            token: Some("   ".to_string()),
            ..Config::default()
        };
        assert!(config.snowflake_config().unwrap_err().contains("token"));
    }

    #[test]
    fn test_snowflake_config_trims_optional_fields() {
        let config = Config {
            account_url: Some("myorg-myaccount".to_string()),
            token: Some("secret".to_string()),
            warehouse: Some("  ".to_string()),
            role: Some("ANALYST".to_string()),
            ..Config::default()
        };
        let sf = config.snowflake_config().unwrap();
        assert_eq!(sf.token, "secret");
        assert!(sf.warehouse.is_none());
        assert_eq!(sf.role.as_deref(), Some("ANALYST"));
    }

    #[test]
    fn test_explorer_settings_clamp_row_limit() {
        let config = Config {
            row_limit: 0,
            ..Config::default()
        };
        assert_eq!(config.explorer_settings().row_limit, 1);

        let config = Config {
            row_limit: 1_000_000,
            ..Config::default()
        };
        assert_eq!(config.explorer_settings().row_limit, 1000);
    }

    #[test]
    fn test_token_type_header_values() {
        assert_eq!(TokenType::Oauth.header_value(), "OAUTH");
        assert_eq!(TokenType::KeypairJwt.header_value(), "KEYPAIR_JWT");
        assert_eq!(
            TokenType::ProgrammaticAccessToken.header_value(),
            "PROGRAMMATIC_ACCESS_TOKEN"
        );
    }
}
