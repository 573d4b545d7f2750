//! Snowflake Search MCP Server - Main entry point.
//!
//! This server provides MCP (Model Context Protocol) tools for AI assistants
//! to browse a Snowflake catalog and search selected columns.

use snowflake_search_mcp::config::{Config, TransportMode};
use snowflake_search_mcp::db::{SnowflakeClient, SqlSession};
use snowflake_search_mcp::transport::{HttpTransport, StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr; stdout carries the stdio transport.
fn init_tracing(config: &Config) {
    if !config.enable_logs && std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse_args();

    init_tracing(&config);

    let snowflake = match config.snowflake_config() {
        Ok(snowflake) => snowflake,
        Err(message) => {
            eprintln!("Error: {message}");
            eprintln!();
            eprintln!("Usage: snowflake-search-mcp --account-url <account> --token <token>");
            eprintln!();
            eprintln!("Examples:");
            eprintln!("  snowflake-search-mcp --account-url myorg-myaccount --token $TOKEN");
            eprintln!(
                "  SNOWFLAKE_ACCOUNT_URL=https://xy12345.eu-west-1.snowflakecomputing.com \\"
            );
            eprintln!("    SNOWFLAKE_TOKEN=$JWT SNOWFLAKE_TOKEN_TYPE=keypair-jwt snowflake-search-mcp");
            eprintln!("  snowflake-search-mcp --account-url myorg-myaccount --token $PAT \\");
            eprintln!("    --token-type programmatic-access-token --warehouse SEARCH_WH --transport http");
            std::process::exit(1);
        }
    };
    let settings = Arc::new(config.explorer_settings());

    info!(
        transport = %config.transport,
        account = %snowflake.account_url,
        token_type = snowflake.token_type.header_value(),
        default_database = %settings.default_database,
        row_limit = settings.row_limit,
        wildcard_threshold = settings.wildcard_threshold,
        column_types = %settings.column_types,
        "Starting Snowflake Search MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let session: Arc<dyn SqlSession> = Arc::new(SnowflakeClient::new(&snowflake)?);

    // Run the appropriate transport
    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            let transport = StdioTransport::new(session, settings);
            transport.run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            let transport = HttpTransport::new(
                session,
                settings,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            );
            transport.run().await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
