//! Stdio transport for the MCP server.
//!
//! This transport uses standard input/output for communication,
//! which is the standard mode for CLI-based MCP integrations.
//! A single client means a single selection state for the process lifetime.

use crate::config::ExplorerSettings;
use crate::db::SqlSession;
use crate::error::{DbError, DbResult};
use crate::mcp::ExplorerService;
use crate::transport::Transport;
use crate::transport::signal::wait_for_signal;
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;
use tracing::{info, warn};

/// Stdio transport implementation.
pub struct StdioTransport {
    session: Arc<dyn SqlSession>,
    settings: Arc<ExplorerSettings>,
}

impl StdioTransport {
    /// Create a new stdio transport over a shared Snowflake session.
    pub fn new(session: Arc<dyn SqlSession>, settings: Arc<ExplorerSettings>) -> Self {
        Self { session, settings }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> DbResult<()> {
        info!(session = self.session.name(), "Starting MCP server with stdio transport");

        let service = ExplorerService::new(self.session.clone(), self.settings.clone());
        let running_service = service
            .serve(stdio())
            .await
            .map_err(|e| DbError::internal(format!("Failed to start stdio transport: {}", e)))?;

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => info!("Stdio transport completed normally"),
                    Err(e) => {
                        warn!(error = %e, "Stdio transport error");
                        return Err(DbError::internal(format!("Stdio transport error: {}", e)));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        if shutdown_requested {
            tokio::spawn(async {
                wait_for_signal().await;
                warn!("Received second signal, forcing immediate exit");
                std::process::exit(1);
            });

            // A pending stdin read cannot be interrupted from select!
            info!("Exiting process");
            std::process::exit(0);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}
