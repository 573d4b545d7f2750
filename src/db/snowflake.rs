//! Snowflake SQL API client.
//!
//! Statements are submitted to `POST /api/v2/statements`. A `200` response
//! carries the first partition of the result, a `202` means the statement is
//! still running and its handle is polled until it completes. Remaining
//! partitions are fetched with `GET /api/v2/statements/{handle}?partition=N`.

use crate::config::{SnowflakeConfig, TokenType};
use crate::db::session::{SqlSession, Statement};
use crate::db::types::{ColumnMetadata, RowSet, categorize_type, decode_cell};
use crate::error::{DbError, DbResult};
use futures_util::future::BoxFuture;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

const STATEMENTS_PATH: &str = "api/v2/statements";
const TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouse: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    bindings: BTreeMap<String, WireBinding>,
}

#[derive(Debug, Serialize)]
struct WireBinding {
    #[serde(rename = "type")]
    type_name: &'static str,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    #[serde(default)]
    data: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    statement_handle: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    #[serde(default)]
    num_rows: Option<i64>,
    #[serde(default)]
    row_type: Vec<RowType>,
    #[serde(default)]
    partition_info: Option<Vec<JsonValue>>,
    /// Older API versions put the handle here.
    #[serde(default)]
    statement_handle: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RowType {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    scale: Option<i32>,
    #[serde(default = "default_nullable")]
    nullable: bool,
}

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingResponse {
    #[serde(default)]
    statement_handle: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    sql_state: Option<String>,
}

/// Bindings keyed by their 1-based placeholder position.
fn wire_bindings(statement: &Statement) -> BTreeMap<String, WireBinding> {
    statement
        .bindings
        .iter()
        .enumerate()
        .map(|(i, b)| {
            (
                (i + 1).to_string(),
                WireBinding {
                    type_name: b.type_name(),
                    value: b.value(),
                },
            )
        })
        .collect()
}

enum Outcome {
    Complete(StatementResponse),
    Pending(String),
}

// =============================================================================
// Client
// =============================================================================

/// [`SqlSession`] backed by the Snowflake SQL API over HTTPS.
pub struct SnowflakeClient {
    http: reqwest::Client,
    statements_url: Url,
    token: String,
    token_type: TokenType,
    warehouse: Option<String>,
    role: Option<String>,
    query_timeout: Duration,
    poll_interval: Duration,
}

impl std::fmt::Debug for SnowflakeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnowflakeClient")
            .field("statements_url", &self.statements_url.as_str())
            .field("token_type", &self.token_type)
            .field("warehouse", &self.warehouse)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl SnowflakeClient {
    /// Create a client from connection settings.
    pub fn new(config: &SnowflakeConfig) -> DbResult<Self> {
        let statements_url = config.account_url.join(STATEMENTS_PATH).map_err(|e| {
            DbError::connection(
                format!("Invalid account URL: {e}"),
                "Pass the account URL as https://<account>.snowflakecomputing.com",
            )
        })?;

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("snowflake-search-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DbError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            statements_url,
            token: config.token.clone(),
            token_type: config.token_type,
            warehouse: config.warehouse.clone(),
            role: config.role.clone(),
            query_timeout: config.query_timeout,
            poll_interval: config.poll_interval,
        })
    }

    /// Execute one statement, enforcing the client-side timeout.
    pub async fn run(&self, statement: &Statement) -> DbResult<RowSet> {
        let start = Instant::now();
        debug!(
            sql = %statement.sql,
            bindings = statement.bindings.len(),
            timeout_secs = self.query_timeout.as_secs(),
            "Executing statement"
        );

        let rows = timeout(self.query_timeout, self.run_inner(statement))
            .await
            .map_err(|_| DbError::timeout("statement", self.query_timeout.as_secs() as u32))??;

        debug!(
            rows = rows.row_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Statement completed"
        );
        Ok(rows)
    }

    async fn run_inner(&self, statement: &Statement) -> DbResult<RowSet> {
        let mut outcome = self.submit(statement).await?;

        loop {
            match outcome {
                Outcome::Complete(response) => return self.collect(response).await,
                Outcome::Pending(handle) => {
                    debug!(handle = %handle, "Statement still running, polling");
                    sleep(self.poll_interval).await;
                    outcome = self.fetch(&handle, None).await?;
                }
            }
        }
    }

    async fn submit(&self, statement: &Statement) -> DbResult<Outcome> {
        let body = StatementRequest {
            statement: &statement.sql,
            timeout: self.query_timeout.as_secs(),
            warehouse: self.warehouse.as_deref(),
            role: self.role.as_deref(),
            bindings: wire_bindings(statement),
        };

        let response = self
            .http
            .post(self.statements_url.clone())
            .query(&[("requestId", Uuid::new_v4().to_string())])
            .bearer_auth(&self.token)
            .header(TOKEN_TYPE_HEADER, self.token_type.header_value())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        read_response(response).await
    }

    async fn fetch(&self, handle: &str, partition: Option<usize>) -> DbResult<Outcome> {
        let mut url = self.statements_url.clone();
        url.path_segments_mut()
            .map_err(|_| DbError::internal("Account URL cannot be a base"))?
            .push(handle);
        if let Some(partition) = partition {
            url.query_pairs_mut()
                .append_pair("partition", &partition.to_string());
        }

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header(TOKEN_TYPE_HEADER, self.token_type.header_value())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        read_response(response).await
    }

    /// Decode the first partition and fetch the rest.
    async fn collect(&self, response: StatementResponse) -> DbResult<RowSet> {
        let meta = response
            .result_set_meta_data
            .ok_or_else(|| DbError::internal("Response has no resultSetMetaData"))?;
        let handle = response
            .statement_handle
            .or_else(|| meta.statement_handle.clone());
        let mut data = response.data.unwrap_or_default();

        let partitions = meta.partition_info.as_ref().map_or(1, Vec::len);
        if partitions > 1 {
            let handle = handle
                .as_deref()
                .ok_or_else(|| DbError::internal("Partitioned result without statement handle"))?;
            for partition in 1..partitions {
                debug!(handle = %handle, partition, "Fetching result partition");
                match self.fetch(handle, Some(partition)).await? {
                    Outcome::Complete(part) => data.extend(part.data.unwrap_or_default()),
                    Outcome::Pending(_) => {
                        return Err(DbError::internal(format!(
                            "Partition {partition} reported as still running"
                        )));
                    }
                }
            }
        }

        let expected = meta.num_rows.and_then(|n| usize::try_from(n).ok());
        if let Some(expected) = expected.filter(|n| *n != data.len()) {
            warn!(
                expected,
                received = data.len(),
                "Row count does not match resultSetMetaData"
            );
        }

        Ok(decode_result(&meta.row_type, data))
    }
}

impl SqlSession for SnowflakeClient {
    fn execute<'a>(&'a self, statement: &'a Statement) -> BoxFuture<'a, DbResult<RowSet>> {
        Box::pin(self.run(statement))
    }

    fn name(&self) -> &'static str {
        "snowflake"
    }
}

/// Map an HTTP response to a completed result, a pending handle, or an error.
async fn read_response(response: reqwest::Response) -> DbResult<Outcome> {
    let status = response.status();
    let body = response.bytes().await?;

    match status {
        StatusCode::OK => serde_json::from_slice::<StatementResponse>(&body)
            .map(Outcome::Complete)
            .map_err(|e| DbError::internal(format!("Malformed SQL API response: {e}"))),
        StatusCode::ACCEPTED => {
            let pending: PendingResponse = serde_json::from_slice(&body)
                .map_err(|e| DbError::internal(format!("Malformed SQL API response: {e}")))?;
            let handle = pending.statement_handle.ok_or_else(|| {
                DbError::internal(format!(
                    "Statement pending without a handle: {}",
                    pending.message.unwrap_or_default()
                ))
            })?;
            Ok(Outcome::Pending(handle))
        }
        status => Err(status_error(status, &body)),
    }
}

fn status_error(status: StatusCode, body: &[u8]) -> DbError {
    let err: ErrorResponse = serde_json::from_slice(body).unwrap_or_default();
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());
    let message = if message.is_empty() {
        status.to_string()
    } else {
        message
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            DbError::permission("authenticate", message)
        }
        StatusCode::REQUEST_TIMEOUT => DbError::timeout("statement", 0),
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => DbError::connection(
            format!("Snowflake unavailable ({status}): {message}"),
            "Retry in a moment",
        ),
        _ => {
            let message = match err.code {
                Some(code) => format!("{message} (code {code})"),
                None => message,
            };
            DbError::database(
                message,
                err.sql_state,
                "Check object names and privileges of the configured role",
            )
        }
    }
}

/// Turn `rowType` plus raw string cells into a [`RowSet`].
fn decode_result(row_type: &[RowType], data: Vec<Vec<Option<String>>>) -> RowSet {
    let categories: Vec<_> = row_type
        .iter()
        .map(|c| categorize_type(&c.type_name, c.scale))
        .collect();
    let columns = row_type
        .iter()
        .map(|c| ColumnMetadata::new(&c.name, &c.type_name, c.nullable))
        .collect();

    let values = data
        .into_iter()
        .map(|row| {
            row.iter()
                .zip(&categories)
                .map(|(cell, category)| decode_cell(cell.as_deref(), *category))
                .collect()
        })
        .collect();

    RowSet::from_values(columns, values)
}
