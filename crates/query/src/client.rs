use std::sync::Arc;

use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::decode::{ID_COLUMN, decode_generated_sql, decode_parquet};
use crate::error::{QueryError, UNSUPPORTED_QUESTION};
use crate::lookup::LookupTable;

/// Response header carrying the base64-encoded SQL that produced a result.
pub const GENERATED_SQL_HEADER: &str = "x-generated-sql";

/// A decoded query response.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub table: Arc<LookupTable>,
    pub generated_sql: Option<String>,
}

/// HTTP client for the Census query backend.
///
/// Each call issues exactly one request; nothing is retried.
#[derive(Debug, Clone)]
pub struct QueryClient {
    http: reqwest::Client,
    base_url: String,
    id_column: String,
}

impl QueryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            id_column: ID_COLUMN.to_string(),
        }
    }

    pub fn with_id_column(mut self, id_column: impl Into<String>) -> Self {
        self.id_column = id_column.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Runs a free-text query and decodes the columnar result.
    pub async fn fetch(&self, query: &str) -> Result<QueryResult, QueryError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(QueryError::validation("query must not be empty"));
        }

        let url = format!("{}/query", self.base_url);
        debug!("GET {url} query={query:?}");
        let resp = self.http.get(&url).query(&[("query", query)]).send().await?;

        let status = resp.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            info!("backend rejected query {query:?}");
            return Err(QueryError::validation(UNSUPPORTED_QUESTION));
        }
        if !status.is_success() {
            return Err(QueryError::network(format!("query endpoint returned {status}")));
        }

        let generated_sql = match resp.headers().get(GENERATED_SQL_HEADER) {
            Some(value) => {
                let text = value
                    .to_str()
                    .map_err(|e| QueryError::decode(format!("generated sql header: {e}")))?;
                Some(decode_generated_sql(text)?)
            }
            None => {
                warn!("response carried no {GENERATED_SQL_HEADER} header");
                None
            }
        };

        let body = resp.bytes().await?;
        let table = decode_parquet(body, &self.id_column)?;
        info!(
            "query decoded: {} rows, {} columns",
            table.len(),
            table.columns().len()
        );

        Ok(QueryResult {
            table: Arc::new(table),
            generated_sql,
        })
    }

    /// Fetches ordered suggestions for partially typed query text.
    pub async fn autocomplete(&self, text: &str) -> Result<Vec<String>, QueryError> {
        let url = format!("{}/autocomplete", self.base_url);
        let resp = self.http.get(&url).query(&[("text", text)]).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(QueryError::network(format!(
                "autocomplete endpoint returned {status}"
            )));
        }
        resp.json::<Vec<String>>()
            .await
            .map_err(|e| QueryError::decode(format!("autocomplete body: {e}")))
    }
}
