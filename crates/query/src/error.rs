use std::fmt;

/// Message shown when the backend refuses a question it cannot answer.
pub const UNSUPPORTED_QUESTION: &str = "this kind of question is not supported";

/// Failure kinds of the query pipeline.
///
/// None of these are retried automatically; recovery is always a new
/// user-issued query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Transport failure or a non-success HTTP status.
    Network(String),
    /// Malformed payload or a schema that lacks the identifier column.
    Decode(String),
    /// The backend rejected the question (HTTP 422), or the input was empty.
    Validation(String),
}

impl QueryError {
    pub fn network(msg: impl Into<String>) -> Self {
        QueryError::Network(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        QueryError::Decode(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        QueryError::Validation(msg.into())
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Network(msg) => write!(f, "network error: {msg}"),
            QueryError::Decode(msg) => write!(f, "decode error: {msg}"),
            QueryError::Validation(msg) => write!(f, "validation error: {msg}"),
        }
    }
}

impl std::error::Error for QueryError {}

impl From<arrow::error::ArrowError> for QueryError {
    fn from(err: arrow::error::ArrowError) -> Self {
        QueryError::Decode(err.to_string())
    }
}

impl From<parquet::errors::ParquetError> for QueryError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        QueryError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        QueryError::Network(err.to_string())
    }
}
