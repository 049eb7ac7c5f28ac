use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No query result is loaded yet.
    NoData,
    /// The requested column is not part of the current result.
    UnknownColumn(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NoData => write!(f, "no query result loaded"),
            SessionError::UnknownColumn(c) => write!(f, "unknown column: {c:?}"),
        }
    }
}

impl std::error::Error for SessionError {}
