//! ZIP Code Tabulation Area identifiers.
//!
//! A ZCTA is always five ASCII digits. Upstream data frequently drops the
//! leading zeros (`501` for `00501`), so constructors pad short values.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const ZCTA_LEN: usize = 5;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Zcta([u8; ZCTA_LEN]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZctaError {
    Empty,
    TooLong(String),
    NotDigits(String),
}

impl fmt::Display for ZctaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZctaError::Empty => write!(f, "empty zcta"),
            ZctaError::TooLong(raw) => write!(f, "zcta longer than {ZCTA_LEN} digits: {raw:?}"),
            ZctaError::NotDigits(raw) => write!(f, "zcta must be digits: {raw:?}"),
        }
    }
}

impl std::error::Error for ZctaError {}

impl Zcta {
    /// Parses a textual code, left-padding with zeros.
    ///
    /// Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Result<Self, ZctaError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ZctaError::Empty);
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ZctaError::NotDigits(raw.to_string()));
        }
        if trimmed.len() > ZCTA_LEN {
            return Err(ZctaError::TooLong(raw.to_string()));
        }

        let mut out = [b'0'; ZCTA_LEN];
        let offset = ZCTA_LEN - trimmed.len();
        out[offset..].copy_from_slice(trimmed.as_bytes());
        Ok(Zcta(out))
    }

    pub fn from_number(n: u64) -> Result<Self, ZctaError> {
        Self::parse(&n.to_string())
    }

    pub fn as_str(&self) -> &str {
        // Invariant: only ASCII digits are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("00000")
    }
}

impl fmt::Display for Zcta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Zcta {
    type Error = ZctaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Zcta::parse(&value)
    }
}

impl From<Zcta> for String {
    fn from(value: Zcta) -> Self {
        value.as_str().to_string()
    }
}

impl std::str::FromStr for Zcta {
    type Err = ZctaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Zcta::parse(s)
    }
}
