//! Shareable map state.
//!
//! Token layout: base64 (standard alphabet, padded) of
//! `"<query>||<lng>,<lat>,<zoom>"`. Floats are written in their shortest
//! round-trip form, so decoding an encoded state gives back the same values.

use std::fmt;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::viewport::Viewport;

const SEPARATOR: &str = "||";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareState {
    pub query: String,
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStateError {
    Base64(String),
    NotUtf8,
    MissingSeparator,
    FieldCount(usize),
    NotANumber { field: &'static str, raw: String },
}

impl fmt::Display for ViewStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewStateError::Base64(msg) => write!(f, "share token is not base64: {msg}"),
            ViewStateError::NotUtf8 => write!(f, "share token is not utf-8"),
            ViewStateError::MissingSeparator => {
                write!(f, "share token lacks the `{SEPARATOR}` separator")
            }
            ViewStateError::FieldCount(n) => {
                write!(f, "share token viewport has {n} fields, expected 3")
            }
            ViewStateError::NotANumber { field, raw } => {
                write!(f, "share token {field} is not a finite number: {raw:?}")
            }
        }
    }
}

impl std::error::Error for ViewStateError {}

impl ShareState {
    pub fn new(query: impl Into<String>, viewport: &Viewport) -> Self {
        Self {
            query: query.into(),
            longitude: viewport.longitude,
            latitude: viewport.latitude,
            zoom: viewport.zoom,
        }
    }

    pub fn encode(&self) -> String {
        let raw = format!(
            "{}{SEPARATOR}{},{},{}",
            self.query, self.longitude, self.latitude, self.zoom
        );
        base64::engine::general_purpose::STANDARD.encode(raw)
    }

    /// Inverse of [`ShareState::encode`]. A leading `#` is ignored.
    pub fn decode(token: &str) -> Result<Self, ViewStateError> {
        let token = token.trim().trim_start_matches('#');
        let raw = base64::engine::general_purpose::STANDARD
            .decode(token)
            .map_err(|e| ViewStateError::Base64(e.to_string()))?;
        let raw = String::from_utf8(raw).map_err(|_| ViewStateError::NotUtf8)?;

        // The viewport half never contains `|`, so the last separator is the real one.
        let (query, view) = raw
            .rsplit_once(SEPARATOR)
            .ok_or(ViewStateError::MissingSeparator)?;

        let fields: Vec<&str> = view.split(',').collect();
        let [lng, lat, zoom] = fields.as_slice() else {
            return Err(ViewStateError::FieldCount(fields.len()));
        };

        Ok(Self {
            query: query.to_string(),
            longitude: parse_field("longitude", lng)?,
            latitude: parse_field("latitude", lat)?,
            zoom: parse_field("zoom", zoom)?,
        })
    }

    /// Camera for this state; bearing and pitch are not shared.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.longitude, self.latitude, self.zoom)
    }
}

fn parse_field(field: &'static str, raw: &str) -> Result<f64, ViewStateError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ViewStateError::NotANumber {
            field,
            raw: raw.to_string(),
        }),
    }
}
