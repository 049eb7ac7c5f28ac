use foundation::Zcta;
use serde_json::{Map, Value};

/// Property names that may carry a feature's ZCTA, in lookup order.
///
/// Client-side polygons use `zcta`; the 2010 Census tiles use either the
/// TIGER field `ZCTA5CE10` or `GEOID10`.
pub const ID_FIELDS: [&str; 3] = ["zcta", "ZCTA5CE10", "GEOID10"];

pub type FeatureProperties = Map<String, Value>;

/// Resolves a picked feature to its ZCTA.
///
/// Fields are tried in [`ID_FIELDS`] order; a field whose value does not parse
/// as a ZCTA falls through to the next one.
pub fn feature_identifier(properties: &FeatureProperties) -> Option<Zcta> {
    ID_FIELDS
        .iter()
        .filter_map(|field| properties.get(*field))
        .find_map(identifier_value)
}

fn identifier_value(value: &Value) -> Option<Zcta> {
    match value {
        Value::String(s) => Zcta::parse(s).ok(),
        Value::Number(n) => n.as_u64().and_then(|n| Zcta::from_number(n).ok()),
        _ => None,
    }
}

/// Result of a screen-space pick, as reported by the drawing front end.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PickInfo {
    pub x_px: f64,
    pub y_px: f64,
    /// Properties of the feature under the cursor, if any.
    pub properties: Option<FeatureProperties>,
}

impl PickInfo {
    pub fn empty(x_px: f64, y_px: f64) -> Self {
        Self {
            x_px,
            y_px,
            properties: None,
        }
    }

    pub fn feature(x_px: f64, y_px: f64, properties: FeatureProperties) -> Self {
        Self {
            x_px,
            y_px,
            properties: Some(properties),
        }
    }

    pub fn identifier(&self) -> Option<Zcta> {
        self.properties.as_ref().and_then(feature_identifier)
    }
}
