//! Format parsers. Each takes the raw upload and returns the JSON document
//! sent back to the caller, or a human-readable reason it could not.

pub mod shp;
pub mod tabular;
pub mod tracks;

use serde_json::{Number, Value};

/// Text cell to JSON: numeric-looking text becomes a number, blank becomes null.
///
/// Zero-padded digits (ZIP codes, FIPS codes) stay text.
pub(crate) fn text_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if trimmed.len() > 1 && trimmed.starts_with('0') && trimmed.as_bytes()[1].is_ascii_digit() {
        return Value::String(raw.to_string());
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::from(i);
    }
    match trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(n) => Value::Number(n),
        None => Value::String(raw.to_string()),
    }
}

/// Finite floats become numbers, anything else null.
pub(crate) fn float_cell(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::text_cell;

    #[test]
    fn numeric_looking_text_becomes_numbers() {
        assert_eq!(text_cell("42"), json!(42));
        assert_eq!(text_cell(" -3.5 "), json!(-3.5));
        assert_eq!(text_cell(""), json!(null));
        assert_eq!(text_cell("02134"), json!("02134"));
        assert_eq!(text_cell("0.25"), json!(0.25));
        assert_eq!(text_cell("Boston"), json!("Boston"));
        assert_eq!(text_cell("NaN"), json!("NaN"));
    }
}
