use std::collections::BTreeMap;
use std::sync::Arc;

use foundation::Zcta;
use serde::Serialize;

/// A single cell of a decoded query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the cell; text and null have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Null | Value::Text(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// One row of the lookup table.
///
/// Values are aligned with the table's column list, which every record of a
/// table shares.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx)
    }

    /// Iterates `(column, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl Serialize for Record {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// ZCTA-keyed result of one query.
///
/// Built once per successful query and never mutated afterwards; callers share
/// it behind an `Arc` and replace it wholesale on the next query.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTable {
    id_column: String,
    columns: Arc<[String]>,
    rows: BTreeMap<Zcta, Record>,
}

impl LookupTable {
    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    /// Non-identifier columns in schema order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// The column selected when a fresh table arrives: the first one returned.
    pub fn default_column(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, zcta: &Zcta) -> Option<&Record> {
        self.rows.get(zcta)
    }

    pub fn value(&self, zcta: &Zcta, column: &str) -> Option<&Value> {
        self.rows.get(zcta)?.get(column)
    }

    /// Iterates rows in ascending ZCTA order.
    pub fn iter(&self) -> impl Iterator<Item = (&Zcta, &Record)> + '_ {
        self.rows.iter()
    }

    /// Numeric values of `column`, one per row in ZCTA order.
    ///
    /// Returns `None` if the column is not part of the table.
    pub fn column_values(&self, column: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.columns.iter().position(|c| c == column)?;
        Some(
            self.rows
                .values()
                .map(|r| r.values.get(idx).and_then(Value::as_f64))
                .collect(),
        )
    }
}

/// Incremental builder used by the decoders.
#[derive(Debug)]
pub struct LookupTableBuilder {
    id_column: String,
    columns: Arc<[String]>,
    rows: BTreeMap<Zcta, Record>,
    duplicates: usize,
}

impl LookupTableBuilder {
    pub fn new(id_column: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            id_column: id_column.into(),
            columns: columns.into(),
            rows: BTreeMap::new(),
            duplicates: 0,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Inserts a row. `values` must be aligned with the builder's columns.
    ///
    /// A repeated ZCTA replaces the earlier row.
    pub fn insert(&mut self, zcta: Zcta, mut values: Vec<Value>) {
        values.resize(self.columns.len(), Value::Null);
        let record = Record {
            columns: Arc::clone(&self.columns),
            values,
        };
        if self.rows.insert(zcta, record).is_some() {
            self.duplicates += 1;
        }
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn build(self) -> LookupTable {
        LookupTable {
            id_column: self.id_column,
            columns: self.columns,
            rows: self.rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LookupTableBuilder, Value};
    use foundation::Zcta;
    use pretty_assertions::assert_eq;

    fn z(s: &str) -> Zcta {
        Zcta::parse(s).unwrap()
    }

    fn sample() -> super::LookupTable {
        let mut b = LookupTableBuilder::new("zcta", vec!["pop".into(), "name".into()]);
        b.insert(z("94103"), vec![Value::Number(200.0), Value::Text("SoMa".into())]);
        b.insert(z("94102"), vec![Value::Number(100.0), Value::Null]);
        b.insert(z("00501"), vec![Value::Null]);
        b.build()
    }

    #[test]
    fn column_values_follow_key_order() {
        let t = sample();
        assert_eq!(
            t.column_values("pop"),
            Some(vec![None, Some(100.0), Some(200.0)])
        );
        assert_eq!(t.column_values("name"), Some(vec![None, None, None]));
        assert_eq!(t.column_values("missing"), None);
    }

    #[test]
    fn short_rows_are_padded_with_null() {
        let t = sample();
        assert_eq!(t.value(&z("00501"), "name"), Some(&Value::Null));
        assert_eq!(t.default_column(), Some("pop"));
        assert!(t.contains_column("name"));
        assert!(!t.contains_column("zcta"));
    }

    #[test]
    fn duplicate_rows_replace() {
        let mut b = LookupTableBuilder::new("zcta", vec!["pop".into()]);
        b.insert(z("94102"), vec![Value::Number(1.0)]);
        b.insert(z("94102"), vec![Value::Number(2.0)]);
        assert_eq!(b.duplicates(), 1);
        let t = b.build();
        assert_eq!(t.len(), 1);
        assert_eq!(t.value(&z("94102"), "pop"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn record_serializes_as_object() {
        let t = sample();
        let json = serde_json::to_value(t.get(&z("94103")).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"pop": 200.0, "name": "SoMa"}));
    }
}
