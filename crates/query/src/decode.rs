//! Columnar payload decoding.
//!
//! The query endpoint answers with a Parquet file. Decoding turns the
//! column-oriented batches into the row-oriented, ZCTA-keyed `LookupTable`.

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use arrow::record_batch::RecordBatch;
use base64::Engine as _;
use bytes::Bytes;
use foundation::Zcta;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::{debug, warn};

use crate::error::QueryError;
use crate::lookup::{LookupTable, LookupTableBuilder, Value};

/// Identifier column of Census query results.
pub const ID_COLUMN: &str = "zcta";

/// Decodes a Parquet payload into a lookup table keyed by `id_column`.
pub fn decode_parquet(payload: Bytes, id_column: &str) -> Result<LookupTable, QueryError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(payload)?;
    let schema = builder.schema().clone();

    let id_idx = schema.index_of(id_column).map_err(|_| {
        QueryError::decode(format!("identifier column `{id_column}` missing from result"))
    })?;

    let columns: Vec<String> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != id_idx)
        .map(|(_, f)| f.name().clone())
        .collect();

    let mut table = LookupTableBuilder::new(id_column, columns);
    let mut skipped = 0usize;

    let reader = builder.build()?;
    for batch in reader {
        let batch = batch?;
        skipped += append_batch(&mut table, &batch, id_idx)?;
    }

    if skipped > 0 {
        warn!("skipped {skipped} rows with a null `{id_column}`");
    }
    if table.duplicates() > 0 {
        debug!("{} duplicate `{id_column}` rows replaced", table.duplicates());
    }

    Ok(table.build())
}

/// Appends one record batch, returning the number of rows skipped.
fn append_batch(
    table: &mut LookupTableBuilder,
    batch: &RecordBatch,
    id_idx: usize,
) -> Result<usize, QueryError> {
    let ids = identifier_strings(batch.column(id_idx))?;
    let ids = ids.as_string::<i32>();

    let value_columns: Vec<DecodedColumn> = (0..batch.num_columns())
        .filter(|i| *i != id_idx)
        .map(|i| DecodedColumn::new(batch.column(i)))
        .collect::<Result<_, _>>()?;

    let mut skipped = 0;
    for row in 0..batch.num_rows() {
        if ids.is_null(row) {
            skipped += 1;
            continue;
        }
        let zcta = Zcta::parse(ids.value(row))
            .map_err(|e| QueryError::decode(format!("row {row}: {e}")))?;
        let values = value_columns.iter().map(|c| c.value(row)).collect();
        table.insert(zcta, values);
    }
    Ok(skipped)
}

/// Normalizes the identifier column to UTF-8 text.
///
/// Numeric identifiers lose their leading zeros upstream; floats are routed
/// through integers so `501.0` reads as `501` and pads to `00501`.
fn identifier_strings(column: &ArrayRef) -> Result<ArrayRef, QueryError> {
    let column = if column.data_type().is_floating() {
        cast(column, &DataType::Int64)?
    } else {
        column.clone()
    };
    Ok(cast(&column, &DataType::Utf8)?)
}

enum DecodedColumn {
    Number(ArrayRef),
    Text(ArrayRef),
}

impl DecodedColumn {
    fn new(column: &ArrayRef) -> Result<Self, QueryError> {
        let dt = column.data_type();
        if dt.is_numeric() || matches!(dt, DataType::Boolean) {
            return Ok(DecodedColumn::Number(cast(column, &DataType::Float64)?));
        }
        Ok(DecodedColumn::Text(cast(column, &DataType::Utf8)?))
    }

    fn value(&self, row: usize) -> Value {
        match self {
            DecodedColumn::Number(arr) => {
                let arr = arr.as_primitive::<Float64Type>();
                if arr.is_null(row) {
                    Value::Null
                } else {
                    Value::Number(arr.value(row))
                }
            }
            DecodedColumn::Text(arr) => {
                let arr = arr.as_string::<i32>();
                if arr.is_null(row) {
                    Value::Null
                } else {
                    Value::Text(arr.value(row).to_string())
                }
            }
        }
    }
}

/// Decodes the base64 SQL text carried in the `x-generated-sql` header.
pub fn decode_generated_sql(header: &str) -> Result<String, QueryError> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(header.trim())
        .map_err(|e| QueryError::decode(format!("generated sql header: {e}")))?;
    String::from_utf8(raw)
        .map_err(|e| QueryError::decode(format!("generated sql header is not utf-8: {e}")))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Float64Array, Int32Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use base64::Engine as _;
    use bytes::Bytes;
    use foundation::Zcta;
    use parquet::arrow::ArrowWriter;
    use pretty_assertions::assert_eq;

    use super::{ID_COLUMN, decode_generated_sql, decode_parquet};
    use crate::error::QueryError;
    use crate::lookup::Value;

    pub(crate) fn parquet_bytes(columns: Vec<(&str, ArrayRef)>) -> Bytes {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, arr)| Field::new(*name, arr.data_type().clone(), true))
            .collect();
        let schema = Arc::new(Schema::new(fields));
        let batch =
            RecordBatch::try_new(schema.clone(), columns.into_iter().map(|(_, a)| a).collect())
                .expect("batch");

        let mut buf = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buf, schema, None).expect("writer");
        writer.write(&batch).expect("write");
        writer.close().expect("close");
        Bytes::from(buf)
    }

    pub(crate) fn sf_payload() -> Bytes {
        parquet_bytes(vec![
            (
                "zcta",
                Arc::new(StringArray::from(vec!["94102", "94103"])) as ArrayRef,
            ),
            (
                "pop",
                Arc::new(Int64Array::from(vec![100, 200])) as ArrayRef,
            ),
            (
                "name",
                Arc::new(StringArray::from(vec![Some("Tenderloin"), None])) as ArrayRef,
            ),
        ])
    }

    #[test]
    fn decodes_rows_keyed_by_zcta() {
        let table = decode_parquet(sf_payload(), ID_COLUMN).expect("decode");
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), &["pop".to_string(), "name".to_string()]);
        let z = Zcta::parse("94103").unwrap();
        assert_eq!(table.value(&z, "pop"), Some(&Value::Number(200.0)));
        assert_eq!(table.value(&z, "name"), Some(&Value::Null));
    }

    #[test]
    fn pads_numeric_identifiers() {
        let payload = parquet_bytes(vec![
            ("zcta", Arc::new(Int32Array::from(vec![501, 2134])) as ArrayRef),
            (
                "ratio",
                Arc::new(Float64Array::from(vec![Some(0.25), None])) as ArrayRef,
            ),
        ]);
        let table = decode_parquet(payload, ID_COLUMN).expect("decode");
        let keys: Vec<String> = table.iter().map(|(z, _)| z.to_string()).collect();
        assert_eq!(keys, vec!["00501", "02134"]);
        assert_eq!(table.column_values("ratio"), Some(vec![Some(0.25), None]));
    }

    #[test]
    fn missing_identifier_is_a_decode_error() {
        let payload = parquet_bytes(vec![(
            "pop",
            Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef,
        )]);
        let err = decode_parquet(payload, ID_COLUMN).unwrap_err();
        assert!(matches!(err, QueryError::Decode(msg) if msg.contains("zcta")));
    }

    #[test]
    fn garbage_payload_is_a_decode_error() {
        let err = decode_parquet(Bytes::from_static(b"not parquet"), ID_COLUMN).unwrap_err();
        assert!(matches!(err, QueryError::Decode(_)));
    }

    #[test]
    fn generated_sql_round_trips_base64() {
        let header = base64::engine::general_purpose::STANDARD.encode("SELECT zcta, pop FROM acs");
        assert_eq!(
            decode_generated_sql(&header).unwrap(),
            "SELECT zcta, pop FROM acs"
        );
        assert!(matches!(
            decode_generated_sql("%%%"),
            Err(QueryError::Decode(_))
        ));
    }
}
