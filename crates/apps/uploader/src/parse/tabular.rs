use std::io::Cursor;

use bytes::Bytes;
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value};

use super::{float_cell, text_cell};

/// Header row, then one object per record.
pub fn csv(data: &[u8]) -> Result<Value, String> {
    let mut reader = ::csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data);
    let headers = reader
        .headers()
        .map_err(|e| format!("header row: {e}"))?
        .clone();

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| format!("row {}: {e}", i + 1))?;
        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, cell)| (h.to_string(), text_cell(cell)))
            .collect();
        rows.push(Value::Object(row));
    }
    Ok(Value::Array(rows))
}

pub fn parquet(data: Bytes) -> Result<Value, String> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(data)
        .and_then(|b| b.build())
        .map_err(|e| format!("parquet: {e}"))?;

    let mut writer = arrow::json::ArrayWriter::new(Vec::new());
    for batch in reader {
        let batch = batch.map_err(|e| format!("record batch: {e}"))?;
        writer
            .write(&batch)
            .map_err(|e| format!("encode rows: {e}"))?;
    }
    writer.finish().map_err(|e| format!("encode rows: {e}"))?;

    let buf = writer.into_inner();
    if buf.is_empty() {
        return Ok(Value::Array(Vec::new()));
    }
    serde_json::from_slice(&buf).map_err(|e| format!("encode rows: {e}"))
}

pub fn json(data: &[u8]) -> Result<Value, String> {
    serde_json::from_slice(data).map_err(|e| e.to_string())
}

/// First sheet only; its first row names the columns.
pub fn excel(data: Bytes) -> Result<Value, String> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(data)).map_err(|e| format!("workbook: {e}"))?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Ok(Value::Array(Vec::new()));
    };
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| format!("sheet {sheet:?}: {e}"))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Value::Array(Vec::new()));
    };
    let header: Vec<String> = header.iter().map(|c| c.to_string()).collect();

    Ok(Value::Array(
        rows.map(|row| {
            Value::Object(
                header
                    .iter()
                    .cloned()
                    .zip(row.iter().map(excel_cell))
                    .collect(),
            )
        })
        .collect(),
    ))
}

fn excel_cell(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => float_cell(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) => Value::String(s.clone()),
        Data::Empty | Data::Error(_) => Value::Null,
        other => Value::String(other.to_string()),
    }
}
