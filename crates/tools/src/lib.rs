//! Report formatting for the `geomap` command line.

use std::fmt::Write as _;

use classify::{Palette, ScaleType, classify, hex};
use query::QueryResult;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub color: String,
    pub label: String,
}

/// What `geomap query` prints: the result shape plus the legend of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySummary {
    pub query: String,
    pub rows: usize,
    pub columns: Vec<String>,
    pub column: String,
    pub scale_type: ScaleType,
    pub palette: Palette,
    pub ratio: bool,
    pub domain: (f64, f64),
    pub legend: Vec<LegendEntry>,
    pub generated_sql: Option<String>,
}

impl QuerySummary {
    /// Classifies `column` (the first value column when `None`).
    pub fn new(
        query: &str,
        result: &QueryResult,
        column: Option<&str>,
        scale_type: ScaleType,
        palette: Palette,
    ) -> Result<Self, String> {
        let table = &result.table;
        let column = match column {
            Some(c) => c.to_string(),
            None => table
                .default_column()
                .ok_or("result has no value columns")?
                .to_string(),
        };
        let values = table.column_values(&column).ok_or_else(|| {
            format!(
                "unknown column {column:?} (available: {})",
                table.columns().join(", ")
            )
        })?;

        let c = classify(&values, scale_type, palette);
        Ok(Self {
            query: query.to_string(),
            rows: table.len(),
            columns: table.columns().to_vec(),
            column,
            scale_type,
            palette,
            ratio: c.is_ratio,
            domain: c.domain,
            legend: c
                .legend()
                .map(|(color, label)| LegendEntry {
                    color: hex(color),
                    label: label.to_string(),
                })
                .collect(),
            generated_sql: result.generated_sql.clone(),
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "query:   {}", self.query);
        let _ = writeln!(out, "rows:    {}", self.rows);
        let _ = writeln!(out, "columns: {}", self.columns.join(", "));
        let _ = writeln!(
            out,
            "column:  {} ({}, {}{})",
            self.column,
            self.scale_type,
            self.palette.name(),
            if self.ratio { ", ratio" } else { "" }
        );
        if self.legend.is_empty() {
            let _ = writeln!(out, "legend:  (no values)");
        } else {
            let _ = writeln!(out, "legend:");
            for entry in &self.legend {
                let _ = writeln!(out, "  {}  {}", entry.color, entry.label);
            }
        }
        if let Some(sql) = &self.generated_sql {
            let _ = writeln!(out, "sql:\n{sql}");
        }
        out
    }
}
