//! CSV and JSON export of aligned (or normalized) tables.
//!
//! Both formats are deterministic: same table, same bytes. CSV leaves the
//! missing marker as an empty cell, JSON writes `null`.

use std::io::Write;

use serde_json::{Map, Value as JsonValue};
use telemetry_core::error::Result;
use telemetry_core::models::{AlignedTable, Value};
use telemetry_core::time_utils::format_timestamp;

use crate::transform::NormalizedTable;

/// Name of the leading timestamp column.
pub const TIMESTAMP_HEADER: &str = "timestamp";

/// A table that can be written out row by row.
pub trait ExportTable {
    fn column_names(&self) -> Vec<&str>;
    fn row_count(&self) -> usize;
    /// Formatted timestamp of row `row`.
    fn timestamp_at(&self, row: usize) -> String;
    /// Cell of `row` in column `column`, `None` when missing.
    fn cell(&self, row: usize, column: usize) -> Option<Value>;
}

impl ExportTable for AlignedTable {
    fn column_names(&self) -> Vec<&str> {
        AlignedTable::column_names(self)
    }

    fn row_count(&self) -> usize {
        self.len()
    }

    fn timestamp_at(&self, row: usize) -> String {
        format_timestamp(&self.timestamps()[row])
    }

    fn cell(&self, row: usize, column: usize) -> Option<Value> {
        self.columns()[column].values[row]
    }
}

impl ExportTable for NormalizedTable {
    fn column_names(&self) -> Vec<&str> {
        self.columns().iter().map(|c| c.name()).collect()
    }

    fn row_count(&self) -> usize {
        self.len()
    }

    fn timestamp_at(&self, row: usize) -> String {
        format_timestamp(&self.timestamps()[row])
    }

    fn cell(&self, row: usize, column: usize) -> Option<Value> {
        self.columns()[column].values()[row].map(Value::Float)
    }
}

// ── CSV ───────────────────────────────────────────────────────────────────────

/// Write `timestamp,<attr1>,<attr2>,...` followed by one line per row.
pub fn write_csv<T: ExportTable, W: Write>(table: &T, writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);

    let mut header = vec![TIMESTAMP_HEADER];
    header.extend(table.column_names());
    wtr.write_record(&header).map_err(std::io::Error::from)?;

    let columns = table.column_names().len();
    for row in 0..table.row_count() {
        let mut record = Vec::with_capacity(columns + 1);
        record.push(table.timestamp_at(row));
        for column in 0..columns {
            record.push(
                table
                    .cell(row, column)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        wtr.write_record(&record).map_err(std::io::Error::from)?;
    }

    wtr.flush()?;
    Ok(())
}

/// [`write_csv`] into a `String`.
pub fn to_csv_string<T: ExportTable>(table: &T) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

// ── JSON ──────────────────────────────────────────────────────────────────────

/// Rows as JSON objects: `{"timestamp": "...", "<attr>": <value or null>}`.
pub fn to_json_rows<T: ExportTable>(table: &T) -> JsonValue {
    let names = table.column_names();
    let rows = (0..table.row_count())
        .map(|row| {
            let mut object = Map::new();
            object.insert(
                TIMESTAMP_HEADER.to_string(),
                JsonValue::String(table.timestamp_at(row)),
            );
            for (column, name) in names.iter().enumerate() {
                let cell = match table.cell(row, column) {
                    Some(value) => serde_json::to_value(value).unwrap_or(JsonValue::Null),
                    None => JsonValue::Null,
                };
                object.insert(name.to_string(), cell);
            }
            JsonValue::Object(object)
        })
        .collect();
    JsonValue::Array(rows)
}

/// Pretty-printed [`to_json_rows`], newline-terminated.
pub fn write_json<T: ExportTable, W: Write>(table: &T, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, &to_json_rows(table))?;
    writeln!(writer)?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
