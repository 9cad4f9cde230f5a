use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{Result, TelemetryError};
use crate::time_utils::format_timestamp;

// ── Value ─────────────────────────────────────────────────────────────────────

/// Numeric type an attribute's values are parsed as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Signed 64-bit integer values.
    Integer,
    /// Finite 64-bit floating point values.
    #[default]
    Float,
}

impl ValueKind {
    /// Convert a value token into a [`Value`] of this kind.
    ///
    /// Returns `None` for tokens that do not parse, and for non-finite floats
    /// (`NaN`, `inf`) which would be indistinguishable from a gap once
    /// normalized.
    pub fn parse(self, token: &str) -> Option<Value> {
        match self {
            ValueKind::Integer => token.parse::<i64>().ok().map(Value::Integer),
            ValueKind::Float => token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Value::Float),
        }
    }
}

/// A single numeric observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
}

impl Value {
    /// Widen to `f64` for arithmetic.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Integer(v) => v as f64,
            Value::Float(v) => v,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            // `{:?}` keeps the trailing `.0` on whole floats.
            Value::Float(v) => write!(f, "{:?}", v),
        }
    }
}

// ── Sample / AttributeSeries ──────────────────────────────────────────────────

/// One `(timestamp, value)` observation of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Local wall-clock time written by the collector.
    pub timestamp: NaiveDateTime,
    /// The measured value.
    pub value: Value,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime, value: Value) -> Self {
        Self { timestamp, value }
    }
}

/// All samples of one attribute, in the order they were read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeSeries {
    name: String,
    samples: Vec<Sample>,
}

impl AttributeSeries {
    pub fn new(name: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            name: name.into(),
            samples,
        }
    }

    /// Attribute identifier (also the column name once aligned).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Timestamps in series order.
    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }

    /// `true` when timestamps never decrease from one sample to the next.
    pub fn is_monotonic(&self) -> bool {
        self.samples
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp)
    }

    /// Samples whose timestamp falls inside `window`, in series order.
    pub fn window(&self, window: &TimeWindow) -> AttributeSeries {
        AttributeSeries {
            name: self.name.clone(),
            samples: self
                .samples
                .iter()
                .filter(|s| window.contains(&s.timestamp))
                .copied()
                .collect(),
        }
    }

    /// Consume the series, returning its name and samples.
    pub fn into_parts(self) -> (String, Vec<Sample>) {
        (self.name, self.samples)
    }
}

// ── TimeWindow ────────────────────────────────────────────────────────────────

/// Half-open `[start, end)` timestamp range. A missing bound is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl TimeWindow {
    /// A closed-on-the-left, open-on-the-right window between two instants.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        Self::from_bounds(Some(start), Some(end))
    }

    /// Build a window from optional bounds, rejecting `start > end`.
    pub fn from_bounds(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(TelemetryError::InvalidWindow {
                    start: format_timestamp(&s),
                    end: format_timestamp(&e),
                });
            }
        }
        Ok(Self { start, end })
    }

    /// Window that admits every timestamp.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// `start <= ts < end`.
    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        self.start.map_or(true, |s| *ts >= s) && self.end.map_or(true, |e| *ts < e)
    }
}

// ── AlignedTable ──────────────────────────────────────────────────────────────

/// One attribute's values across every row of an [`AlignedTable`].
///
/// `None` is the missing marker: the attribute has no sample at that row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<Value>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<Value>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Number of cells holding a real sample.
    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Largest present value, ignoring missing cells.
    pub fn max(&self) -> Option<Value> {
        self.present()
            .reduce(|a, b| if b.as_f64() > a.as_f64() { b } else { a })
    }

    /// Smallest present value, ignoring missing cells.
    pub fn min(&self) -> Option<Value> {
        self.present()
            .reduce(|a, b| if b.as_f64() < a.as_f64() { b } else { a })
    }

    fn present(&self) -> impl Iterator<Item = Value> + '_ {
        self.values.iter().flatten().copied()
    }
}

/// Timestamp-indexed rows with one column per attribute.
///
/// Rows are ascending by timestamp. A timestamp repeats only when some input
/// series carried duplicate samples at that instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedTable {
    timestamps: Vec<NaiveDateTime>,
    columns: Vec<Column>,
}

impl AlignedTable {
    /// Assemble a table, checking that every column covers every row, that
    /// column names are unique and that rows are ascending.
    pub fn new(timestamps: Vec<NaiveDateTime>, columns: Vec<Column>) -> Result<Self> {
        let mut seen: HashSet<&str> = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(TelemetryError::DuplicateAttribute(column.name.clone()));
            }
            if column.values.len() != timestamps.len() {
                return Err(TelemetryError::Config(format!(
                    "column {} has {} values for {} rows",
                    column.name,
                    column.values.len(),
                    timestamps.len()
                )));
            }
        }
        if timestamps.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(TelemetryError::Config(
                "aligned table rows are not in ascending timestamp order".to_string(),
            ));
        }
        Ok(Self {
            timestamps,
            columns,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Row index, ascending.
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look a column up by attribute name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Cells of row `index`, in column order.
    pub fn row(&self, index: usize) -> Option<(NaiveDateTime, Vec<Option<Value>>)> {
        let ts = *self.timestamps.get(index)?;
        let cells = self.columns.iter().map(|c| c.values[index]).collect();
        Some((ts, cells))
    }

    /// Iterate rows as `(timestamp, cells)` in ascending order.
    pub fn rows(&self) -> impl Iterator<Item = (NaiveDateTime, Vec<Option<Value>>)> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }

    /// Rows whose timestamp lies inside `window`.
    pub fn window(&self, window: &TimeWindow) -> AlignedTable {
        let keep: Vec<usize> = self
            .timestamps
            .iter()
            .enumerate()
            .filter(|(_, ts)| window.contains(ts))
            .map(|(i, _)| i)
            .collect();

        AlignedTable {
            timestamps: keep.iter().map(|&i| self.timestamps[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), keep.iter().map(|&i| c.values[i]).collect()))
                .collect(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
