//! Full outer join of attribute series on timestamp.
//!
//! Every input series becomes a one-column table; the tables are then merged
//! pairwise with a sort-merge join. Rows are keyed by `(timestamp, occurrence)`
//! where `occurrence` counts earlier samples of the same series at the same
//! instant, so duplicate timestamps inside one series are all kept and the
//! k-th duplicate of each series lands in the same row. With that key the
//! join is commutative and associative: only the column order depends on the
//! order of the inputs.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::NaiveDateTime;
use telemetry_core::attributes::AttributeCatalog;
use telemetry_core::error::{Result, TelemetryError};
use telemetry_core::models::{AlignedTable, AttributeSeries, Column, Value};
use tracing::debug;

type RowKey = (NaiveDateTime, u32);

/// Stateless helper that builds [`AlignedTable`]s.
pub struct SeriesAligner;

impl SeriesAligner {
    /// Outer-join `series` into one table, columns in input order.
    ///
    /// Fails with [`TelemetryError::EmptyInput`] for an empty slice and with
    /// [`TelemetryError::DuplicateAttribute`] when two series share a name;
    /// both checks run before any merging.
    pub fn align(series: Vec<AttributeSeries>) -> Result<AlignedTable> {
        if series.is_empty() {
            return Err(TelemetryError::EmptyInput);
        }

        let mut names: HashSet<&str> = HashSet::new();
        for s in &series {
            if !names.insert(s.name()) {
                return Err(TelemetryError::DuplicateAttribute(s.name().to_string()));
            }
        }

        let total_samples: usize = series.iter().map(|s| s.len()).sum();
        let column_count = series.len();

        let mut tables = series.into_iter().map(Self::single_column);
        let first = tables.next().ok_or(TelemetryError::EmptyInput)?;
        let (timestamps, columns) = tables.fold(first, |acc, next| Self::merge(acc, next));

        debug!(
            "SeriesAligner: {} samples across {} columns -> {} rows",
            total_samples,
            column_count,
            timestamps.len()
        );

        AlignedTable::new(timestamps, columns)
    }

    /// Like [`SeriesAligner::align`], but first checks every column name
    /// against `catalog`.
    pub fn align_validated(
        series: Vec<AttributeSeries>,
        catalog: &AttributeCatalog,
    ) -> Result<AlignedTable> {
        catalog.validate(series.iter().map(|s| s.name()))?;
        Self::align(series)
    }

    /// Outer-join two already aligned tables.
    pub fn merge_tables(left: &AlignedTable, right: &AlignedTable) -> Result<AlignedTable> {
        for column in right.columns() {
            if left.column(&column.name).is_some() {
                return Err(TelemetryError::DuplicateAttribute(column.name.clone()));
            }
        }
        let (timestamps, columns) = Self::merge(
            (left.timestamps().to_vec(), left.columns().to_vec()),
            (right.timestamps().to_vec(), right.columns().to_vec()),
        );
        AlignedTable::new(timestamps, columns)
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// Stable-sort one series by timestamp and lay it out as a single column.
    fn single_column(series: AttributeSeries) -> (Vec<NaiveDateTime>, Vec<Column>) {
        let (name, mut samples) = series.into_parts();
        samples.sort_by_key(|s| s.timestamp);
        let timestamps = samples.iter().map(|s| s.timestamp).collect();
        let values = samples.iter().map(|s| Some(s.value)).collect();
        (timestamps, vec![Column::new(name, values)])
    }

    /// Sort-merge outer join of two row-sorted partial tables.
    fn merge(
        (left_ts, left_cols): (Vec<NaiveDateTime>, Vec<Column>),
        (right_ts, right_cols): (Vec<NaiveDateTime>, Vec<Column>),
    ) -> (Vec<NaiveDateTime>, Vec<Column>) {
        let left_keys = row_keys(&left_ts);
        let right_keys = row_keys(&right_ts);

        let capacity = left_keys.len().max(right_keys.len());
        let mut timestamps: Vec<NaiveDateTime> = Vec::with_capacity(capacity);
        let mut left_rows: Vec<Option<usize>> = Vec::with_capacity(capacity);
        let mut right_rows: Vec<Option<usize>> = Vec::with_capacity(capacity);

        let (mut i, mut j) = (0usize, 0usize);
        loop {
            let ordering = match (left_keys.get(i), right_keys.get(j)) {
                (Some(l), Some(r)) => l.cmp(r),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => break,
            };
            match ordering {
                Ordering::Less => {
                    timestamps.push(left_keys[i].0);
                    left_rows.push(Some(i));
                    right_rows.push(None);
                    i += 1;
                }
                Ordering::Greater => {
                    timestamps.push(right_keys[j].0);
                    left_rows.push(None);
                    right_rows.push(Some(j));
                    j += 1;
                }
                Ordering::Equal => {
                    timestamps.push(left_keys[i].0);
                    left_rows.push(Some(i));
                    right_rows.push(Some(j));
                    i += 1;
                    j += 1;
                }
            }
        }

        let mut columns = Vec::with_capacity(left_cols.len() + right_cols.len());
        columns.extend(left_cols.iter().map(|c| reindex(c, &left_rows)));
        columns.extend(right_cols.iter().map(|c| reindex(c, &right_rows)));

        (timestamps, columns)
    }
}

/// `(timestamp, occurrence)` for every row of a sorted timestamp list.
fn row_keys(timestamps: &[NaiveDateTime]) -> Vec<RowKey> {
    let mut keys = Vec::with_capacity(timestamps.len());
    let mut previous: Option<NaiveDateTime> = None;
    let mut occurrence = 0u32;
    for &ts in timestamps {
        if previous == Some(ts) {
            occurrence += 1;
        } else {
            occurrence = 0;
            previous = Some(ts);
        }
        keys.push((ts, occurrence));
    }
    keys
}

/// Spread a column's values over the merged rows; `None` source rows become
/// the missing marker.
fn reindex(column: &Column, rows: &[Option<usize>]) -> Column {
    let values: Vec<Option<Value>> = rows
        .iter()
        .map(|row| row.and_then(|i| column.values[i]))
        .collect();
    Column::new(column.name.clone(), values)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
