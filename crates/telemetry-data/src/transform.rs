//! Read-only views derived from an [`AlignedTable`]: normalized columns,
//! per-column summaries and the sampling-interval ("deltaT") series.

use chrono::NaiveDateTime;
use serde::Serialize;
use telemetry_core::attributes::AttributeCatalog;
use telemetry_core::formatting::legend_label;
use telemetry_core::models::{AlignedTable, AttributeSeries, Sample, Value};
use telemetry_core::statistics::IntervalStats;
use telemetry_core::time_utils::seconds_between;
use tracing::warn;

/// Name given to the series produced by [`delta_t_series`].
pub const DELTA_T_NAME: &str = "deltaT";

// ── Normalization ─────────────────────────────────────────────────────────────

/// Divide every present value by the column maximum.
///
/// Missing cells stay missing. When the maximum is zero, or the column has no
/// sample at all, the values are returned unscaled.
pub fn normalize_column(values: &[Option<Value>]) -> Vec<Option<f64>> {
    let max = values
        .iter()
        .flatten()
        .map(Value::as_f64)
        .reduce(f64::max);

    let scale = match max {
        Some(m) if m != 0.0 => m,
        Some(_) => {
            warn!("column maximum is zero, leaving values unscaled");
            1.0
        }
        None => {
            warn!("column has no samples, nothing to normalize");
            1.0
        }
    };

    values
        .iter()
        .map(|cell| cell.map(|v| v.as_f64() / scale))
        .collect()
}

/// One normalized column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedColumn {
    name: String,
    max: Option<Value>,
    values: Vec<Option<f64>>,
}

impl NormalizedColumn {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw maximum the column was divided by.
    pub fn max(&self) -> Option<Value> {
        self.max
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }
}

/// An aligned table with every column scaled into `[.., 1.0]`.
///
/// Only built by [`Normalize::normalized`], so every column covers every row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedTable {
    timestamps: Vec<NaiveDateTime>,
    columns: Vec<NormalizedColumn>,
}

impl NormalizedTable {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[NormalizedColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&NormalizedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Normalization entry point on aligned tables.
pub trait Normalize {
    fn normalized(&self) -> NormalizedTable;
}

impl Normalize for AlignedTable {
    fn normalized(&self) -> NormalizedTable {
        let columns = self
            .columns()
            .iter()
            .map(|column| NormalizedColumn {
                name: column.name.clone(),
                max: column.max(),
                values: normalize_column(&column.values),
            })
            .collect();
        NormalizedTable {
            timestamps: self.timestamps().to_vec(),
            columns,
        }
    }
}

// ── Column summary ────────────────────────────────────────────────────────────

/// Value range and sampling cadence of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    /// Legend label built from the raw maximum.
    pub label: String,
    pub present: usize,
    pub min: Option<Value>,
    pub max: Option<Value>,
    /// Intervals between the rows where this column has a value.
    pub intervals: IntervalStats,
}

/// Summarise every column of `table`, in column order.
///
/// Labels come from `catalog`'s lenient lookup, so identifiers missing from
/// the catalog show as `unknown`.
pub fn summarize(table: &AlignedTable, catalog: &AttributeCatalog) -> Vec<ColumnSummary> {
    table
        .columns()
        .iter()
        .map(|column| {
            let present_at: Vec<NaiveDateTime> = table
                .timestamps()
                .iter()
                .zip(&column.values)
                .filter(|(_, v)| v.is_some())
                .map(|(ts, _)| *ts)
                .collect();
            let max = column.max();
            ColumnSummary {
                name: column.name.clone(),
                label: legend_label(catalog.get_or_default(&column.name), max),
                present: column.present_count(),
                min: column.min(),
                max,
                intervals: IntervalStats::from_timestamps(&present_at),
            }
        })
        .collect()
}

// ── deltaT ────────────────────────────────────────────────────────────────────

/// Seconds since the previous sample, stamped at each sample after the first.
///
/// Samples are taken in series order, so an out-of-order log shows up as a
/// negative value.
pub fn delta_t_series(series: &AttributeSeries) -> AttributeSeries {
    let samples = series
        .samples()
        .windows(2)
        .map(|pair| {
            Sample::new(
                pair[1].timestamp,
                Value::Float(seconds_between(pair[0].timestamp, pair[1].timestamp)),
            )
        })
        .collect();
    AttributeSeries::new(DELTA_T_NAME, samples)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};
    use telemetry_core::models::{Column, TimeWindow};

    fn at(ms: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 7, 24)
            .unwrap()
            .and_hms_opt(18, 10, 0)
            .unwrap()
            + TimeDelta::milliseconds(ms)
    }

    fn table() -> AlignedTable {
        AlignedTable::new(
            vec![at(0), at(1000), at(3000)],
            vec![
                Column::new(
                    "vehicleSpeed",
                    vec![Some(Value::Float(20.0)), None, Some(Value::Float(80.0))],
                ),
                Column::new(
                    "engineRPM",
                    vec![Some(Value::Integer(800)), Some(Value::Integer(1600)), None],
                ),
            ],
        )
        .unwrap()
    }

    // ── normalize_column ─────────────────────────────────────────────────────

    #[test]
    fn test_normalize_column_divides_by_max() {
        let out = normalize_column(&[Some(Value::Float(20.0)), None, Some(Value::Float(80.0))]);
        assert_eq!(out, vec![Some(0.25), None, Some(1.0)]);
    }

    #[test]
    fn test_normalize_column_zero_max_unscaled() {
        let out = normalize_column(&[Some(Value::Float(0.0)), Some(Value::Float(-2.0)), None]);
        assert_eq!(out, vec![Some(0.0), Some(-2.0), None]);
    }

    #[test]
    fn test_normalize_column_all_missing() {
        assert_eq!(normalize_column(&[None, None]), vec![None, None]);
        assert!(normalize_column(&[]).is_empty());
    }

    #[test]
    fn test_normalized_table_keeps_shape() {
        let normalized = table().normalized();
        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized.timestamps(), table().timestamps());
        let rpm = normalized.column("engineRPM").unwrap();
        assert_eq!(rpm.max(), Some(Value::Integer(1600)));
        assert_eq!(rpm.values(), &[Some(0.5), Some(1.0), None]);
    }

    #[test]
    fn test_normalized_columns_cover_every_row() {
        let source = table().window(&TimeWindow::new(at(1000), at(5000)).unwrap());
        let normalized = source.normalized();
        assert_eq!(normalized.len(), 2);
        assert!(normalized.columns().iter().all(|c| c.values().len() == normalized.len()));
        let names: Vec<&str> = normalized.columns().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["vehicleSpeed", "engineRPM"]);
    }

    // ── summarize ────────────────────────────────────────────────────────────

    #[test]
    fn test_summarize_columns() {
        let summaries = summarize(&table(), &AttributeCatalog::builtin());
        assert_eq!(summaries.len(), 2);

        let speed = &summaries[0];
        assert_eq!(speed.name, "vehicleSpeed");
        assert_eq!(speed.label, "vehicle speed (max. 80.0 km/h)");
        assert_eq!(speed.present, 2);
        assert_eq!(speed.min, Some(Value::Float(20.0)));
        // Only rows with a speed value count: 0s and 3s.
        assert_eq!(speed.intervals.count, 1);
        assert_eq!(speed.intervals.mean, Some(3.0));

        let rpm = &summaries[1];
        assert_eq!(rpm.label, "engine RPM (max. 1600 rpm)");
        assert_eq!(rpm.intervals.mean, Some(1.0));
    }

    #[test]
    fn test_summarize_unknown_attribute_label() {
        let t = AlignedTable::new(
            vec![at(0)],
            vec![Column::new("oilPressure", vec![Some(Value::Float(3.5))])],
        )
        .unwrap();
        let summaries = summarize(&t, &AttributeCatalog::builtin());
        assert_eq!(summaries[0].label, "unknown (max. 3.5)");
    }

    // ── delta_t_series ───────────────────────────────────────────────────────

    #[test]
    fn test_delta_t_series() {
        let series = AttributeSeries::new(
            "vehicleSpeed",
            [0, 1000, 3000, 3500]
                .iter()
                .map(|&ms| Sample::new(at(ms), Value::Float(1.0)))
                .collect(),
        );
        let delta = delta_t_series(&series);
        assert_eq!(delta.name(), DELTA_T_NAME);
        assert_eq!(delta.len(), 3);
        assert_eq!(delta.samples()[0].timestamp, at(1000));
        let values: Vec<f64> = delta.samples().iter().map(|s| s.value.as_f64()).collect();
        assert_eq!(values, vec![1.0, 2.0, 0.5]);
    }

    #[test]
    fn test_delta_t_series_single_sample() {
        let series = AttributeSeries::new("vehicleSpeed", vec![Sample::new(at(0), Value::Float(1.0))]);
        assert!(delta_t_series(&series).is_empty());
    }
}
