use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{AttributeSeries, TimeWindow};
use crate::time_utils::seconds_between;

// ── Differences ───────────────────────────────────────────────────────────────

/// Seconds between each timestamp and the one before it, in slice order.
///
/// Out-of-order input yields negative differences; sort first if that is not
/// wanted. Fewer than two timestamps give an empty vector.
pub fn consecutive_differences(timestamps: &[NaiveDateTime]) -> Vec<f64> {
    timestamps
        .windows(2)
        .map(|pair| seconds_between(pair[0], pair[1]))
        .collect()
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n − 1 denominator), `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() as f64 - 1.0)).sqrt())
}

// ── IntervalStats ─────────────────────────────────────────────────────────────

/// Summary of the gaps between consecutive samples, in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntervalStats {
    /// Number of differences (one less than the number of samples).
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl IntervalStats {
    /// Aggregate a sequence of differences.
    pub fn from_differences(diffs: &[f64]) -> Self {
        Self {
            count: diffs.len(),
            mean: mean(diffs),
            std: sample_std(diffs),
            min: diffs.iter().copied().reduce(f64::min),
            max: diffs.iter().copied().reduce(f64::max),
        }
    }

    /// Statistics over a list of timestamps, taken in the given order.
    pub fn from_timestamps(timestamps: &[NaiveDateTime]) -> Self {
        Self::from_differences(&consecutive_differences(timestamps))
    }

    /// Statistics over one series' sampling instants, optionally restricted to
    /// `window` before differencing.
    pub fn for_series(series: &AttributeSeries, window: Option<&TimeWindow>) -> Self {
        let timestamps: Vec<NaiveDateTime> = series
            .samples()
            .iter()
            .map(|s| s.timestamp)
            .filter(|ts| window.map_or(true, |w| w.contains(ts)))
            .collect();
        Self::from_timestamps(&timestamps)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
