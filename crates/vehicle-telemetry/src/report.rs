//! Plain-text reports for the `summary` and `intervals` commands.

use std::fmt::Write;

use telemetry_core::attributes::AttributeCatalog;
use telemetry_core::formatting::{format_number, format_optional, NOT_AVAILABLE};
use telemetry_core::models::TimeWindow;
use telemetry_core::statistics::IntervalStats;
use telemetry_core::time_utils::format_timestamp;
use telemetry_data::aggregator::{GroupReport, IntervalReport};
use telemetry_data::transform::ColumnSummary;

const DECIMALS: u32 = 3;

fn window_text(window: &TimeWindow) -> String {
    let bound = |b: Option<chrono::NaiveDateTime>| {
        b.map_or_else(|| "-".to_string(), |ts| format_timestamp(&ts))
    };
    format!("[{}, {})", bound(window.start), bound(window.end))
}

fn interval_line(stats: &IntervalStats) -> String {
    format!(
        "count {}  mean {}  std {}  min {}  max {}",
        stats.count,
        format_optional(stats.mean, DECIMALS),
        format_optional(stats.std, DECIMALS),
        format_optional(stats.min, DECIMALS),
        format_optional(stats.max, DECIMALS),
    )
}

/// Per-column summary of one subject.
pub fn render_summary(
    subject: &str,
    rows: usize,
    window: &TimeWindow,
    summaries: &[ColumnSummary],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Subject: {}", subject);
    let _ = writeln!(out, "Window:  {}", window_text(window));
    let _ = writeln!(out, "Rows:    {}", rows);

    for summary in summaries {
        let _ = writeln!(out);
        let _ = writeln!(out, "{} [{}]", summary.label, summary.name);
        let _ = writeln!(
            out,
            "  samples {}  min {}  max {}",
            summary.present,
            summary
                .min
                .map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string()),
            summary
                .max
                .map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string()),
        );
        let _ = writeln!(out, "  interval (s): {}", interval_line(&summary.intervals));
    }
    out
}

/// Per-subject interval table followed by the group averages.
pub fn render_intervals(
    reports: &[IntervalReport],
    groups: &GroupReport,
    catalog: &AttributeCatalog,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Sampling intervals (s)");

    let mut current: Option<&str> = None;
    for report in reports {
        if current != Some(report.subject.as_str()) {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", report.subject);
            current = Some(report.subject.as_str());
        }
        let _ = writeln!(
            out,
            "  {:<28} {}",
            catalog.get_or_default(&report.attribute).label(),
            interval_line(&report.stats)
        );
    }

    for group in &groups.groups {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "-------- {} / {} ({} subjects) --------",
            group.group,
            catalog.get_or_default(&group.attribute).label(),
            group.members.len()
        );
        let _ = writeln!(out, "count: {}", format_number(group.avg_count, 1));
        let _ = writeln!(out, "mean:  {}", format_optional(group.avg_mean, DECIMALS));
        let _ = writeln!(out, "std:   {}", format_optional(group.avg_std, DECIMALS));
    }

    if !groups.ungrouped.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Ungrouped: {}", groups.ungrouped.join(", "));
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
