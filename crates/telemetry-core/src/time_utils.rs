use chrono::NaiveDateTime;

// ── Formats ───────────────────────────────────────────────────────────────────

/// Format of the joined `<date> <time>` fields of a log line.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.f";

/// Format used when timestamps are written out (CSV, JSON, reports).
pub const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Formats accepted for timestamps typed by a user (window bounds, etc.).
const USER_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Join a log line's date and time tokens and parse them with
/// [`LOG_TIMESTAMP_FORMAT`].
///
/// The fractional-second part is mandatory: `18:10:00` is rejected while
/// `18:10:00.0` is accepted.
pub fn parse_log_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    if !time.contains('.') {
        return None;
    }
    let combined = format!("{} {}", date, time);
    NaiveDateTime::parse_from_str(&combined, LOG_TIMESTAMP_FORMAT).ok()
}

/// Parse a timestamp supplied on the command line or in a config file.
///
/// Accepts ISO-8601 (`T` or space separated) as well as the log's own
/// slash-separated form, with optional seconds fraction.
pub fn parse_user_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    USER_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

// ── Formatting / arithmetic ───────────────────────────────────────────────────

/// Render a timestamp with microsecond precision in ISO-8601 form.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(EXPORT_TIMESTAMP_FORMAT).to_string()
}

/// Signed number of seconds from `from` to `to`, with microsecond resolution.
pub fn seconds_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    let delta = to - from;
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        None => delta.num_seconds() as f64,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
