use crate::attributes::AttributeMeta;
use crate::models::Value;

/// Placeholder printed for statistics that are undefined (e.g. the standard
/// deviation of a single interval).
pub const NOT_AVAILABLE: &str = "n/a";

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use telemetry_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let formatted = format!("{:.prec$}", value.abs(), prec = decimals as usize);

    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (formatted.as_str(), None),
    };

    let mut result = group_thousands(int_part);
    if let Some(frac) = frac_part {
        result.push('.');
        result.push_str(frac);
    }

    if negative && result.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format an optional statistic, printing [`NOT_AVAILABLE`] for `None`.
///
/// ```
/// use telemetry_core::formatting::format_optional;
///
/// assert_eq!(format_optional(Some(0.5), 3), "0.500");
/// assert_eq!(format_optional(None, 3), "n/a");
/// ```
pub fn format_optional(value: Option<f64>, decimals: u32) -> String {
    match value {
        Some(v) => format_number(v, decimals),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Legend label for a column: `"<display name> (max. <max> <unit>)"`.
///
/// Built from the raw maximum, so it must be computed before the column is
/// normalized. A column without any sample shows [`NOT_AVAILABLE`] as its
/// maximum; an empty unit leaves no trailing space.
pub fn legend_label(meta: &AttributeMeta, max: Option<Value>) -> String {
    let max = max.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string());
    if meta.unit.is_empty() {
        format!("{} (max. {})", meta.label(), max)
    } else {
        format!("{} (max. {} {})", meta.label(), max, meta.unit)
    }
}

/// Insert `,` every three digits from the right of an all-digit string.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::UNKNOWN_ATTRIBUTE;
    use crate::models::ValueKind;

    // ── format_number ────────────────────────────────────────────────────────

    #[test]
    fn test_format_number_grouping() {
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(1000.0, 0), "1,000");
        assert_eq!(format_number(6512.25, 2), "6,512.25");
    }

    #[test]
    fn test_format_number_rounding() {
        assert_eq!(format_number(0.70710678, 3), "0.707");
        assert_eq!(format_number(1.9999, 2), "2.00");
    }

    #[test]
    fn test_format_number_negative_zero_has_no_sign() {
        assert_eq!(format_number(-0.0001, 2), "0.00");
        assert_eq!(format_number(-2.5, 1), "-2.5");
    }

    // ── format_optional ──────────────────────────────────────────────────────

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(Some(1.5), 1), "1.5");
        assert_eq!(format_optional(None, 1), NOT_AVAILABLE);
    }

    // ── legend_label ─────────────────────────────────────────────────────────

    #[test]
    fn test_legend_label_with_unit() {
        let meta = AttributeMeta::new("vehicle speed", "km/h", ValueKind::Float);
        assert_eq!(
            legend_label(&meta, Some(Value::Float(92.0))),
            "vehicle speed (max. 92.0 km/h)"
        );
    }

    #[test]
    fn test_legend_label_unknown_attribute() {
        assert_eq!(
            legend_label(&UNKNOWN_ATTRIBUTE, Some(Value::Integer(7))),
            "unknown (max. 7)"
        );
    }

    #[test]
    fn test_legend_label_no_samples() {
        let meta = AttributeMeta::new("engine load", "%", ValueKind::Float);
        assert_eq!(legend_label(&meta, None), "engine load (max. n/a %)");
    }
}
