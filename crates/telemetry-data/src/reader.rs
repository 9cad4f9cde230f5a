//! Attribute log discovery and parsing.
//!
//! A subject folder holds one plain-text file per attribute; every line is
//! `<YYYY/MM/DD> <HH:MM:SS.ffffff> <value>`. This module lists those files and
//! turns each one into an [`AttributeSeries`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use telemetry_core::error::{Result, TelemetryError};
use telemetry_core::models::{AttributeSeries, Sample, ValueKind};
use telemetry_core::settings::AnalysisConfig;
use telemetry_core::time_utils::parse_log_timestamp;
use tracing::debug;

// ── Discovery ─────────────────────────────────────────────────────────────────

/// List the attribute files directly inside `folder`, sorted by file name.
///
/// Hidden files (leading `.`) and sub-directories are ignored.
pub fn find_attribute_files(folder: &Path) -> Result<Vec<PathBuf>> {
    list_children(folder, |entry| entry.file_type().is_file())
}

/// List the subject folders directly inside `root`, sorted by name.
pub fn find_subject_folders(root: &Path) -> Result<Vec<PathBuf>> {
    list_children(root, |entry| entry.file_type().is_dir())
}

/// Attribute identifier for a log file: its file name, trimmed.
pub fn attribute_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

/// Resolve the `(attribute, path)` pairs described by `config`.
///
/// Explicit attribute names are kept in the given order; otherwise every
/// attribute file in the folder is used in file-name order.
pub fn resolve_attribute_files(config: &AnalysisConfig) -> Result<Vec<(String, PathBuf)>> {
    let folder = &config.input_folder;
    if !folder.is_dir() {
        return Err(TelemetryError::DataPathNotFound(folder.clone()));
    }

    let files = find_attribute_files(folder)?;

    if !config.attribute_files.is_empty() {
        // Match on trimmed names: the collector writes some files with
        // trailing whitespace.
        return Ok(config
            .attribute_files
            .iter()
            .map(|requested| {
                let name = requested.trim().to_string();
                let path = files
                    .iter()
                    .find(|p| attribute_name(p).as_deref() == Some(name.as_str()))
                    .cloned()
                    .unwrap_or_else(|| folder.join(requested));
                (name, path)
            })
            .collect());
    }

    if files.is_empty() {
        return Err(TelemetryError::NoAttributeFiles(folder.clone()));
    }

    Ok(files
        .into_iter()
        .filter_map(|path| attribute_name(&path).map(|name| (name, path)))
        .collect())
}

fn list_children(dir: &Path, keep: impl Fn(&walkdir::DirEntry) -> bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(TelemetryError::DataPathNotFound(dir.to_path_buf()));
    }

    let mut children: Vec<PathBuf> = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(dir).to_path_buf();
                if is_hidden(&path) {
                    debug!("Skipping unreadable hidden entry {}", path.display());
                    continue;
                }
                return Err(TelemetryError::FileRead {
                    path,
                    source: std::io::Error::from(err),
                });
            }
        };
        if is_hidden(entry.path()) {
            debug!("Skipping hidden entry {}", entry.path().display());
            continue;
        }
        if keep(&entry) {
            children.push(entry.into_path());
        }
    }

    Ok(children)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map_or(false, |n| n.to_string_lossy().starts_with('.'))
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse one attribute log file.
///
/// Samples are returned in file order. The first malformed line aborts the
/// whole file; blank lines are skipped.
pub fn parse_log_file(path: &Path, name: &str, kind: ValueKind) -> Result<AttributeSeries> {
    let file = File::open(path).map_err(|source| TelemetryError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_log_reader(BufReader::new(file), path, name, kind)
}

/// Parse log lines from any buffered reader. `path` is only used for error
/// context.
pub fn parse_log_reader<R: BufRead>(
    reader: R,
    path: &Path,
    name: &str,
    kind: ValueKind,
) -> Result<AttributeSeries> {
    let mut samples: Vec<Sample> = Vec::new();
    let mut blank_lines = 0usize;

    for (index, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|source| TelemetryError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        match parse_line(&line, path, index + 1, kind)? {
            Some(sample) => samples.push(sample),
            None => blank_lines += 1,
        }
    }

    debug!(
        "File {}: {} samples, {} blank lines",
        path.display(),
        samples.len(),
        blank_lines
    );

    Ok(AttributeSeries::new(name, samples))
}

/// Parse a single line. `Ok(None)` for blank lines.
fn parse_line(line: &str, path: &Path, line_no: usize, kind: ValueKind) -> Result<Option<Sample>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let mut fields = trimmed.split_whitespace();
    let (date, time) = match (fields.next(), fields.next()) {
        (Some(date), Some(time)) => (date, time),
        _ => {
            return Err(TelemetryError::MalformedTimestamp {
                path: path.to_path_buf(),
                line: line_no,
                content: trimmed.to_string(),
            })
        }
    };

    let timestamp =
        parse_log_timestamp(date, time).ok_or_else(|| TelemetryError::MalformedTimestamp {
            path: path.to_path_buf(),
            line: line_no,
            content: format!("{} {}", date, time),
        })?;

    let malformed_value = |token: String| TelemetryError::MalformedValue {
        path: path.to_path_buf(),
        line: line_no,
        token,
    };

    let token = fields.next().ok_or_else(|| malformed_value(String::new()))?;
    let rest: Vec<&str> = fields.collect();
    if !rest.is_empty() {
        return Err(malformed_value(format!("{} {}", token, rest.join(" "))));
    }

    let value = kind
        .parse(token)
        .ok_or_else(|| malformed_value(token.to_string()))?;

    Ok(Some(Sample::new(timestamp, value)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use telemetry_core::models::Value;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn write_log(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    fn parse_str(content: &str, kind: ValueKind) -> Result<AttributeSeries> {
        parse_log_reader(content.as_bytes(), Path::new("vehicleSpeed"), "vehicleSpeed", kind)
    }

    // ── parse_log_file ────────────────────────────────────────────────────────

    #[test]
    fn test_parse_single_line() {
        let dir = TempDir::new().unwrap();
        let path = write_log(dir.path(), "vehicleSpeed", &["2019/07/24 18:10:00.123456 55.0"]);

        let series = parse_log_file(&path, "vehicleSpeed", ValueKind::Float).unwrap();

        let expected = NaiveDate::from_ymd_opt(2019, 7, 24)
            .unwrap()
            .and_hms_micro_opt(18, 10, 0, 123_456)
            .unwrap();
        assert_eq!(series.name(), "vehicleSpeed");
        assert_eq!(series.samples(), &[Sample::new(expected, Value::Float(55.0))]);
    }

    #[test]
    fn test_parse_preserves_file_order() {
        let series = parse_str(
            "2019/07/24 18:10:02.000000 3\n2019/07/24 18:10:01.000000 2\n2019/07/24 18:10:03.000000 4\n",
            ValueKind::Float,
        )
        .unwrap();
        let values: Vec<f64> = series.samples().iter().map(|s| s.value.as_f64()).collect();
        assert_eq!(values, vec![3.0, 2.0, 4.0]);
        assert!(!series.is_monotonic());
    }

    #[test]
    fn test_parse_keeps_duplicate_timestamps() {
        let series = parse_str(
            "2019/07/24 18:10:00.000000 1\n2019/07/24 18:10:00.000000 2\n",
            ValueKind::Float,
        )
        .unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let series = parse_str(
            "\n2019/07/24 18:10:00.000000 1\n   \n2019/07/24 18:10:01.000000 2\n",
            ValueKind::Float,
        )
        .unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_parse_integer_kind() {
        let series = parse_str("2019/07/24 18:10:00.5 3000\n", ValueKind::Integer).unwrap();
        assert_eq!(series.samples()[0].value, Value::Integer(3000));
    }

    #[test]
    fn test_parse_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = parse_log_file(&dir.path().join("engineLoad"), "engineLoad", ValueKind::Float)
            .unwrap_err();
        assert!(matches!(err, TelemetryError::FileRead { .. }));
    }

    // ── Malformed input ──────────────────────────────────────────────────────

    #[test]
    fn test_parse_bad_time_fails_whole_file() {
        let err = parse_str(
            "2019/07/24 18:10:00.000000 1\n2019/07/24 badtime 10.0\n2019/07/24 18:10:02.000000 3\n",
            ValueKind::Float,
        )
        .unwrap_err();

        match err {
            TelemetryError::MalformedTimestamp { line, content, .. } => {
                assert_eq!(line, 2);
                assert_eq!(content, "2019/07/24 badtime");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_parse_single_field_is_malformed_timestamp() {
        let err = parse_str("2019/07/24\n", ValueKind::Float).unwrap_err();
        assert!(matches!(err, TelemetryError::MalformedTimestamp { line: 1, .. }));
    }

    #[test]
    fn test_parse_missing_fraction_is_malformed_timestamp() {
        let err = parse_str("2019/07/24 18:10:00 1.0\n", ValueKind::Float).unwrap_err();
        assert!(matches!(err, TelemetryError::MalformedTimestamp { .. }));
    }

    #[test]
    fn test_parse_bad_value() {
        let err = parse_str("2019/07/24 18:10:00.000000 fast\n", ValueKind::Float).unwrap_err();
        match err {
            TelemetryError::MalformedValue { line, token, .. } => {
                assert_eq!(line, 1);
                assert_eq!(token, "fast");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_parse_missing_value() {
        let err = parse_str("2019/07/24 18:10:00.000000\n", ValueKind::Float).unwrap_err();
        assert!(matches!(err, TelemetryError::MalformedValue { ref token, .. } if token.is_empty()));
    }

    #[test]
    fn test_parse_extra_tokens() {
        let err = parse_str("2019/07/24 18:10:00.000000 vehicleSpeed = 40\n", ValueKind::Float)
            .unwrap_err();
        assert!(matches!(err, TelemetryError::MalformedValue { ref token, .. } if token == "vehicleSpeed = 40"));
    }

    #[test]
    fn test_parse_float_for_integer_kind() {
        let err = parse_str("2019/07/24 18:10:00.000000 12.5\n", ValueKind::Integer).unwrap_err();
        assert!(matches!(err, TelemetryError::MalformedValue { .. }));
    }

    // ── Discovery ────────────────────────────────────────────────────────────

    #[test]
    fn test_find_attribute_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "vehicleSpeed", &[]);
        write_log(dir.path(), "engineLoad", &[]);
        write_log(dir.path(), ".DS_Store", &[]);
        std::fs::create_dir(dir.path().join("plots")).unwrap();

        let files = find_attribute_files(dir.path()).unwrap();
        let names: Vec<String> = files.iter().filter_map(|p| attribute_name(p)).collect();
        assert_eq!(names, vec!["engineLoad", "vehicleSpeed"]);
    }

    #[test]
    fn test_find_subject_folders() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("lab-2-01")).unwrap();
        std::fs::create_dir(dir.path().join("lab-1-17")).unwrap();
        write_log(dir.path(), "notes.txt", &[]);

        let folders = find_subject_folders(dir.path()).unwrap();
        let names: Vec<String> = folders.iter().filter_map(|p| attribute_name(p)).collect();
        assert_eq!(names, vec!["lab-1-17", "lab-2-01"]);
    }

    #[test]
    fn test_find_attribute_files_missing_dir() {
        let err = find_attribute_files(Path::new("/tmp/does-not-exist-telemetry-xyz")).unwrap_err();
        assert!(matches!(err, TelemetryError::DataPathNotFound(_)));
    }

    #[test]
    fn test_attribute_name_trims() {
        assert_eq!(
            attribute_name(Path::new("car/runtimeSinceEngineStart ")),
            Some("runtimeSinceEngineStart".to_string())
        );
    }

    // ── resolve_attribute_files ──────────────────────────────────────────────

    #[test]
    fn test_resolve_explicit_order() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "vehicleSpeed", &[]);
        write_log(dir.path(), "engineRPM", &[]);

        let config = AnalysisConfig::new(dir.path()).with_attributes(["vehicleSpeed", "engineRPM"]);
        let resolved = resolve_attribute_files(&config).unwrap();
        let names: Vec<&str> = resolved.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["vehicleSpeed", "engineRPM"]);
        assert_eq!(resolved[0].1, dir.path().join("vehicleSpeed"));
    }

    #[test]
    fn test_resolve_explicit_matches_trailing_space_file() {
        let dir = TempDir::new().unwrap();
        let on_disk = write_log(
            dir.path(),
            "runtimeSinceEngineStart ",
            &["2019/07/24 18:10:00.000000 12.0"],
        );
        write_log(dir.path(), "vehicleSpeed", &[]);

        let config = AnalysisConfig::new(dir.path())
            .with_attributes(["runtimeSinceEngineStart", "vehicleSpeed"]);
        let resolved = resolve_attribute_files(&config).unwrap();
        assert_eq!(resolved[0].0, "runtimeSinceEngineStart");
        assert_eq!(resolved[0].1, on_disk);

        let series = parse_log_file(&resolved[0].1, &resolved[0].0, ValueKind::Float).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_resolve_explicit_missing_file_falls_back_to_join() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "vehicleSpeed", &[]);

        let config = AnalysisConfig::new(dir.path()).with_attributes(["engineLoad"]);
        let resolved = resolve_attribute_files(&config).unwrap();
        assert_eq!(resolved[0].1, dir.path().join("engineLoad"));
        let err = parse_log_file(&resolved[0].1, "engineLoad", ValueKind::Float).unwrap_err();
        assert!(matches!(err, TelemetryError::FileRead { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_find_attribute_files_dangling_symlink_fails() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "vehicleSpeed", &[]);
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("engineRPM")).unwrap();

        let err = find_attribute_files(dir.path()).unwrap_err();
        assert!(matches!(err, TelemetryError::FileRead { ref path, .. } if path.ends_with("engineRPM")));
    }

    #[cfg(unix)]
    #[test]
    fn test_find_attribute_files_ignores_hidden_dangling_symlink() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "vehicleSpeed", &[]);
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join(".lock")).unwrap();

        let files = find_attribute_files(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("vehicleSpeed")]);
    }

    #[test]
    fn test_resolve_discovers_when_no_list() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "vehicleSpeed", &[]);
        write_log(dir.path(), "engineRPM", &[]);

        let resolved = resolve_attribute_files(&AnalysisConfig::new(dir.path())).unwrap();
        let names: Vec<&str> = resolved.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["engineRPM", "vehicleSpeed"]);
    }

    #[test]
    fn test_resolve_empty_folder() {
        let dir = TempDir::new().unwrap();
        let err = resolve_attribute_files(&AnalysisConfig::new(dir.path())).unwrap_err();
        assert!(matches!(err, TelemetryError::NoAttributeFiles(_)));
    }
}
