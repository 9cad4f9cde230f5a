use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use telemetry_core::settings::ProjectConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` name to a tracing filter directive.
///
/// Unrecognised names are passed through unchanged so that full
/// `EnvFilter` directives (e.g. `telemetry_data=debug`) also work.
pub fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Everything goes to stderr so stdout only carries exported data. With
/// `log_file`, the same events are appended to that file without ANSI colours.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(level_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}

// ── Config discovery ───────────────────────────────────────────────────────────

/// `--config` when given, else `~/.vehicle-telemetry/config.json`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(ProjectConfig::default_path)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── level_directive ───────────────────────────────────────────────────────

    #[test]
    fn test_level_directive_maps_names() {
        assert_eq!(level_directive("DEBUG"), "debug");
        assert_eq!(level_directive("info"), "info");
        assert_eq!(level_directive("WARNING"), "warn");
        assert_eq!(level_directive("CRITICAL"), "error");
    }

    #[test]
    fn test_level_directive_passes_directives_through() {
        let directive = level_directive("telemetry_data=debug");
        assert_eq!(directive, "telemetry_data=debug");
        assert!(EnvFilter::try_new(directive).is_ok());
    }

    // ── config_path ───────────────────────────────────────────────────────────

    #[test]
    fn test_config_path_prefers_explicit() {
        let tmp = TempDir::new().expect("tempdir");
        let explicit = tmp.path().join("custom.json");
        assert_eq!(config_path(Some(&explicit)), explicit);
    }

    #[test]
    fn test_config_path_defaults_under_home() {
        let path = config_path(None);
        assert!(path.ends_with(".vehicle-telemetry/config.json"));
    }
}
