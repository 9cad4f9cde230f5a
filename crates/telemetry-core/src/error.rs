use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the telemetry pipeline.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The date/time fields of a log line did not match the log timestamp format.
    #[error("Malformed timestamp in {path} at line {line}: {content:?}")]
    MalformedTimestamp {
        path: PathBuf,
        line: usize,
        content: String,
    },

    /// The value field of a log line is missing or not of the attribute's numeric kind.
    #[error("Malformed value in {path} at line {line}: {token:?}")]
    MalformedValue {
        path: PathBuf,
        line: usize,
        token: String,
    },

    /// Two series handed to the aligner share a column name.
    #[error("Duplicate attribute: {0}")]
    DuplicateAttribute(String),

    /// The aligner was given zero series.
    #[error("No attribute series to align")]
    EmptyInput,

    /// An attribute identifier has no entry in the catalog.
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    /// The expected input directory does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// A subject folder holds no attribute files.
    #[error("No attribute files found in {0}")]
    NoAttributeFiles(PathBuf),

    /// A time window whose start lies after its end.
    #[error("Invalid time window: start {start} is after end {end}")]
    InvalidWindow { start: String, end: String },

    /// A subject grouping rule could not be parsed or compiled.
    #[error("Invalid group rule: {0}")]
    InvalidGroup(String),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the telemetry crates.
pub type Result<T> = std::result::Result<T, TelemetryError>;
