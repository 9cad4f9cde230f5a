use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::attributes::AttributeCatalog;
use crate::error::{Result, TelemetryError};
use crate::models::TimeWindow;
use crate::time_utils::parse_user_timestamp;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Align and summarise vehicle sensor logs
#[derive(Parser, Debug, Clone)]
#[command(
    name = "vehicle-telemetry",
    about = "Align and summarise vehicle sensor logs",
    version
)]
pub struct Settings {
    /// Logging level
    #[arg(long, global = true, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path (logs always go to stderr as well)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Project config file (defaults to ~/.vehicle-telemetry/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Align one subject's attribute files into a single table and export it
    Align(AlignArgs),
    /// Per-attribute value range and sampling interval summary for one subject
    Summary(SummaryArgs),
    /// Sampling interval statistics for every subject under a root folder
    Intervals(IntervalsArgs),
    /// List the attribute catalog in effect
    Attributes,
}

/// Which attributes to load and which time range to keep.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Attribute to load, repeatable; order sets column order (default: every file, by name)
    #[arg(long = "attribute", value_name = "ID")]
    pub attributes: Vec<String>,

    /// Inclusive start of the time window
    #[arg(long, value_parser = parse_timestamp_arg)]
    pub start: Option<NaiveDateTime>,

    /// Exclusive end of the time window
    #[arg(long, value_parser = parse_timestamp_arg)]
    pub end: Option<NaiveDateTime>,
}

impl SelectionArgs {
    /// The `[start, end)` window described by the flags.
    pub fn window(&self) -> Result<TimeWindow> {
        TimeWindow::from_bounds(self.start, self.end)
    }
}

#[derive(Args, Debug, Clone)]
pub struct AlignArgs {
    /// Folder holding one log file per attribute
    #[arg(long)]
    pub subject_dir: PathBuf,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Divide every column by its maximum
    #[arg(long)]
    pub normalize: bool,

    /// Output format
    #[arg(long, default_value = "csv", value_parser = ["csv", "json"])]
    pub format: String,

    /// Write to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SummaryArgs {
    /// Folder holding one log file per attribute
    #[arg(long)]
    pub subject_dir: PathBuf,

    #[command(flatten)]
    pub selection: SelectionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct IntervalsArgs {
    /// Folder holding one sub-folder per subject
    #[arg(long)]
    pub root: PathBuf,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Subject group as NAME=REGEX, repeatable (matched against folder names)
    #[arg(long = "group", value_name = "NAME=REGEX")]
    pub groups: Vec<GroupRule>,

    /// Only use the first attribute of each subject
    #[arg(long)]
    pub first_attribute_only: bool,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl Settings {
    /// Log level after applying `--debug`.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }
}

/// clap value parser for window bounds.
fn parse_timestamp_arg(s: &str) -> std::result::Result<NaiveDateTime, String> {
    parse_user_timestamp(s).ok_or_else(|| {
        format!(
            "invalid timestamp {:?} (expected e.g. 2019-07-24T18:27:00 or 2019/07/24 18:27:00.0)",
            s
        )
    })
}

// ── GroupRule ──────────────────────────────────────────────────────────────────

/// Named regular expression that assigns subjects (folder names) to a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRule {
    pub name: String,
    pub pattern: String,
}

impl GroupRule {
    pub fn new(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
        }
    }

    /// Compile the pattern, mapping failures to [`TelemetryError::InvalidGroup`].
    pub fn compile(&self) -> Result<Regex> {
        Regex::new(&self.pattern)
            .map_err(|e| TelemetryError::InvalidGroup(format!("{}: {}", self.name, e)))
    }
}

impl FromStr for GroupRule {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (name, pattern) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=REGEX, got {:?}", s))?;
        let name = name.trim();
        if name.is_empty() || pattern.is_empty() {
            return Err(format!("expected NAME=REGEX, got {:?}", s));
        }
        let rule = GroupRule::new(name, pattern);
        rule.compile().map_err(|e| e.to_string())?;
        Ok(rule)
    }
}

// ── AnalysisConfig ─────────────────────────────────────────────────────────────

/// Explicit inputs for one parse-and-align run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Subject folder holding one file per attribute.
    pub input_folder: PathBuf,
    /// Attribute file names to load, in column order. Empty means every
    /// attribute file in the folder, sorted by name.
    pub attribute_files: Vec<String>,
}

impl AnalysisConfig {
    pub fn new(input_folder: impl Into<PathBuf>) -> Self {
        Self {
            input_folder: input_folder.into(),
            attribute_files: Vec::new(),
        }
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_files = attributes.into_iter().map(Into::into).collect();
        self
    }
}

// ── ProjectConfig ──────────────────────────────────────────────────────────────

/// Optional JSON file with extra attribute metadata and subject groups.
///
/// ```json
/// {
///   "attributes": { "fuelLevel": { "display_name": "fuel level", "unit": "%" } },
///   "groups": [ { "name": "lab1", "pattern": "^lab-1" } ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub attributes: AttributeCatalog,
    #[serde(default)]
    pub groups: Vec<GroupRule>,
}

impl ProjectConfig {
    /// `~/.vehicle-telemetry/config.json`.
    pub fn default_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".vehicle-telemetry").join("config.json")
    }

    /// Load from `path`. A missing file yields the default config; an
    /// unreadable or malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| TelemetryError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ProjectConfig = serde_json::from_str(&content)?;
        for rule in &config.groups {
            rule.compile()?;
        }
        Ok(config)
    }

    /// Built-in catalog overlaid with the entries from this config.
    pub fn catalog(&self) -> AttributeCatalog {
        let mut catalog = AttributeCatalog::builtin();
        catalog.merge(&self.attributes);
        catalog
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
