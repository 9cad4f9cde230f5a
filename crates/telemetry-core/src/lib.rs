//! Shared model and utilities for the vehicle telemetry tools.
//!
//! Holds the sample / series / aligned-table data model, the error type,
//! the attribute catalog, timestamp helpers, interval statistics, report
//! formatting and the CLI / config-file settings.

pub mod attributes;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod statistics;
pub mod time_utils;

pub use error::{Result, TelemetryError};
