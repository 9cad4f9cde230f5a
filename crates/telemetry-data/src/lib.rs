//! Data layer for vehicle telemetry.
//!
//! Discovers and parses per-attribute log files, aligns them into a single
//! timestamp-indexed table, derives normalized views and sampling interval
//! statistics, and exports the result.

pub mod aggregator;
pub mod aligner;
pub mod analysis;
pub mod export;
pub mod reader;
pub mod transform;

pub use telemetry_core as core;
