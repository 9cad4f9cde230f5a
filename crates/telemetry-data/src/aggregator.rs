//! Sampling-interval statistics across subjects and subject groups.
//!
//! A root folder holds one sub-folder per subject (vehicle or bench session).
//! Every subject contributes one [`IntervalReport`] per attribute; groups
//! average those reports attribute by attribute.

use std::collections::BTreeMap;

use regex::Regex;
use serde::Serialize;
use telemetry_core::attributes::AttributeCatalog;
use telemetry_core::error::Result;
use telemetry_core::models::TimeWindow;
use telemetry_core::settings::{AnalysisConfig, GroupRule};
use telemetry_core::statistics::{mean, IntervalStats};
use tracing::{debug, info};

use crate::analysis::load_series;
use crate::reader::find_subject_folders;

/// Rules used when neither the command line nor the config names any group:
/// the two bench rigs by folder prefix, everything else a road vehicle.
pub fn default_group_rules() -> Vec<GroupRule> {
    vec![
        GroupRule::new("lab-1", "^lab-1"),
        GroupRule::new("lab-2", "^lab-2"),
        GroupRule::new("real-car", ".*"),
    ]
}

// ── IntervalReport ────────────────────────────────────────────────────────────

/// Interval statistics of one attribute of one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalReport {
    pub subject: String,
    pub attribute: String,
    pub stats: IntervalStats,
}

// ── GroupSummary ──────────────────────────────────────────────────────────────

/// Member-averaged interval statistics of one attribute within a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group: String,
    pub attribute: String,
    /// Subjects that contributed a report for this attribute.
    pub members: Vec<String>,
    pub avg_count: f64,
    pub avg_mean: Option<f64>,
    pub avg_std: Option<f64>,
}

/// Groups plus the subjects no rule matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupReport {
    pub groups: Vec<GroupSummary>,
    pub ungrouped: Vec<String>,
}

// ── IntervalAggregator ────────────────────────────────────────────────────────

/// Options for [`IntervalAggregator::scan_root`].
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Attributes to load per subject, in order. Empty means every file.
    pub attributes: Vec<String>,
    pub window: TimeWindow,
    /// Report only the first attribute of each subject.
    pub first_attribute_only: bool,
}

/// Stateless helper computing interval reports.
pub struct IntervalAggregator;

impl IntervalAggregator {
    /// Interval reports for every subject folder under `root`, subjects in
    /// name order, attributes in load order.
    pub fn scan_root(
        root: &std::path::Path,
        catalog: &AttributeCatalog,
        options: &ScanOptions,
    ) -> Result<Vec<IntervalReport>> {
        let subjects = find_subject_folders(root)?;
        let mut reports = Vec::new();

        for folder in &subjects {
            let subject = folder
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let config = AnalysisConfig::new(folder).with_attributes(options.attributes.clone());
            let series = load_series(&config, catalog)?;

            let take = if options.first_attribute_only { 1 } else { series.len() };
            for s in series.iter().take(take) {
                let stats = IntervalStats::for_series(s, Some(&options.window));
                debug!("{}/{}: {} intervals", subject, s.name(), stats.count);
                reports.push(IntervalReport {
                    subject: subject.clone(),
                    attribute: s.name().to_string(),
                    stats,
                });
            }
        }

        info!(
            "Computed {} interval reports across {} subjects",
            reports.len(),
            subjects.len()
        );
        Ok(reports)
    }

    /// Assign each subject to the first rule whose pattern matches its name
    /// and average the member statistics per `(group, attribute)`.
    ///
    /// Groups keep rule order; attributes within a group are sorted. Members
    /// with an undefined mean or std are left out of that average only.
    pub fn group(reports: &[IntervalReport], rules: &[GroupRule]) -> Result<GroupReport> {
        let compiled: Vec<(&GroupRule, Regex)> = rules
            .iter()
            .map(|rule| rule.compile().map(|re| (rule, re)))
            .collect::<Result<_>>()?;

        let mut buckets: Vec<BTreeMap<&str, Vec<&IntervalReport>>> =
            vec![BTreeMap::new(); compiled.len()];
        let mut ungrouped: Vec<String> = Vec::new();

        for report in reports {
            match compiled.iter().position(|(_, re)| re.is_match(&report.subject)) {
                Some(index) => buckets[index]
                    .entry(report.attribute.as_str())
                    .or_default()
                    .push(report),
                None => {
                    if !ungrouped.contains(&report.subject) {
                        ungrouped.push(report.subject.clone());
                    }
                }
            }
        }

        let groups = compiled
            .iter()
            .zip(buckets)
            .flat_map(|((rule, _), by_attribute)| {
                by_attribute
                    .into_iter()
                    .map(move |(attribute, members)| summarize_group(&rule.name, attribute, &members))
            })
            .collect();

        Ok(GroupReport { groups, ungrouped })
    }
}

fn summarize_group(group: &str, attribute: &str, members: &[&IntervalReport]) -> GroupSummary {
    let counts: Vec<f64> = members.iter().map(|r| r.stats.count as f64).collect();
    let means: Vec<f64> = members.iter().filter_map(|r| r.stats.mean).collect();
    let stds: Vec<f64> = members.iter().filter_map(|r| r.stats.std).collect();

    GroupSummary {
        group: group.to_string(),
        attribute: attribute.to_string(),
        members: members.iter().map(|r| r.subject.clone()).collect(),
        avg_count: mean(&counts).unwrap_or(0.0),
        avg_mean: mean(&means),
        avg_std: mean(&stds),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
