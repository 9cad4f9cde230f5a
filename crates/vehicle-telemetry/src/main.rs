mod bootstrap;
mod report;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use telemetry_core::attributes::AttributeCatalog;
use telemetry_core::settings::{
    AlignArgs, AnalysisConfig, Command, IntervalsArgs, ProjectConfig, Settings, SummaryArgs,
};
use telemetry_data::aggregator::{default_group_rules, IntervalAggregator, ScanOptions};
use telemetry_data::analysis::analyze_subject;
use telemetry_data::export::{write_csv, write_json};
use telemetry_data::transform::{summarize, Normalize};

fn main() -> Result<()> {
    let settings = Settings::parse();

    bootstrap::setup_logging(settings.effective_log_level(), settings.log_file.as_ref())?;
    tracing::info!("vehicle-telemetry v{} starting", env!("CARGO_PKG_VERSION"));

    let config_path = bootstrap::config_path(settings.config.as_deref());
    let project = ProjectConfig::load_from(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    tracing::debug!(
        "Config {}: {} extra attributes, {} groups",
        config_path.display(),
        project.attributes.len(),
        project.groups.len()
    );
    let catalog = project.catalog();

    match &settings.command {
        Command::Align(args) => run_align(args, &catalog),
        Command::Summary(args) => run_summary(args, &catalog),
        Command::Intervals(args) => run_intervals(args, &project, &catalog),
        Command::Attributes => run_attributes(&catalog),
    }
}

// ── Commands ───────────────────────────────────────────────────────────────────

fn run_align(args: &AlignArgs, catalog: &AttributeCatalog) -> Result<()> {
    let window = args.selection.window()?;
    let config =
        AnalysisConfig::new(&args.subject_dir).with_attributes(args.selection.attributes.clone());
    let result = analyze_subject(&config, catalog, &window)?;

    let mut out = open_output(args.output.as_ref())?;
    match (args.format.as_str(), args.normalize) {
        ("json", false) => write_json(&result.table, &mut out)?,
        ("json", true) => write_json(&result.table.normalized(), &mut out)?,
        (_, false) => write_csv(&result.table, &mut out)?,
        (_, true) => write_csv(&result.table.normalized(), &mut out)?,
    }
    out.flush()?;

    if let Some(path) = &args.output {
        tracing::info!("Wrote {} rows to {}", result.metadata.rows, path.display());
    }
    Ok(())
}

fn run_summary(args: &SummaryArgs, catalog: &AttributeCatalog) -> Result<()> {
    let window = args.selection.window()?;
    let config =
        AnalysisConfig::new(&args.subject_dir).with_attributes(args.selection.attributes.clone());
    let result = analyze_subject(&config, catalog, &window)?;

    let summaries = summarize(&result.table, catalog);
    let text = report::render_summary(
        &args.subject_dir.display().to_string(),
        result.table.len(),
        &window,
        &summaries,
    );
    print!("{}", text);
    Ok(())
}

fn run_intervals(
    args: &IntervalsArgs,
    project: &ProjectConfig,
    catalog: &AttributeCatalog,
) -> Result<()> {
    let options = ScanOptions {
        attributes: args.selection.attributes.clone(),
        window: args.selection.window()?,
        first_attribute_only: args.first_attribute_only,
    };
    let reports = IntervalAggregator::scan_root(&args.root, catalog, &options)?;

    let rules = if !args.groups.is_empty() {
        args.groups.clone()
    } else if !project.groups.is_empty() {
        project.groups.clone()
    } else {
        default_group_rules()
    };
    let groups = IntervalAggregator::group(&reports, &rules)?;

    if args.json {
        let doc = serde_json::json!({ "subjects": reports, "groups": groups });
        let stdout = io::stdout();
        let mut out = stdout.lock();
        serde_json::to_writer_pretty(&mut out, &doc)?;
        writeln!(out)?;
    } else {
        print!("{}", report::render_intervals(&reports, &groups, catalog));
    }
    Ok(())
}

fn run_attributes(catalog: &AttributeCatalog) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (id, meta) in catalog.iter() {
        writeln!(
            out,
            "{:<28} {:<28} {:<6} {:?}",
            id,
            meta.label(),
            meta.unit,
            meta.kind
        )?;
    }
    Ok(())
}

// ── Helpers ────────────────────────────────────────────────────────────────────

/// Buffered writer for `--output`, or stdout.
fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    match path {
        Some(p) => {
            let file = File::create(p).with_context(|| format!("creating {}", p.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}
