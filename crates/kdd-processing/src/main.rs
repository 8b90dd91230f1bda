//! CLI entry point for the NSL-KDD dataset processor.

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::Parser;
use kdd_processing::{DatasetProcessor, DatasetSplits, ProcessingConfig, ProcessingReport, SplitKind};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Stratified train/validation/test splitting for NSL-KDD ARFF datasets",
    long_about = "Loads an ARFF file (falling back to a repaired or header-less NSL-KDD parse when\n\
                  the file is malformed), splits it 60/20/20 stratified by the label column and\n\
                  prints split sizes and label distributions.\n\n\
                  EXAMPLES:\n  \
                  # Basic usage\n  \
                  kdd-processing -i KDDTrain+.arff\n\n  \
                  # Different seed, machine-readable output\n  \
                  kdd-processing -i KDDTrain+.arff --seed 7 --json\n\n  \
                  # Save histograms and the split tables\n  \
                  kdd-processing -i KDDTrain+.arff --histogram-dir charts/ --export-dir splits/"
)]
struct Args {
    /// Path to the ARFF file to process
    #[arg(short, long)]
    input: String,

    /// Preferred label (stratification) column
    ///
    /// When absent from the file, the first column containing "protocol" is used
    #[arg(long, default_value = kdd_processing::config::DEFAULT_LABEL_COLUMN)]
    label: String,

    /// Seed shared by both split stages
    #[arg(long, default_value_t = kdd_processing::config::DEFAULT_SEED)]
    seed: u64,

    /// Skip the dataset description (shape, dtypes, numeric statistics)
    #[arg(long)]
    no_dataset_info: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Write train.png, validation.png and test.png to this directory
    #[arg(long)]
    histogram_dir: Option<String>,

    /// Write train.csv, validation.csv and test.csv to this directory
    #[arg(long)]
    export_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = ProcessingConfig::builder()
        .label_column(&args.label)
        .seed(args.seed)
        .include_dataset_info(!args.no_dataset_info)
        .build()?;
    let processor = DatasetProcessor::new(config)?;

    info!("Loading dataset from: {}", args.input);
    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {} as UTF-8 text", args.input))?;

    let (report, splits) = processor.process_with_splits(raw)?;

    if let Some(ref dir) = args.histogram_dir {
        write_histograms(&report, dir)?;
    }
    if let Some(ref dir) = args.export_dir {
        export_splits(splits, dir)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(&report, &args);
    Ok(())
}

/// Decode the report's histograms and write them as PNG files.
fn write_histograms(report: &ProcessingReport, dir: &str) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    for (kind, encoded) in report.histograms.iter() {
        if encoded.is_empty() {
            continue;
        }
        let path = Path::new(dir).join(format!("{}.png", kind.as_str()));
        let bytes = STANDARD.decode(encoded)?;
        std::fs::write(&path, bytes)?;
        info!("Histogram written to: {}", path.display());
    }
    Ok(())
}

/// Write each split as CSV.
fn export_splits(splits: DatasetSplits, dir: &str) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let frames = [
        (SplitKind::Train, splits.train),
        (SplitKind::Validation, splits.validation),
        (SplitKind::Test, splits.test),
    ];
    for (kind, mut frame) in frames {
        let path = Path::new(dir).join(format!("{}.csv", kind.as_str()));
        let mut file = File::create(&path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut frame)?;
        info!("{} written to: {}", kind.display_name(), path.display());
    }
    Ok(())
}

/// Print a human-readable summary of the processing results.
fn print_human_readable_summary(report: &ProcessingReport, args: &Args) {
    println!();
    println!("{}", "=".repeat(80));
    println!("DATASET PROCESSING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!("Input:          {}", args.input);
    println!("Load strategy:  {}", report.load_strategy);
    if report.dropped_rows > 0 {
        println!("Dropped rows:   {}", report.dropped_rows);
    }
    println!("Label column:   {}", report.label_column);
    println!("Instances:      {}", report.total_instances);
    println!("Features:       {}", report.feature_count);
    println!();

    println!("Split Sizes:");
    for (kind, size) in report.split_sizes.iter() {
        let share = if report.total_instances > 0 {
            *size as f64 / report.total_instances as f64 * 100.0
        } else {
            0.0
        };
        println!("  {:<16} {:>8} ({:.1}%)", kind.display_name(), size, share);
    }
    println!();

    println!("{} Distribution:", report.label_column);
    for kind in SplitKind::ALL {
        let frequency = report.protocol_type_distribution.get(kind);
        let counts: Vec<String> = frequency
            .entries()
            .iter()
            .map(|(label, count)| format!("{label}={count}"))
            .collect();
        println!("  {:<16} {}", kind.display_name(), counts.join(", "));
    }
    println!();

    if let Some(ref info) = report.dataset_info {
        println!(
            "Dataset Info: {} rows x {} columns, {} numeric",
            info.shape.0,
            info.shape.1,
            info.description.len()
        );
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
