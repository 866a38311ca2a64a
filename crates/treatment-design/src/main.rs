//! CLI entry point for feature treatment design.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use treatment_design::{
    Bucket, FittedState, MissingValueStrategy, TargetKind, TreatmentConfig, TreatmentDesign,
    TreatmentSummary,
};

/// CLI-compatible target kind enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliTargetKind {
    /// Class labels
    Categorical,
    /// Continuous values
    Numerical,
}

impl From<CliTargetKind> for TargetKind {
    fn from(cli: CliTargetKind) -> Self {
        match cli {
            CliTargetKind::Categorical => TargetKind::Categorical,
            CliTargetKind::Numerical => TargetKind::Numerical,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Feature treatment design for tabular data",
    long_about = "Learns how each column of a CSV file should be treated before modelling.\n\n\
                  EXAMPLES:\n  \
                  # Fit on a training file\n  \
                  treatment-design -i train.csv --index id --target label\n\n  \
                  # Recover numbers stored as text and apply the design to a test file\n  \
                  treatment-design -i train.csv --target label --find-hidden-numerics \\\n    \
                  --transform test.csv -o treated.csv\n\n  \
                  # Machine-readable summary\n  \
                  treatment-design -i train.csv --json | jq .treatment_columns"
)]
struct Args {
    /// Path to the CSV file to fit on
    #[arg(short, long)]
    input: String,

    /// Path to a CSV file to transform with the fitted design
    #[arg(long)]
    transform: Option<String>,

    /// Write the treated table (fitted or transformed) to this CSV file
    #[arg(short, long)]
    output: Option<String>,

    /// JSON file with a full treatment configuration
    ///
    /// Command line flags are applied on top of it.
    #[arg(short, long)]
    config: Option<String>,

    /// Row identifier column, moved to the front
    #[arg(long)]
    index: Option<String>,

    /// Target column, moved to the back
    #[arg(short, long)]
    target: Option<String>,

    /// Kind of target column
    #[arg(long, value_enum)]
    target_kind: Option<CliTargetKind>,

    /// Recover numbers and booleans stored as text
    #[arg(long)]
    find_hidden_numerics: bool,

    /// Mark float columns holding only whole numbers for integer storage
    #[arg(long)]
    floats_to_ints: bool,

    /// Fill missing floats with the column mean instead of a constant
    #[arg(long)]
    random_fill: bool,

    /// Keep zero-variance columns in the treatment list
    #[arg(long)]
    keep_zero_variance: bool,

    /// Row share at or below which a level is rare (0.0 - 1.0)
    #[arg(long)]
    rare_level_threshold: Option<f64>,

    /// Share of rows rare levels may cover before a column is high-cardinality (0.0 - 1.0)
    #[arg(long)]
    max_rare_percentage: Option<f64>,

    /// Constant written into missing numeric entries
    #[arg(long, allow_hyphen_values = true)]
    numerical_fill_value: Option<f64>,

    /// Constant written into missing text and categorical entries
    #[arg(long)]
    categorical_fill_value: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only outputs the fitted summary.
    #[arg(long)]
    json: bool,
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

    let config = build_config(&args)?;

    info!("Loading dataset from: {}", args.input);
    let data = load_csv_with_fallbacks(&args.input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    let mut design = TreatmentDesign::builder().config(config).build()?;
    let fitted = match design.fit(&data) {
        Ok(fitted) => fitted,
        Err(e) => {
            error!("Fit failed [{}]: {}", e.error_code(), e);
            return Err(anyhow!("Fit failed: {}", e));
        }
    };

    let mut treated = match args.transform {
        Some(ref path) => {
            info!("Transforming: {}", path);
            let new_data = load_csv_with_fallbacks(path)?;
            let transformed = design.transform(&new_data)?;
            for skipped in &transformed.diagnostics {
                warn!(
                    "{}: '{}' skipped: {}",
                    skipped.stage.display_name(),
                    skipped.column,
                    skipped.reason
                );
            }
            transformed.df
        }
        None => fitted.table().clone(),
    };

    if let Some(ref output) = args.output {
        write_csv(&mut treated, output)?;
        info!("Treated table written to: {}", output);
    }

    let summary = fitted.summary();
    if args.json {
        println!("{}", summary.to_json()?);
        return Ok(());
    }

    print_human_readable_summary(&summary, &fitted, &args);
    Ok(())
}

/// Merge the optional JSON configuration file with command line flags.
fn build_config(args: &Args) -> Result<TreatmentConfig> {
    let base = match args.config {
        Some(ref path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Could not read config file {}", path))?;
            TreatmentConfig::from_json(&content)
                .with_context(|| format!("Invalid config file {}", path))?
        }
        None => TreatmentConfig::default(),
    };

    let mut builder = TreatmentConfig::builder()
        .target_kind(args.target_kind.map(Into::into).unwrap_or(base.target_kind))
        .missing_value_strategy(if args.random_fill {
            MissingValueStrategy::Random
        } else {
            base.missing_value_strategy
        })
        .numerical_fill_value(args.numerical_fill_value.unwrap_or(base.numerical_fill_value))
        .categorical_fill_value(
            args.categorical_fill_value
                .clone()
                .unwrap_or(base.categorical_fill_value),
        )
        .rare_level_threshold(args.rare_level_threshold.unwrap_or(base.rare_level_threshold))
        .max_rare_percentage(args.max_rare_percentage.unwrap_or(base.max_rare_percentage))
        .exclude_zero_variance(base.exclude_zero_variance && !args.keep_zero_variance)
        .floats_to_ints(base.floats_to_ints || args.floats_to_ints)
        .ints_as_categories(base.ints_as_categories)
        .find_hidden_numerics(base.find_hidden_numerics || args.find_hidden_numerics)
        .scaling(base.scaling);

    if let Some(index) = args.index.clone().or(base.index_feature) {
        builder = builder.index_feature(index);
    }

    if let Some(target) = args.target.clone().or(base.target_feature) {
        builder = builder.target_feature(target);
    }

    Ok(builder.build()?)
}

/// Write a table to CSV.
fn write_csv(df: &mut DataFrame, path: &str) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Could not create output file {}", path))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)?;
    Ok(())
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn format_list(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

/// Print a human-readable summary of the fitted design.
///
/// Uses `println!` since this is the primary output of the command.
fn print_human_readable_summary(summary: &TreatmentSummary, fitted: &FittedState, args: &Args) {
    println!();
    println!("{}", "=".repeat(80));
    println!("TREATMENT DESIGN");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input: {} ({} rows x {} columns)",
        args.input,
        summary.rows,
        summary.columns.len()
    );
    if let Some(ref output) = args.output {
        println!("Output: {}", output);
    }
    println!();

    println!("COLUMNS");
    println!("{}", "-".repeat(40));
    println!("{:<24} {:<22} {:<12} {:<10}", "Column", "Bucket", "Missing", "Treated");
    println!("{}", "-".repeat(70));
    for name in &summary.columns {
        let bucket = summary
            .buckets
            .bucket_of(name)
            .map(|b: Bucket| b.display_name())
            .unwrap_or("-");
        let bucket = if summary.high_cardinality.contains(name) {
            Bucket::HighCardinality.display_name()
        } else {
            bucket
        };
        println!(
            "{:<24} {:<22} {:<12} {:<10}",
            truncate_str(name, 23),
            bucket,
            if summary.columns_with_missing.contains(name) { "yes" } else { "no" },
            if summary.treatment_columns.contains(name) { "yes" } else { "no" }
        );
    }
    println!();

    println!("DECISIONS");
    println!("{}", "-".repeat(40));
    println!("  Excluded:          {}", format_list(&summary.excluded));
    println!("  Removable:         {}", format_list(&summary.removable));
    println!("  Zero variance:     {}", format_list(&summary.zero_variance));
    println!("  High cardinality:  {}", format_list(&summary.high_cardinality));
    println!("  Categorical:       {}", format_list(&summary.categorical));
    println!("  Integer castable:  {}", format_list(&summary.integer_castable));
    let recovered: Vec<String> = summary
        .recovered
        .iter()
        .map(|r| format!("{} ({})", r.column, r.bucket.display_name()))
        .collect();
    println!("  Recovered:         {}", format_list(&recovered));
    println!();

    if !summary.fill_values.is_empty() {
        println!("FILL VALUES");
        println!("{}", "-".repeat(40));
        for (column, value) in &summary.fill_values {
            println!("  {:<24} {}", truncate_str(column, 23), value);
        }
        println!();
    }

    let scaling = fitted.scaling_request(&fitted.config().scaling);
    if !scaling.columns.is_empty() {
        println!("Float columns for scaling: {}", format_list(&scaling.columns));
        println!();
    }

    if !summary.diagnostics.is_empty() {
        println!("Diagnostics:");
        for skipped in &summary.diagnostics {
            println!(
                "  ! [{}] {}: {}",
                skipped.stage.display_name(),
                skipped.column,
                skipped.reason
            );
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}

/// Load CSV with multiple fallback strategies
fn load_csv_with_fallbacks(path: &str) -> Result<DataFrame> {
    // Strategy 1: Standard loading with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
        }
    }

    // Strategy 2: Full schema inference
    CsvReadOptions::default()
        .with_infer_schema_length(None)
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
        .map_err(|e| anyhow!("Failed to read {}: {}", path, e))
}
