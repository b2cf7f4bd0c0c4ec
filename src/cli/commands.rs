//! Command implementations for the dssat-simobs CLI
//!
//! Results are written to stdout as JSON; logs and the merge summary go to
//! stderr so the output can be piped.

use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use std::io::Write;
use tracing::{debug, info};

use crate::cli::{Args, Command};
use crate::config::SimObsConfig;
use crate::discovery::{crop_folder, find_in_folder, list_crop_outputs};
use crate::merger::{MergeOutcome, SimVsObsMerger};
use crate::models::Crop;
use crate::parsers::{EvaluationOutputParser, SimulationOutputParser, TimeSeriesObservationParser};
use crate::stats;

/// Run the command selected on the command line
pub async fn run(args: Args) -> Result<()> {
    setup_logging(&args)?;
    debug!("Command line arguments: {:?}", args);

    let config = load_configuration(&args)?;
    let crop = args.command.crop()?;
    info!(
        "Using base path {} for crop {}",
        config.base_path.display(),
        crop
    );

    match &args.command {
        Command::Merge { out_file, .. } => {
            let merger = SimVsObsMerger::from_config(config);
            let outcome = merger
                .merge(&crop, out_file)
                .await
                .with_context(|| format!("Failed to merge {} for {}", out_file, crop))?;
            write_json(&outcome, args.pretty)?;
            print_merge_summary(&outcome, out_file);
        }
        Command::Stats { out_file, .. } => {
            let merger = SimVsObsMerger::from_config(config);
            let outcome = merger
                .merge(&crop, out_file)
                .await
                .with_context(|| format!("Failed to merge {} for {}", out_file, crop))?;
            let statistics = stats::summarize(&stats::merged_samples(&outcome.records));
            info!("Computed statistics for {} variables", statistics.len());
            write_json(&statistics, args.pretty)?;
        }
        Command::Outfiles { .. } => {
            let outputs = list_crop_outputs(&config.base_path, &crop)
                .await
                .with_context(|| format!("Failed to list outputs for {}", crop))?;
            write_json(&outputs, args.pretty)?;
        }
        Command::Evaluate { file, .. } => {
            let path = resolve(&config, &crop, file).await;
            let output = EvaluationOutputParser::new(config.code_dictionary())
                .parse_file(&path)
                .await;
            write_json(&output, args.pretty)?;
        }
        Command::Tfile { file, .. } => {
            let path = resolve(&config, &crop, file).await;
            let runs = TimeSeriesObservationParser::new(config.treatment_metadata_source())
                .parse_file(&config.base_path, &crop, &path)
                .await
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            write_json(&runs, args.pretty)?;
        }
        Command::Out { file, .. } => {
            let path = resolve(&config, &crop, file).await;
            let runs = SimulationOutputParser::new()
                .parse_file(&path)
                .await
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            write_json(&runs, args.pretty)?;
        }
    }

    Ok(())
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dssat_simobs={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration using layered approach (file -> env -> args)
fn load_configuration(args: &Args) -> Result<SimObsConfig> {
    let mut config = SimObsConfig::load_layered(args.config.as_deref())
        .context("Failed to load configuration")?;
    args.apply_overrides(&mut config);
    config.validate()?;

    debug!("Loaded configuration: {:?}", config);
    Ok(config)
}

/// File inside the crop folder, matched case-insensitively when possible
async fn resolve(config: &SimObsConfig, crop: &Crop, file: &str) -> std::path::PathBuf {
    let folder = crop_folder(&config.base_path, crop);
    match find_in_folder(&folder, file).await {
        Some(path) => path,
        None => folder.join(file),
    }
}

fn write_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", json).context("Failed to write output")?;
    Ok(())
}

fn print_merge_summary(outcome: &MergeOutcome, out_file: &str) {
    let with_series = outcome
        .records
        .iter()
        .filter(|record| !record.measured_time_series.is_empty())
        .count();
    let with_final = outcome
        .records
        .iter()
        .filter(|record| !record.measured_final.is_empty())
        .count();

    eprintln!(
        "{} {} {}",
        "Merged".bright_green().bold(),
        out_file.bright_cyan(),
        format!("({} treatments)", outcome.records.len()).bright_black()
    );
    eprintln!("  measured time series: {}", with_series);
    eprintln!("  measured final values: {}", with_final);

    if !outcome.mismatches.is_empty() {
        eprintln!(
            "{} {} treatments not in the simulation output",
            "Warning:".bright_yellow().bold(),
            outcome.mismatches.len()
        );
        for mismatch in &outcome.mismatches {
            eprintln!(
                "  {} {} ({})",
                mismatch.experiment,
                mismatch.raw_treatment.bright_yellow(),
                mismatch.source
            );
        }
    }
}
