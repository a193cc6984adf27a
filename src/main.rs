//! Roaming log analysis CLI for Moxa client bridges.
//!
//! Scores a configuration export or a roaming event log against the
//! parameter catalog and writes JSON and text reports.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, Context, Result};

use roamscore::analysis::{self, catalog, report, types::{RawConfig, Setting}};
use roamscore::config::AnalyzerSettings;
use roamscore::config_loader::{self, SettingsCliOverrides};
use roamscore::utils::parse_duration;

#[derive(Parser)]
#[command(name = "roamscore")]
#[command(about = "Roaming log analysis and configuration scoring for Moxa client bridges")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Analyzer settings file (YAML)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Output directory for reports
    #[arg(short, long, default_value = "analysis_output")]
    output: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single log file
    Analyze {
        /// Configuration export or roaming event log
        log: PathBuf,

        /// Current device configuration (YAML or JSON)
        #[arg(short, long)]
        device_config: Option<PathBuf>,

        /// Ping-pong detection window, e.g. "30s"
        #[arg(long, value_parser = parse_duration)]
        ping_pong_window: Option<Duration>,

        /// Print the summary only, write no report files
        #[arg(long)]
        no_report: bool,
    },

    /// Analyze every .log and .txt file in a directory
    Batch {
        /// Directory containing log files
        dir: PathBuf,

        /// Current device configuration (YAML or JSON)
        #[arg(short, long)]
        device_config: Option<PathBuf>,

        /// Ping-pong detection window, e.g. "30s"
        #[arg(long, value_parser = parse_duration)]
        ping_pong_window: Option<Duration>,

        /// Number of parallel workers (0 = auto-detect)
        #[arg(short = 'j', long, default_value = "0")]
        threads: usize,
    },

    /// Print the parameter catalog
    Catalog,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let base_settings = match &cli.settings {
        Some(path) => config_loader::load_settings(path)?,
        None => AnalyzerSettings::default(),
    };

    match cli.command {
        Commands::Analyze {
            log,
            device_config,
            ping_pong_window,
            no_report,
        } => {
            let settings = with_overrides(base_settings, ping_pong_window)?;
            let current = load_current_config(device_config.as_deref())?;

            let result = analysis::analyze_file(&log, &current, &settings, Some(Utc::now()))?;
            let source = log.display().to_string();

            if !no_report {
                fs::create_dir_all(&cli.output).with_context(|| {
                    format!("Failed to create output directory: {}", cli.output.display())
                })?;
                let stem = report_stem(&log);
                analysis::generate_json_report(&result, &cli.output.join(format!("{}_report.json", stem)))?;
                analysis::generate_text_report(&result, &source, &cli.output.join(format!("{}_report.txt", stem)))?;
            }

            report::print_summary(&result, &source);
        }
        Commands::Batch {
            dir,
            device_config,
            ping_pong_window,
            threads,
        } => {
            // Set thread pool size
            if threads > 0 {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build_global()
                    .context("Failed to configure thread pool")?;
            }

            let settings = with_overrides(base_settings, ping_pong_window)?;
            let current = load_current_config(device_config.as_deref())?;

            let paths = analysis::discover_logs(&dir)?;
            if paths.is_empty() {
                bail!("No .log or .txt files found in {}", dir.display());
            }

            let results = analysis::analyze_files(&paths, &current, &settings, Some(Utc::now()));

            fs::create_dir_all(&cli.output)
                .with_context(|| format!("Failed to create output directory: {}", cli.output.display()))?;
            for (path, result) in &results {
                if let Ok(result) = result {
                    let stem = report_stem(path);
                    let source = path.display().to_string();
                    analysis::generate_json_report(result, &cli.output.join(format!("{}_report.json", stem)))?;
                    analysis::generate_text_report(result, &source, &cli.output.join(format!("{}_report.txt", stem)))?;
                }
            }

            report::print_batch_summary(&results);
        }
        Commands::Catalog => print_catalog(),
    }

    Ok(())
}

fn with_overrides(mut settings: AnalyzerSettings, ping_pong_window: Option<Duration>) -> Result<AnalyzerSettings> {
    let overrides = SettingsCliOverrides { ping_pong_window };
    config_loader::apply_settings_overrides(&mut settings, &overrides)?;
    Ok(settings)
}

fn load_current_config(path: Option<&Path>) -> Result<RawConfig> {
    match path {
        Some(path) => config_loader::load_device_config(path),
        None => Ok(RawConfig::new()),
    }
}

fn report_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "analysis".to_string())
}

fn print_catalog() {
    println!("\n=== PARAMETER CATALOG (configuration rubric) ===\n");
    println!(
        "{:<26} {:<18} {:<14} {:>6} {:>8} {:>8}",
        "Parameter", "Ideal", "Range", "Weight", "Points", "Priority"
    );
    for def in catalog::PARAMETERS.iter() {
        let range = def
            .range
            .map(|(lo, hi)| format!("{}-{}", lo, hi))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<26} {:<18} {:<14} {:>6} {:>8.2} {:>8}",
            def.name.key(),
            def.display(&def.ideal),
            range,
            def.weight,
            def.normalized_weight(),
            Setting::from(def.name).priority_rank()
        );
    }

    println!("\n=== EVENT METRICS (event-stream rubric) ===\n");
    for def in catalog::METRICS.iter() {
        println!(
            "{:<26} {:>6} {:>8.2}",
            def.criterion.label(),
            def.weight,
            def.normalized_weight()
        );
    }
    println!();
}
