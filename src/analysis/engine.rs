//! The analysis pipeline.
//!
//! `analyze` is a pure function of its inputs: classification, extraction,
//! scoring and recommendations run on fresh values every call, so concurrent
//! calls need no coordination and identical inputs give identical results.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use color_eyre::eyre::{Context, Result};
use log::{debug, info, warn};
use rayon::prelude::*;

use super::types::*;
use super::{classifier, config_extractor, log_parser, metrics, recommendations, scoring};
use crate::config::AnalyzerSettings;
use crate::error::AnalysisError;

/// Analyze log text with default settings and no timestamp
pub fn analyze(raw: &str, current_config: &RawConfig) -> Result<AnalysisResult, AnalysisError> {
    analyze_with(raw, current_config, &AnalyzerSettings::default(), None)
}

/// Analyze log text.
///
/// `current_config` is the device's present configuration, used to decide
/// which setting changes to propose for an event stream. Values that do not
/// fit their parameter are reported in `warnings` and treated as unknown.
/// `timestamp` is copied into the result unchanged.
pub fn analyze_with(
    raw: &str,
    current_config: &RawConfig,
    settings: &AnalyzerSettings,
    timestamp: Option<DateTime<Utc>>,
) -> Result<AnalysisResult, AnalysisError> {
    let kind = classifier::classify(raw)?;
    debug!("Log classified as {}", kind);

    let (current, mut warnings) = config_extractor::device_config_from_raw(current_config);

    let (findings, breakdown, drafts) = match kind {
        LogKind::ConfigurationDump => {
            let parameters = config_extractor::extract_parameters(raw);
            let mut extracted = DeviceConfig::default();
            for p in &parameters {
                if let Some(value) = p.parsed_value {
                    extracted.set(p.name, value);
                }
            }

            let unparseable = extracted.is_empty();
            if unparseable {
                warnings.push(AnalysisError::UnparseableLog { log_kind: kind });
            }

            let breakdown = scoring::score_configuration(&extracted);
            let drafts = recommendations::for_configuration(&breakdown, unparseable);
            (Findings::ConfigurationDump { parameters }, breakdown, drafts)
        }
        LogKind::EventStream => {
            let events = log_parser::extract_events(raw, settings);
            let deauths = log_parser::extract_deauths(raw);
            let metrics = metrics::aggregate(&events, &deauths, settings);

            if events.is_empty() {
                warnings.push(AnalysisError::UnparseableLog { log_kind: kind });
            }

            let breakdown = scoring::score_events(&metrics);
            let drafts = recommendations::for_events(&breakdown, &metrics, &current, settings);
            (
                Findings::EventStream {
                    roaming_metrics: metrics,
                    roaming_events: events,
                },
                breakdown,
                drafts,
            )
        }
    };

    for w in &warnings {
        warn!("{}", w);
    }

    let (recommendations, config_changes) = recommendations::finalize(drafts);

    Ok(AnalysisResult {
        findings,
        breakdown,
        recommendations,
        config_changes,
        warnings,
        timestamp,
    })
}

/// Read a log file the way the device exports it: UTF-8, possibly with a BOM,
/// with invalid sequences replaced
pub fn read_log(path: &Path) -> Result<String> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read log file: {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.strip_prefix('\u{feff}').unwrap_or(&text).to_string())
}

/// Read and analyze one log file
pub fn analyze_file(
    path: &Path,
    current_config: &RawConfig,
    settings: &AnalyzerSettings,
    timestamp: Option<DateTime<Utc>>,
) -> Result<AnalysisResult> {
    let text = read_log(path)?;
    let result = analyze_with(&text, current_config, settings, timestamp)
        .with_context(|| format!("Failed to analyze {}", path.display()))?;
    info!(
        "{}: {} scored {}/{}",
        path.display(),
        result.log_kind(),
        result.score(),
        MAX_SCORE
    );
    Ok(result)
}

/// `.log` and `.txt` files directly inside `dir`, sorted by name
pub fn discover_logs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("log") || ext.eq_ignore_ascii_case("txt"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(paths)
}

/// Analyze many log files in parallel. Results keep the order of `paths`;
/// a file that cannot be read or is empty yields an error entry.
pub fn analyze_files(
    paths: &[PathBuf],
    current_config: &RawConfig,
    settings: &AnalyzerSettings,
    timestamp: Option<DateTime<Utc>>,
) -> Vec<(PathBuf, Result<AnalysisResult>)> {
    info!("Analyzing {} log files in parallel...", paths.len());

    let results: Vec<(PathBuf, Result<AnalysisResult>)> = paths
        .par_iter()
        .map(|path| {
            let result = analyze_file(path, current_config, settings, timestamp);
            if let Err(ref e) = result {
                warn!("Failed to analyze {}: {}", path.display(), e);
            }
            (path.clone(), result)
        })
        .collect();

    let passed = results
        .iter()
        .filter(|(_, r)| r.as_ref().map(|a| a.passed()).unwrap_or(false))
        .count();
    info!("{} of {} logs passed", passed, results.len());

    results
}
