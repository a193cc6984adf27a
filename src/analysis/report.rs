//! Report generation for roaming analyses.
//!
//! Generates both JSON and human-readable text reports.

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};

use super::types::*;

/// Generate JSON report
pub fn generate_json_report(result: &AnalysisResult, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(result)
        .context("Failed to serialize analysis result to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

fn status_tag(status: Status) -> &'static str {
    match status {
        Status::Ok => "[OK]  ",
        Status::Warning => "[WARN]",
        Status::Error => "[ERR] ",
    }
}

/// Headline rating shown next to the score
pub fn rating(score: u8) -> &'static str {
    match score {
        80.. => "EXCELLENT",
        60..=79 => "FAIR",
        _ => "POOR",
    }
}

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push("=".repeat(80));
    lines.push(format!("{:^80}", title));
    lines.push("=".repeat(80));
    lines.push(String::new());
}

fn criterion_value(detail: &CriterionScore) -> String {
    let Some(value) = detail.value else {
        return "not found".to_string();
    };
    match detail.criterion {
        Criterion::HandoffTime => format!("{} ms", value),
        Criterion::SnrImprovement => format!("{} dB", value),
        Criterion::RoamingStability => format!("{}% stable", value),
        _ => {
            let param = ParamName::ALL
                .into_iter()
                .find(|p| Criterion::from(*p) == detail.criterion);
            match param {
                Some(p) => super::catalog::definition(p).display(&value),
                None => value.to_string(),
            }
        }
    }
}

fn push_metrics(lines: &mut Vec<String>, metrics: &RoamingMetrics) {
    lines.push(format!("Roaming events: {}", metrics.total_events));
    if let Some(avg) = metrics.avg_handoff_time_ms {
        lines.push(format!(
            "Handoff time: avg {:.1} ms, min {} ms, max {} ms ({} of {} events timed)",
            avg,
            metrics.min_handoff_time_ms.unwrap_or_default(),
            metrics.max_handoff_time_ms.unwrap_or_default(),
            metrics.events_with_handoff_time,
            metrics.total_events
        ));
        let dist = &metrics.handoff_distribution;
        lines.push(format!(
            "  <=50 ms: {}   51-100 ms: {}   101-200 ms: {}   >200 ms: {}",
            dist.up_to_50ms, dist.up_to_100ms, dist.up_to_200ms, dist.above_200ms
        ));
    }
    if let (Some(before), Some(after), Some(gain)) = (
        metrics.avg_snr_before,
        metrics.avg_snr_after,
        metrics.avg_snr_improvement,
    ) {
        lines.push(format!(
            "SNR: {:.1} dB before, {:.1} dB after, {:+.1} dB average improvement",
            before, after, gain
        ));
    }
    if let Some(assoc) = metrics.avg_association_time_ms {
        lines.push(format!("Average association time: {:.1} s", assoc / 1000.0));
    }
    lines.push(String::new());

    lines.push("Roaming reasons:".to_string());
    for reason in RoamingReason::ALL {
        let count = metrics.reason_histogram.count(reason);
        let pct = if metrics.total_events > 0 {
            count as f64 * 100.0 / metrics.total_events as f64
        } else {
            0.0
        };
        lines.push(format!(
            "  {:<16} {:>4} ({:>5.1}%) {}",
            reason.label(),
            count,
            pct,
            "#".repeat((pct / 5.0) as usize)
        ));
    }
    lines.push(String::new());

    if metrics.ping_pong_count > 0 {
        lines.push(format!(
            "Ping-pong roams: {} ({})",
            metrics.ping_pong_count,
            metrics.ping_pong_pairs.join(", ")
        ));
    }
    if metrics.deauth_count > 0 {
        let by_ap: Vec<String> = metrics
            .deauth_by_ap
            .iter()
            .map(|(ap, n)| format!("{}: {}", ap, n))
            .collect();
        lines.push(format!(
            "Deauthentications: {} ({})",
            metrics.deauth_count,
            by_ap.join(", ")
        ));
    }
}

/// Render the human-readable report
pub fn render_text_report(result: &AnalysisResult, source: &str) -> String {
    let mut lines: Vec<String> = Vec::new();

    section(&mut lines, "MOXA ROAMING ANALYSIS");
    lines.push(format!("Source: {}", source));
    lines.push(format!("Log type: {}", result.log_kind()));
    if let Some(ts) = result.timestamp {
        lines.push(format!("Analysis Date: {}", ts.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    lines.push(format!(
        "Score: {}/{} - {} ({})",
        result.score(),
        result.breakdown.max_score,
        rating(result.score()),
        if result.passed() { "PASSED" } else { "FAILED" }
    ));
    for w in &result.warnings {
        lines.push(format!("Warning: {}", w));
    }
    lines.push(String::new());

    section(&mut lines, "SCORE BREAKDOWN");
    for detail in &result.breakdown.details {
        lines.push(format!(
            "{} {:<28} {:<20} {:>6.2}/{:.2}",
            status_tag(detail.status),
            detail.criterion.label(),
            criterion_value(detail),
            detail.earned_points,
            detail.max_points
        ));
    }
    lines.push(String::new());

    if let Some(metrics) = result.metrics() {
        section(&mut lines, "ROAMING EVENTS");
        push_metrics(&mut lines, metrics);
        lines.push(String::new());
    }

    section(&mut lines, "RECOMMENDATIONS");
    if result.recommendations.is_empty() {
        lines.push("No specific recommendation.".to_string());
    }
    for (i, rec) in result.recommendations.iter().enumerate() {
        lines.push(format!("{}. [P{}] {}", i + 1, rec.priority, rec.problem));
        lines.push(format!("   -> {}", rec.solution));
    }
    lines.push(String::new());

    if !result.config_changes.is_empty() {
        section(&mut lines, "CONFIGURATION CHANGES");
        for change in &result.config_changes {
            lines.push(format!(
                "{}: {} -> {}",
                change.param.label(),
                change.current_value.as_deref().unwrap_or("unknown"),
                change.recommended_value
            ));
            lines.push(format!("   {}", change.reason));
        }
        lines.push(String::new());
    }

    // Footer
    lines.push("=".repeat(80));
    lines.join("\n")
}

/// Generate human-readable text report
pub fn generate_text_report(result: &AnalysisResult, source: &str, output_path: &Path) -> Result<()> {
    let content = render_text_report(result, source);
    fs::write(output_path, content)
        .with_context(|| format!("Failed to write text report to {}", output_path.display()))?;

    log::info!("Text report written to {}", output_path.display());
    Ok(())
}

/// Print a summary to stdout
pub fn print_summary(result: &AnalysisResult, source: &str) {
    println!("\n=== ROAMING ANALYSIS SUMMARY: {} ===\n", source);
    println!("Log type: {}", result.log_kind());
    println!(
        "Score: {}/{} ({})",
        result.score(),
        result.breakdown.max_score,
        if result.passed() { "passed" } else { "failed" }
    );

    if let Some(metrics) = result.metrics() {
        println!("\nRoaming:");
        println!("  Events: {}", metrics.total_events);
        if let Some(avg) = metrics.avg_handoff_time_ms {
            println!("  Average handoff: {:.1}ms", avg);
        }
        if let Some(gain) = metrics.avg_snr_improvement {
            println!("  Average SNR gain: {:.1}dB", gain);
        }
        println!("  Ping-pongs: {}", metrics.ping_pong_count);
    }

    for w in &result.warnings {
        println!("\nWarning: {}", w);
    }

    if let Some(top) = result.recommendations.first() {
        println!("\nTop recommendation: {}", top.solution);
    }

    println!();
}

/// Print one line per file of a batch run
pub fn print_batch_summary(results: &[(PathBuf, Result<AnalysisResult>)]) {
    println!("\n=== BATCH SUMMARY ===\n");
    for (path, result) in results {
        match result {
            Ok(r) => println!(
                "{:<40} {:<20} {:>3}/{} {}",
                path.display(),
                r.log_kind().to_string(),
                r.score(),
                r.breakdown.max_score,
                if r.passed() { "PASS" } else { "FAIL" }
            ),
            Err(e) => println!("{:<40} error: {}", path.display(), e),
        }
    }
    println!();
}
