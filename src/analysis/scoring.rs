//! Rubric scoring.
//!
//! Configuration dumps are scored against the ten catalog parameters, event
//! streams against the three roaming metrics. Each rubric is normalized to
//! 100 points; the final score is the rounded sum of earned points.

use log::debug;

use super::catalog::{self, Breach, MetricDef, ParameterDef};
use super::types::*;

/// Share of the weight an in-range value never drops below
pub const IN_RANGE_FLOOR: f64 = 0.7;
/// Share of the weight earned by a recoverable out-of-range value
pub const RECOVERABLE_SHARE: f64 = 0.5;
/// Share of the weight earned by the wrong roaming mechanism
pub const MECHANISM_MISMATCH_SHARE: f64 = 0.3;

/// Handoff times between ideal and ceiling never earn less than this share
pub const HANDOFF_FLOOR: f64 = 0.6;
/// Connection-loss share above which roaming is unstable
pub const CONNECTION_LOSS_LIMIT: f64 = 0.1;
/// SNR-drop share above which roaming is flagged
pub const SNR_DROP_LIMIT: f64 = 0.5;
/// Share earned when too many roams are SNR drops
pub const SNR_DROP_SHARE: f64 = 0.8;

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// A scored criterion with its unrounded points
type Row = (CriterionScore, f64);

/// The score is the rounded sum of unrounded points; `earned_points` is for display
fn finish(rows: Vec<Row>) -> ScoreBreakdown {
    let total: f64 = rows.iter().map(|(_, exact)| exact).sum();
    let details: Vec<CriterionScore> = rows.into_iter().map(|(row, _)| row).collect();
    let score = total.round().clamp(0.0, f64::from(MAX_SCORE)) as u8;
    ScoreBreakdown {
        details,
        score,
        max_score: MAX_SCORE,
        passed: score >= PASS_THRESHOLD,
    }
}

/// Earned share and status of a parameter value
fn rate_parameter(def: &ParameterDef, value: Value) -> (f64, Status) {
    match (def.ideal, value) {
        (Value::Integer(ideal), Value::Integer(v)) => {
            let Some((lo, hi)) = def.range else {
                return if v == ideal { (1.0, Status::Ok) } else { (0.0, Status::Error) };
            };
            let breach = if v < lo {
                Some(def.below_range)
            } else if v > hi {
                Some(def.above_range)
            } else {
                None
            };
            match breach {
                Some(Breach::Recoverable) => (RECOVERABLE_SHARE, Status::Warning),
                Some(Breach::Disqualifying) => (0.0, Status::Error),
                None => {
                    let span = (hi - lo).max(1) as f64;
                    let closeness = 1.0 - (v - ideal).abs() as f64 / span;
                    let status = if closeness >= IN_RANGE_FLOOR { Status::Ok } else { Status::Warning };
                    (closeness.max(IN_RANGE_FLOOR), status)
                }
            }
        }
        (Value::Bool(ideal), Value::Bool(v)) => {
            if v == ideal {
                (1.0, Status::Ok)
            } else {
                (0.0, Status::Error)
            }
        }
        (Value::Mechanism(ideal), Value::Mechanism(v)) => {
            if v == ideal {
                (1.0, Status::Ok)
            } else {
                (MECHANISM_MISMATCH_SHARE, Status::Warning)
            }
        }
        // A value of the wrong type cannot come out of extraction; treat as wrong
        _ => (0.0, Status::Error),
    }
}

/// Score one catalog parameter; `None` means the parameter was not found
pub fn score_parameter(def: &ParameterDef, value: Option<Value>) -> CriterionScore {
    parameter_row(def, value).0
}

fn parameter_row(def: &ParameterDef, value: Option<Value>) -> Row {
    let max_points = def.normalized_weight();
    let (share, status) = match value {
        Some(v) => rate_parameter(def, v),
        None => (0.0, Status::Warning),
    };

    let earned = max_points * share;
    let row = CriterionScore {
        criterion: Criterion::from(def.name),
        value,
        ideal_value: Some(def.ideal),
        range_low: def.range.map(|(lo, _)| lo as f64),
        range_high: def.range.map(|(_, hi)| hi as f64),
        status,
        earned_points: round2(earned),
        max_points: round2(max_points),
    };
    (row, earned)
}

/// Score a configuration dump
pub fn score_configuration(config: &DeviceConfig) -> ScoreBreakdown {
    let rows: Vec<Row> = catalog::PARAMETERS
        .iter()
        .map(|def| parameter_row(def, config.get(def.name)))
        .collect();

    for (d, _) in rows.iter().filter(|(d, _)| d.status != Status::Ok) {
        debug!("{}: {} ({:.2}/{:.2})", d.criterion.label(), d.status, d.earned_points, d.max_points);
    }

    finish(rows)
}

fn metric_row(def: &MetricDef, value: Option<f64>, share: f64, status: Status) -> Row {
    let max_points = def.normalized_weight();
    let earned = max_points * share.clamp(0.0, 1.0);
    let row = CriterionScore {
        criterion: def.criterion,
        value: value.map(|v| Value::Number(round2(v))),
        ideal_value: def.ideal.map(Value::Number),
        range_low: def.range.map(|(lo, _)| lo),
        range_high: def.range.map(|(_, hi)| hi),
        status,
        earned_points: round2(earned),
        max_points: round2(max_points),
    };
    (row, earned)
}

/// Earned share and status of an average handoff time
pub fn rate_handoff(avg_ms: f64) -> (f64, Status) {
    let ideal = 50.0;
    let ceiling = 100.0;
    if avg_ms < ideal {
        (1.0, Status::Ok)
    } else if avg_ms <= ceiling {
        let share = 1.0 - (avg_ms - ideal) / (ceiling - ideal);
        (share.max(HANDOFF_FLOOR), Status::Warning)
    } else {
        (0.0, Status::Error)
    }
}

/// Earned share and status of an average SNR improvement
pub fn rate_snr_improvement(avg_db: f64) -> (f64, Status) {
    let ideal = 10.0;
    let floor = 5.0;
    if avg_db >= ideal {
        (1.0, Status::Ok)
    } else if avg_db >= floor {
        (avg_db / ideal, Status::Warning)
    } else {
        ((avg_db / ideal).max(0.0), Status::Error)
    }
}

/// Earned share and status of roaming stability
pub fn rate_stability(metrics: &RoamingMetrics) -> (f64, Status) {
    let loss = metrics.connection_loss_ratio();
    if loss > CONNECTION_LOSS_LIMIT {
        ((1.0 - loss).max(0.0), Status::Error)
    } else if metrics.snr_drop_ratio() > SNR_DROP_LIMIT {
        (SNR_DROP_SHARE, Status::Warning)
    } else {
        (1.0, Status::Ok)
    }
}

/// Score an event stream
pub fn score_events(metrics: &RoamingMetrics) -> ScoreBreakdown {
    let rows = catalog::METRICS
        .iter()
        .map(|def| match def.criterion {
            Criterion::HandoffTime => match metrics.avg_handoff_time_ms {
                Some(avg) => {
                    let (share, status) = rate_handoff(avg);
                    metric_row(def, Some(avg), share, status)
                }
                None => metric_row(def, None, 0.0, Status::Warning),
            },
            Criterion::SnrImprovement => match metrics.avg_snr_improvement {
                Some(avg) => {
                    let (share, status) = rate_snr_improvement(avg);
                    metric_row(def, Some(avg), share, status)
                }
                None => metric_row(def, None, 0.0, Status::Warning),
            },
            _ => {
                if metrics.total_events == 0 {
                    metric_row(def, None, 0.0, Status::Warning)
                } else {
                    // Share of roams not caused by a connection loss, in percent
                    let stable = (1.0 - metrics.connection_loss_ratio()) * 100.0;
                    let (share, status) = rate_stability(metrics);
                    metric_row(def, Some(stable), share, status)
                }
            }
        })
        .collect();

    finish(rows)
}
