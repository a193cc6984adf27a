//! Recommendations derived from a score breakdown.
//!
//! Every criterion short of full marks yields one recommendation. The event
//! path adds findings that are not scored directly (ping-pong, weak APs,
//! deauthentications). Setting changes are only proposed when the current
//! device configuration shows they would make a difference.

use std::collections::HashSet;

use log::debug;

use super::catalog;
use super::types::*;
use crate::config::AnalyzerSettings;

/// Rank of a recommendation that changes no setting
pub const DEFAULT_RANK: u32 = 50;

/// Average source SNR (dB) under which the client is holding on too long
pub const LATE_ROAM_SNR_DB: f64 = 15.0;

/// RTS threshold above which it is worth lowering when handoffs are slow
pub const SLOW_HANDOFF_RTS_LIMIT: i64 = 1024;

/// Map a rank from the priority table to a 1-5 priority
pub fn priority_for_rank(rank: u32) -> u8 {
    match rank {
        85.. => 1,
        75..=84 => 2,
        65..=74 => 3,
        55..=64 => 4,
        _ => 5,
    }
}

/// A recommendation before ranking
#[derive(Debug, Clone)]
pub struct Draft {
    problem: String,
    solution: String,
    changes: Vec<ParameterChange>,
}

impl Draft {
    fn new(problem: impl Into<String>, solution: impl Into<String>) -> Self {
        Self {
            problem: problem.into(),
            solution: solution.into(),
            changes: Vec::new(),
        }
    }

    fn change(mut self, change: ParameterChange) -> Self {
        self.changes.push(change);
        self
    }

    fn change_if(self, change: Option<ParameterChange>) -> Self {
        match change {
            Some(c) => self.change(c),
            None => self,
        }
    }

    fn into_recommendation(self) -> Recommendation {
        let rank = self
            .changes
            .iter()
            .map(|c| c.param.priority_rank())
            .max()
            .unwrap_or(DEFAULT_RANK);
        Recommendation {
            problem: self.problem,
            solution: self.solution,
            priority: priority_for_rank(rank),
            rank,
            parameter_changes: self.changes,
        }
    }
}

/// What the setting does for roaming, quoted in change reasons
fn rationale(param: ParamName) -> &'static str {
    match param {
        ParamName::MinTransmissionRate => "The floor rate trades latency against reach at the cell edge",
        ParamName::MaxTransmissionPower => "Transmit power sets cell size and interference with neighbouring APs",
        ParamName::RtsThreshold => "A moderate RTS threshold limits collisions in noisy industrial sites",
        ParamName::FragmentationThreshold => "Small fragments add overhead without helping roaming",
        ParamName::RoamingMechanism => "SNR reflects link quality better than raw signal strength",
        ParamName::RoamingDifference => "The margin a new AP must beat the current one by before roaming",
        ParamName::RemoteConnectionCheck => "Detects and repairs broken links automatically",
        ParamName::WmmEnabled => "Prioritizes latency sensitive and control traffic",
        ParamName::TurboRoaming => "Speeds up the roaming process",
        ParamName::ApAliveCheck => "Checks that the AP is reachable before staying on it",
    }
}

fn change_to_ideal(param: ParamName, current: Option<Value>, reason: &str) -> ParameterChange {
    let def = catalog::definition(param);
    ParameterChange {
        param: Setting::from(param),
        current_value: current.map(|v| def.display(&v)),
        recommended_value: def.display(&def.ideal),
        reason: reason.to_string(),
    }
}

/// `Enabled` if the device reports the flag as disabled
fn enable_if_disabled(current: &DeviceConfig, param: ParamName, reason: &str) -> Option<ParameterChange> {
    (current.flag(param) == Some(false)).then(|| change_to_ideal(param, Some(Value::Bool(false)), reason))
}

/// `None` when the device already runs the recommended value
fn integer_change(param: ParamName, current: Option<i64>, recommended: i64, reason: &str) -> Option<ParameterChange> {
    if current == Some(recommended) {
        return None;
    }
    let def = catalog::definition(param);
    Some(ParameterChange {
        param: Setting::from(param),
        current_value: current.map(|v| def.display(&Value::Integer(v))),
        recommended_value: def.display(&Value::Integer(recommended)),
        reason: reason.to_string(),
    })
}

fn mechanism_to_snr(reason: &str) -> ParameterChange {
    change_to_ideal(
        ParamName::RoamingMechanism,
        Some(Value::Mechanism(RoamingMechanism::SignalStrength)),
        reason,
    )
}

fn parameter_draft(detail: &CriterionScore, param: ParamName) -> Draft {
    let def = catalog::definition(param);
    let label = Setting::from(param).label();
    let ideal = def.display(&def.ideal);

    let Some(value) = detail.value else {
        return Draft::new(
            format!("{} was not found in the configuration", label),
            format!("Make sure the export includes {} and set it to {}", label, ideal),
        )
        .change(change_to_ideal(param, None, "Parameter missing from the configuration"));
    };

    let shown = def.display(&value);
    let problem = match (value, def.range) {
        (Value::Bool(false), _) => format!("{} is disabled", label),
        (Value::Mechanism(_), _) => format!("{} is based on {}", label, shown),
        (Value::Integer(v), Some((lo, _))) if v < lo => {
            format!("{} is {}, below the acceptable minimum of {}", label, shown, def.display(&Value::Integer(lo)))
        }
        (Value::Integer(v), Some((_, hi))) if v > hi => {
            format!("{} is {}, above the acceptable maximum of {}", label, shown, def.display(&Value::Integer(hi)))
        }
        _ => format!("{} is {}, away from the ideal {}", label, shown, ideal),
    };
    let solution = match value {
        Value::Bool(_) => format!("Enable {}", label),
        _ => format!("Set {} to {}", label, ideal),
    };

    Draft::new(problem, solution).change(change_to_ideal(param, Some(value), rationale(param)))
}

/// Recommendations for a configuration dump
pub fn for_configuration(breakdown: &ScoreBreakdown, unparseable: bool) -> Vec<Draft> {
    if unparseable {
        return vec![Draft::new(
            "No configuration parameters could be read from the log",
            "Verify the log format: parameters are expected as `Label: value` lines",
        )];
    }

    ParamName::ALL
        .into_iter()
        .filter_map(|param| {
            let detail = breakdown.criterion(Criterion::from(param))?;
            (!detail.is_full()).then(|| parameter_draft(detail, param))
        })
        .collect()
}

fn handoff_draft(detail: &CriterionScore, metrics: &RoamingMetrics, current: &DeviceConfig) -> Option<Draft> {
    let Some(avg) = metrics.avg_handoff_time_ms else {
        return (metrics.total_events > 0).then(|| {
            Draft::new(
                "No handoff times were found for any roaming event",
                "Enable detailed roaming logging so handoff times are recorded",
            )
        });
    };

    let draft = match detail.status {
        Status::Error => Draft::new(
            format!("Average handoff time ({:.1} ms) exceeds 100 ms", avg),
            "Check for interference and AP configuration; aim for handoffs under 50 ms",
        )
        .change_if(enable_if_disabled(current, ParamName::TurboRoaming, "Cut the handoff time, currently too high"))
        .change_if(
            current
                .integer(ParamName::RtsThreshold)
                .filter(|&rts| rts > SLOW_HANDOFF_RTS_LIMIT)
                .and_then(|rts| {
                    integer_change(
                        ParamName::RtsThreshold,
                        Some(rts),
                        512,
                        "Fewer collisions shorten the handoff",
                    )
                }),
        )
        .change_if(enable_if_disabled(
            current,
            ParamName::WmmEnabled,
            "Prioritize control traffic to speed up handoffs",
        )),
        _ => Draft::new(
            format!("Average handoff time ({:.1} ms) is acceptable but above 50 ms", avg),
            "Aim for handoffs under 50 ms",
        )
        .change_if(enable_if_disabled(
            current,
            ParamName::TurboRoaming,
            "Handoff time is acceptable but can be improved",
        )),
    };
    Some(draft)
}

fn snr_improvement_draft(detail: &CriterionScore, metrics: &RoamingMetrics, current: &DeviceConfig) -> Option<Draft> {
    let avg = metrics.avg_snr_improvement?;
    let draft = Draft::new(
        format!("Average SNR improvement per roam ({:.1} dB) is below the 10 dB target", avg),
        "Trigger roaming earlier so the client moves to a clearly better AP",
    );
    if detail.status != Status::Error {
        return Some(draft);
    }

    let change = if current.mechanism() == Some(RoamingMechanism::SignalStrength) {
        Some(mechanism_to_snr("SNR measures the gain of a roam directly"))
    } else if metrics.ping_pong_count > 0 {
        // Lowering the margin would feed the ping-pong
        None
    } else {
        current.integer(ParamName::RoamingDifference).and_then(|diff| {
            integer_change(
                ParamName::RoamingDifference,
                Some(diff),
                (diff - 2).max(5),
                "Roam earlier to gain more SNR per transition",
            )
        })
    };
    Some(draft.change_if(change))
}

fn stability_draft(detail: &CriterionScore, metrics: &RoamingMetrics, current: &DeviceConfig) -> Option<Draft> {
    match detail.status {
        Status::Error => Some(
            Draft::new(
                format!(
                    "{:.1}% of roams follow a connection loss",
                    metrics.connection_loss_ratio() * 100.0
                ),
                "Stabilize the links so the client roams before the connection drops",
            )
            .change_if(enable_if_disabled(
                current,
                ParamName::RemoteConnectionCheck,
                "Detect and repair broken links automatically",
            ))
            .change_if(enable_if_disabled(
                current,
                ParamName::ApAliveCheck,
                "Check AP health proactively to avoid connection losses",
            )),
        ),
        Status::Warning if metrics.total_events > 0 => Some(
            Draft::new(
                format!("{:.1}% of roams are caused by SNR drops", metrics.snr_drop_ratio() * 100.0),
                "Consider adding access points to improve coverage",
            )
            .change_if(
                current
                    .integer(ParamName::RoamingDifference)
                    .filter(|&diff| diff < 8)
                    .and_then(|diff| {
                        integer_change(
                            ParamName::RoamingDifference,
                            Some(diff),
                            8,
                            "A larger margin makes transitions between APs steadier",
                        )
                    }),
            ),
        ),
        _ => None,
    }
}

/// The AP most often left at low SNR, first in key order on ties
fn worst_low_snr_ap(metrics: &RoamingMetrics) -> Option<(&str, usize)> {
    metrics
        .low_snr_by_ap
        .iter()
        .fold(None, |best: Option<(&str, usize)>, (ap, &count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((ap.as_str(), count)),
        })
}

/// Recommendations for an event stream
pub fn for_events(
    breakdown: &ScoreBreakdown,
    metrics: &RoamingMetrics,
    current: &DeviceConfig,
    settings: &AnalyzerSettings,
) -> Vec<Draft> {
    if metrics.total_events == 0 {
        return vec![Draft::new(
            "No roaming events could be parsed from the log",
            "Verify the log format: roaming lines look like `(1) 15/05/2024 10:00:01 [WLAN] Roaming from AP [MAC: ..., SNR: ..] to AP [MAC: ..., SNR: ..]`",
        )];
    }

    let mut drafts = Vec::new();

    for detail in breakdown.details.iter().filter(|d| !d.is_full()) {
        let draft = match detail.criterion {
            Criterion::HandoffTime => handoff_draft(detail, metrics, current),
            Criterion::SnrImprovement => snr_improvement_draft(detail, metrics, current),
            Criterion::RoamingStability => stability_draft(detail, metrics, current),
            _ => None,
        };
        drafts.extend(draft);
    }

    if metrics.ping_pong_count > 0 {
        let diff = current.integer(ParamName::RoamingDifference);
        let recommended = diff.map_or(10, |d| (d + 2).min(10));
        drafts.push(
            Draft::new(
                format!(
                    "{} ping-pong roams detected ({})",
                    metrics.ping_pong_count,
                    metrics.ping_pong_pairs.join(", ")
                ),
                "Raise the roaming difference so the client settles on one AP",
            )
            .change_if(integer_change(
                ParamName::RoamingDifference,
                diff,
                recommended,
                "A small margin lets the client bounce between APs",
            )),
        );
    }

    if let Some(before) = metrics.avg_snr_before.filter(|&snr| snr < LATE_ROAM_SNR_DB) {
        let draft = Draft::new(
            format!(
                "Average SNR before roaming ({:.1} dB) is low; the client waits too long to leave an AP",
                before
            ),
            "Make the client start roaming earlier",
        );
        let change = (current.mechanism() == Some(RoamingMechanism::SignalStrength)).then(|| ParameterChange {
            param: Setting::RoamingThreshold,
            current_value: None,
            recommended_value: "-67 dBm".to_string(),
            reason: "Roam before the signal becomes too weak".to_string(),
        });
        drafts.push(draft.change_if(change));
    }

    if let Some((ap, count)) = worst_low_snr_ap(metrics).filter(|(_, count)| *count > 1) {
        drafts.push(Draft::new(
            format!("AP {} was left at low SNR in {} roaming events", ap, count),
            "Check that AP's placement, antennas and channel",
        ));
    }

    if metrics.total_events < settings.min_events_for_full_analysis {
        drafts.push(Draft::new(
            format!("Only {} roaming events in the log", metrics.total_events),
            "Capture a longer log for a representative analysis",
        ));
    }

    if metrics.deauth_count > settings.deauth_alert_threshold {
        let worst = metrics
            .deauth_by_ap
            .iter()
            .fold(None, |best: Option<(&String, usize)>, (ap, &n)| match best {
                Some((_, m)) if m >= n => best,
                _ => Some((ap, n)),
            });
        let detail = worst
            .map(|(ap, n)| format!(", {} from {}", n, ap))
            .unwrap_or_default();
        drafts.push(Draft::new(
            format!("{} deauthentications found{}", metrics.deauth_count, detail),
            "Check authentication settings and the AP logs for the cause",
        ));
    }

    drafts
}

/// Rank, de-duplicate and order drafts; collect their setting changes.
///
/// Recommendations with the same problem text keep the first. Both lists
/// are stably sorted by rank, highest first, and the change list keeps the
/// first change proposed for each setting.
pub fn finalize(drafts: Vec<Draft>) -> (Vec<Recommendation>, Vec<ParameterChange>) {
    let mut seen_problems = HashSet::new();
    let mut recommendations: Vec<Recommendation> = drafts
        .into_iter()
        .filter(|d| seen_problems.insert(d.problem.clone()))
        .map(Draft::into_recommendation)
        .collect();
    recommendations.sort_by(|a, b| b.rank.cmp(&a.rank));

    let mut seen_settings = HashSet::new();
    let mut changes: Vec<ParameterChange> = recommendations
        .iter()
        .flat_map(|r| r.parameter_changes.iter())
        .filter(|c| seen_settings.insert(c.param))
        .cloned()
        .collect();
    changes.sort_by(|a, b| b.param.priority_rank().cmp(&a.param.priority_rank()));

    debug!(
        "{} recommendations, {} configuration changes",
        recommendations.len(),
        changes.len()
    );
    (recommendations, changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::scoring;

    fn config(values: &[(ParamName, Value)]) -> DeviceConfig {
        let mut config = DeviceConfig::default();
        for (name, value) in values {
            config.set(*name, *value);
        }
        config
    }

    #[test]
    fn test_priority_mapping() {
        assert_eq!(priority_for_rank(90), 1);
        assert_eq!(priority_for_rank(85), 1);
        assert_eq!(priority_for_rank(80), 2);
        assert_eq!(priority_for_rank(70), 3);
        assert_eq!(priority_for_rank(60), 4);
        assert_eq!(priority_for_rank(50), 5);
    }

    #[test]
    fn test_configuration_recommendations() {
        let extracted = config(&[
            (ParamName::RoamingMechanism, Value::Mechanism(RoamingMechanism::SignalStrength)),
            (ParamName::TurboRoaming, Value::Bool(false)),
        ]);
        let breakdown = scoring::score_configuration(&extracted);
        let (recs, changes) = finalize(for_configuration(&breakdown, false));

        // Eight missing parameters plus two wrong ones
        assert_eq!(recs.len(), 10);
        assert_eq!(recs[0].parameter_changes[0].param, Setting::TurboRoaming);
        assert_eq!(recs[0].priority, 1);

        let mechanism = changes
            .iter()
            .find(|c| c.param == Setting::RoamingMechanism)
            .unwrap();
        assert_eq!(mechanism.current_value.as_deref(), Some("Signal Strength"));
        assert_eq!(mechanism.recommended_value, "SNR");

        let ranks: Vec<u32> = changes.iter().map(|c| c.param.priority_rank()).collect();
        assert!(ranks.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_unparseable_configuration() {
        let breakdown = scoring::score_configuration(&DeviceConfig::default());
        let (recs, changes) = finalize(for_configuration(&breakdown, true));
        assert_eq!(recs.len(), 1);
        assert!(recs[0].solution.starts_with("Verify the log format"));
        assert!(changes.is_empty());
    }

    #[test]
    fn test_ping_pong_raises_roaming_difference() {
        let mut metrics = RoamingMetrics {
            total_events: 4,
            avg_handoff_time_ms: Some(30.0),
            avg_snr_before: Some(25.0),
            avg_snr_improvement: Some(12.0),
            ping_pong_count: 2,
            ping_pong_pairs: vec!["A <-> B".to_string()],
            ..RoamingMetrics::default()
        };
        metrics.reason_histogram.unknown = 4;
        let breakdown = scoring::score_events(&metrics);
        let current = config(&[(ParamName::RoamingDifference, Value::Integer(9))]);

        let (recs, changes) = finalize(for_events(&breakdown, &metrics, &current, &AnalyzerSettings::default()));
        assert_eq!(recs.len(), 1);
        assert!(recs[0].problem.contains("A <-> B"));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].current_value.as_deref(), Some("9 dB"));
        assert_eq!(changes[0].recommended_value, "10 dB");
    }

    fn ping_pong_metrics(avg_snr_improvement: f64) -> RoamingMetrics {
        let mut metrics = RoamingMetrics {
            total_events: 4,
            avg_handoff_time_ms: Some(30.0),
            avg_snr_before: Some(25.0),
            avg_snr_improvement: Some(avg_snr_improvement),
            ping_pong_count: 1,
            ping_pong_pairs: vec!["A <-> B".to_string()],
            ..RoamingMetrics::default()
        };
        metrics.reason_histogram.unknown = 4;
        metrics
    }

    #[test]
    fn test_no_change_when_already_at_recommended_value() {
        let metrics = ping_pong_metrics(12.0);
        let breakdown = scoring::score_events(&metrics);
        let current = config(&[(ParamName::RoamingDifference, Value::Integer(10))]);

        let (recs, changes) = finalize(for_events(&breakdown, &metrics, &current, &AnalyzerSettings::default()));
        assert_eq!(recs.len(), 1);
        assert!(recs[0].parameter_changes.is_empty());
        assert!(changes.is_empty());

        // Low SNR gain at the lowest margin proposes nothing either
        let mut metrics = ping_pong_metrics(2.0);
        metrics.ping_pong_count = 0;
        metrics.ping_pong_pairs.clear();
        let breakdown = scoring::score_events(&metrics);
        let current = config(&[(ParamName::RoamingDifference, Value::Integer(5))]);
        let (_, changes) = finalize(for_events(&breakdown, &metrics, &current, &AnalyzerSettings::default()));
        assert!(changes.is_empty());
    }

    #[test]
    fn test_ping_pong_wins_over_lowering_the_margin() {
        let metrics = ping_pong_metrics(2.0);
        let breakdown = scoring::score_events(&metrics);
        let current = config(&[(ParamName::RoamingDifference, Value::Integer(8))]);

        let (recs, changes) = finalize(for_events(&breakdown, &metrics, &current, &AnalyzerSettings::default()));
        let proposed: Vec<&str> = recs
            .iter()
            .flat_map(|r| r.parameter_changes.iter())
            .map(|c| c.recommended_value.as_str())
            .collect();
        assert_eq!(proposed, vec!["10 dB"]);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].current_value.as_deref(), Some("8 dB"));
        assert_eq!(changes[0].recommended_value, "10 dB");

        // Without ping-pong the margin is lowered
        let mut calm = metrics.clone();
        calm.ping_pong_count = 0;
        calm.ping_pong_pairs.clear();
        let (_, changes) = finalize(for_events(&breakdown, &calm, &current, &AnalyzerSettings::default()));
        assert_eq!(changes[0].recommended_value, "6 dB");
    }

    #[test]
    fn test_slow_handoff_changes_follow_current_config() {
        let metrics = RoamingMetrics {
            total_events: 5,
            avg_handoff_time_ms: Some(180.0),
            avg_snr_before: Some(22.0),
            avg_snr_improvement: Some(12.0),
            reason_histogram: ReasonHistogram {
                unknown: 5,
                ..ReasonHistogram::default()
            },
            ..RoamingMetrics::default()
        };
        let breakdown = scoring::score_events(&metrics);
        let current = config(&[
            (ParamName::TurboRoaming, Value::Bool(false)),
            (ParamName::RtsThreshold, Value::Integer(2346)),
            (ParamName::WmmEnabled, Value::Bool(true)),
        ]);

        let (recs, changes) = finalize(for_events(&breakdown, &metrics, &current, &AnalyzerSettings::default()));
        assert_eq!(recs.len(), 1);
        let params: Vec<Setting> = changes.iter().map(|c| c.param).collect();
        assert_eq!(params, vec![Setting::TurboRoaming, Setting::RtsThreshold]);
        assert_eq!(changes[1].recommended_value, "512");
    }

    #[test]
    fn test_zero_events_ask_to_verify_format() {
        let metrics = RoamingMetrics::default();
        let breakdown = scoring::score_events(&metrics);
        let (recs, _) = finalize(for_events(&breakdown, &metrics, &DeviceConfig::default(), &AnalyzerSettings::default()));
        assert_eq!(recs.len(), 1);
        assert!(recs[0].solution.starts_with("Verify the log format"));
    }

    #[test]
    fn test_duplicate_problems_collapse() {
        let drafts = vec![
            Draft::new("same", "first"),
            Draft::new("same", "second"),
            Draft::new("other", "third"),
        ];
        let (recs, _) = finalize(drafts);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].solution, "first");
    }

    #[test]
    fn test_worst_low_snr_ap_prefers_first_on_tie() {
        let mut metrics = RoamingMetrics::default();
        metrics.low_snr_by_ap.insert("B".to_string(), 2);
        metrics.low_snr_by_ap.insert("A".to_string(), 2);
        metrics.low_snr_by_ap.insert("C".to_string(), 1);
        assert_eq!(worst_low_snr_ap(&metrics), Some(("A", 2)));
    }
}
