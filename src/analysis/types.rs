//! Core data types for roaming log analysis.
//!
//! Every record here is created fresh by one `analyze` call and is fully
//! determined by the log text and the supplied device configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Score at or above which an analysis passes the audit gate. Not configurable.
pub const PASS_THRESHOLD: u8 = 70;

/// Upper bound of every rubric after normalization.
pub const MAX_SCORE: u8 = 100;

/// Kind of log text handed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    /// Static `key: value` configuration export
    ConfigurationDump,
    /// Timestamped `[WLAN] Roaming from AP ...` lines
    EventStream,
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogKind::ConfigurationDump => write!(f, "configuration dump"),
            LogKind::EventStream => write!(f, "event stream"),
        }
    }
}

/// Radio and roaming settings known to the parameter catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamName {
    MinTransmissionRate,
    MaxTransmissionPower,
    RtsThreshold,
    FragmentationThreshold,
    RoamingMechanism,
    RoamingDifference,
    RemoteConnectionCheck,
    WmmEnabled,
    TurboRoaming,
    ApAliveCheck,
}

impl ParamName {
    /// Catalog order
    pub const ALL: [ParamName; 10] = [
        ParamName::MinTransmissionRate,
        ParamName::MaxTransmissionPower,
        ParamName::RtsThreshold,
        ParamName::FragmentationThreshold,
        ParamName::RoamingMechanism,
        ParamName::RoamingDifference,
        ParamName::RemoteConnectionCheck,
        ParamName::WmmEnabled,
        ParamName::TurboRoaming,
        ParamName::ApAliveCheck,
    ];

    /// Key used in device configuration maps
    pub fn key(&self) -> &'static str {
        match self {
            ParamName::MinTransmissionRate => "min_transmission_rate",
            ParamName::MaxTransmissionPower => "max_transmission_power",
            ParamName::RtsThreshold => "rts_threshold",
            ParamName::FragmentationThreshold => "fragmentation_threshold",
            ParamName::RoamingMechanism => "roaming_mechanism",
            ParamName::RoamingDifference => "roaming_difference",
            ParamName::RemoteConnectionCheck => "remote_connection_check",
            ParamName::WmmEnabled => "wmm_enabled",
            ParamName::TurboRoaming => "turbo_roaming",
            ParamName::ApAliveCheck => "ap_alive_check",
        }
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ParamName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(&[' ', '-'][..], "_");
        ParamName::ALL
            .into_iter()
            .find(|p| p.key() == key)
            .ok_or_else(|| format!("Unknown parameter: {}", s))
    }
}

/// Value type a parameter is parsed as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Integer,
    Boolean,
    Mechanism,
}

impl ParamKind {
    /// Human readable type name used in error messages
    pub fn expected(&self) -> &'static str {
        match self {
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean (enable/disable, on/off, true/false, 1/0)",
            ParamKind::Mechanism => "roaming mechanism (snr or signal strength)",
        }
    }
}

/// What the client compares when deciding to roam
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoamingMechanism {
    Snr,
    SignalStrength,
}

impl RoamingMechanism {
    pub fn label(&self) -> &'static str {
        match self {
            RoamingMechanism::Snr => "SNR",
            RoamingMechanism::SignalStrength => "Signal Strength",
        }
    }
}

/// A typed parameter or metric value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Mechanism(RoamingMechanism),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_mechanism(&self) -> Option<RoamingMechanism> {
        match self {
            Value::Mechanism(m) => Some(*m),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(true) => write!(f, "Enabled"),
            Value::Bool(false) => write!(f, "Disabled"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Number(v) => write!(f, "{:.1}", v),
            Value::Mechanism(m) => f.write_str(m.label()),
        }
    }
}

/// A value as supplied by the caller (UI form, YAML or JSON file)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawConfigValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl fmt::Display for RawConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawConfigValue::Bool(v) => write!(f, "{}", v),
            RawConfigValue::Integer(v) => write!(f, "{}", v),
            RawConfigValue::Text(v) => f.write_str(v),
        }
    }
}

/// Caller-supplied current configuration, keyed by [`ParamName::key`]
pub type RawConfig = BTreeMap<String, RawConfigValue>;

/// Current device configuration after type coercion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceConfig {
    values: BTreeMap<ParamName, Value>,
}

impl DeviceConfig {
    pub fn set(&mut self, name: ParamName, value: Value) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: ParamName) -> Option<Value> {
        self.values.get(&name).copied()
    }

    pub fn integer(&self, name: ParamName) -> Option<i64> {
        self.get(name).and_then(|v| v.as_i64())
    }

    pub fn flag(&self, name: ParamName) -> Option<bool> {
        self.get(name).and_then(|v| v.as_bool())
    }

    pub fn mechanism(&self) -> Option<RoamingMechanism> {
        self.get(ParamName::RoamingMechanism)
            .and_then(|v| v.as_mechanism())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A parameter searched for in a configuration dump
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedParameter {
    pub name: ParamName,
    /// Text following the label, as found
    pub raw_value: Option<String>,
    /// `None` when the label was absent or its value did not parse
    pub parsed_value: Option<Value>,
}

/// Why the client roamed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoamingReason {
    SnrDrop,
    ConnectionLoss,
    Unknown,
}

impl RoamingReason {
    pub const ALL: [RoamingReason; 3] = [
        RoamingReason::SnrDrop,
        RoamingReason::ConnectionLoss,
        RoamingReason::Unknown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RoamingReason::SnrDrop => "SNR drop",
            RoamingReason::ConnectionLoss => "Connection loss",
            RoamingReason::Unknown => "Unknown",
        }
    }
}

/// A single AP-to-AP transition found in an event stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoamingEvent {
    /// Sequence number printed by the device, `(N)`
    pub id: u64,
    /// Timestamp text as printed by the device
    pub raw_timestamp: String,
    pub timestamp: Option<NaiveDateTime>,
    pub source_ap: String,
    pub target_ap: String,
    /// dB
    pub source_snr: i32,
    /// dB
    pub target_snr: i32,
    /// dBm
    pub source_noise_floor: Option<i32>,
    /// dBm
    pub target_noise_floor: Option<i32>,
    /// Always `target_snr - source_snr`
    pub snr_improvement: i32,
    pub handoff_time_ms: Option<u32>,
    pub association_time_ms: Option<u32>,
    pub reason: RoamingReason,
    /// SNR values were estimated from RSSI readings
    pub snr_from_rssi: bool,
}

/// Deauthentication notice seen in an event stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeauthEvent {
    /// 1-based line number in the log text
    pub line_number: usize,
    pub ap: Option<String>,
}

/// Roaming reason counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasonHistogram {
    pub snr_drop: usize,
    pub connection_loss: usize,
    pub unknown: usize,
}

impl ReasonHistogram {
    pub fn record(&mut self, reason: RoamingReason) {
        match reason {
            RoamingReason::SnrDrop => self.snr_drop += 1,
            RoamingReason::ConnectionLoss => self.connection_loss += 1,
            RoamingReason::Unknown => self.unknown += 1,
        }
    }

    pub fn count(&self, reason: RoamingReason) -> usize {
        match reason {
            RoamingReason::SnrDrop => self.snr_drop,
            RoamingReason::ConnectionLoss => self.connection_loss,
            RoamingReason::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> usize {
        self.snr_drop + self.connection_loss + self.unknown
    }
}

/// Handoff time buckets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffDistribution {
    /// 0-50 ms
    pub up_to_50ms: usize,
    /// 51-100 ms
    pub up_to_100ms: usize,
    /// 101-200 ms
    pub up_to_200ms: usize,
    /// > 200 ms
    pub above_200ms: usize,
}

impl HandoffDistribution {
    pub fn record(&mut self, handoff_ms: u32) {
        match handoff_ms {
            0..=50 => self.up_to_50ms += 1,
            51..=100 => self.up_to_100ms += 1,
            101..=200 => self.up_to_200ms += 1,
            _ => self.above_200ms += 1,
        }
    }
}

/// Summary statistics over the roaming events of one log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoamingMetrics {
    pub total_events: usize,
    /// Events that carried a handoff time
    pub events_with_handoff_time: usize,
    pub avg_handoff_time_ms: Option<f64>,
    pub min_handoff_time_ms: Option<u32>,
    pub max_handoff_time_ms: Option<u32>,
    pub avg_snr_before: Option<f64>,
    pub avg_snr_after: Option<f64>,
    pub avg_snr_improvement: Option<f64>,
    pub avg_association_time_ms: Option<f64>,
    pub reason_histogram: ReasonHistogram,
    pub handoff_distribution: HandoffDistribution,
    pub ping_pong_count: usize,
    /// "AP1 <-> AP2" for each pair that ping-ponged, first occurrence order
    pub ping_pong_pairs: Vec<String>,
    pub deauth_count: usize,
    pub deauth_by_ap: BTreeMap<String, usize>,
    /// Roams away from an AP whose SNR was below 15 dB, per source AP
    pub low_snr_by_ap: BTreeMap<String, usize>,
}

impl RoamingMetrics {
    /// Share of events caused by a connection loss, 0 when there are no events
    pub fn connection_loss_ratio(&self) -> f64 {
        self.ratio(RoamingReason::ConnectionLoss)
    }

    /// Share of events caused by an SNR drop, 0 when there are no events
    pub fn snr_drop_ratio(&self) -> f64 {
        self.ratio(RoamingReason::SnrDrop)
    }

    fn ratio(&self, reason: RoamingReason) -> f64 {
        if self.total_events == 0 {
            0.0
        } else {
            self.reason_histogram.count(reason) as f64 / self.total_events as f64
        }
    }
}

/// A line of the score breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    MinTransmissionRate,
    MaxTransmissionPower,
    RtsThreshold,
    FragmentationThreshold,
    RoamingMechanism,
    RoamingDifference,
    RemoteConnectionCheck,
    WmmEnabled,
    TurboRoaming,
    ApAliveCheck,
    HandoffTime,
    SnrImprovement,
    RoamingStability,
}

impl Criterion {
    pub fn label(&self) -> &'static str {
        match self {
            Criterion::HandoffTime => "Handoff time",
            Criterion::SnrImprovement => "SNR improvement",
            Criterion::RoamingStability => "Roaming stability",
            Criterion::MinTransmissionRate => Setting::MinTransmissionRate.label(),
            Criterion::MaxTransmissionPower => Setting::MaxTransmissionPower.label(),
            Criterion::RtsThreshold => Setting::RtsThreshold.label(),
            Criterion::FragmentationThreshold => Setting::FragmentationThreshold.label(),
            Criterion::RoamingMechanism => Setting::RoamingMechanism.label(),
            Criterion::RoamingDifference => Setting::RoamingDifference.label(),
            Criterion::RemoteConnectionCheck => Setting::RemoteConnectionCheck.label(),
            Criterion::WmmEnabled => Setting::WmmEnabled.label(),
            Criterion::TurboRoaming => Setting::TurboRoaming.label(),
            Criterion::ApAliveCheck => Setting::ApAliveCheck.label(),
        }
    }
}

impl From<ParamName> for Criterion {
    fn from(name: ParamName) -> Self {
        match name {
            ParamName::MinTransmissionRate => Criterion::MinTransmissionRate,
            ParamName::MaxTransmissionPower => Criterion::MaxTransmissionPower,
            ParamName::RtsThreshold => Criterion::RtsThreshold,
            ParamName::FragmentationThreshold => Criterion::FragmentationThreshold,
            ParamName::RoamingMechanism => Criterion::RoamingMechanism,
            ParamName::RoamingDifference => Criterion::RoamingDifference,
            ParamName::RemoteConnectionCheck => Criterion::RemoteConnectionCheck,
            ParamName::WmmEnabled => Criterion::WmmEnabled,
            ParamName::TurboRoaming => Criterion::TurboRoaming,
            ParamName::ApAliveCheck => Criterion::ApAliveCheck,
        }
    }
}

/// Outcome of one criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Warning,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "ok"),
            Status::Warning => write!(f, "warning"),
            Status::Error => write!(f, "error"),
        }
    }
}

/// Points earned by one criterion, normalized to its rubric's 100 points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionScore {
    pub criterion: Criterion,
    /// `None` when the parameter or metric was absent
    pub value: Option<Value>,
    pub ideal_value: Option<Value>,
    pub range_low: Option<f64>,
    pub range_high: Option<f64>,
    pub status: Status,
    pub earned_points: f64,
    pub max_points: f64,
}

impl CriterionScore {
    pub fn is_full(&self) -> bool {
        self.earned_points >= self.max_points - 1e-9
    }
}

/// Per-criterion breakdown and the overall score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub details: Vec<CriterionScore>,
    /// 0-100
    pub score: u8,
    pub max_score: u8,
    /// `score >= 70`
    pub passed: bool,
}

impl ScoreBreakdown {
    pub fn criterion(&self, criterion: Criterion) -> Option<&CriterionScore> {
        self.details.iter().find(|d| d.criterion == criterion)
    }
}

/// Anything a recommendation can ask to change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Setting {
    MinTransmissionRate,
    MaxTransmissionPower,
    RtsThreshold,
    FragmentationThreshold,
    RoamingMechanism,
    RoamingDifference,
    RemoteConnectionCheck,
    WmmEnabled,
    TurboRoaming,
    ApAliveCheck,
    /// Signal level (dBm) below which the client starts looking for a new AP
    RoamingThreshold,
}

impl Setting {
    /// Name shown on the device's web console
    pub fn label(&self) -> &'static str {
        match self {
            Setting::MinTransmissionRate => "Minimum transmission rate",
            Setting::MaxTransmissionPower => "Maximum transmission power",
            Setting::RtsThreshold => "RTS threshold",
            Setting::FragmentationThreshold => "Fragmentation threshold",
            Setting::RoamingMechanism => "Roaming mechanism",
            Setting::RoamingDifference => "Roaming difference",
            Setting::RemoteConnectionCheck => "Remote connection check",
            Setting::WmmEnabled => "WMM",
            Setting::TurboRoaming => "Turbo Roaming",
            Setting::ApAliveCheck => "AP alive check",
            Setting::RoamingThreshold => "Roaming threshold",
        }
    }

    /// Ranking used to order recommendations, higher first
    pub fn priority_rank(&self) -> u32 {
        match self {
            Setting::TurboRoaming => 90,
            Setting::RoamingThreshold => 85,
            Setting::RoamingMechanism => 85,
            Setting::RemoteConnectionCheck => 85,
            Setting::ApAliveCheck => 80,
            Setting::RoamingDifference => 75,
            Setting::WmmEnabled => 70,
            Setting::MinTransmissionRate => 65,
            Setting::MaxTransmissionPower => 60,
            Setting::RtsThreshold => 55,
            Setting::FragmentationThreshold => 50,
        }
    }
}

impl From<ParamName> for Setting {
    fn from(name: ParamName) -> Self {
        match name {
            ParamName::MinTransmissionRate => Setting::MinTransmissionRate,
            ParamName::MaxTransmissionPower => Setting::MaxTransmissionPower,
            ParamName::RtsThreshold => Setting::RtsThreshold,
            ParamName::FragmentationThreshold => Setting::FragmentationThreshold,
            ParamName::RoamingMechanism => Setting::RoamingMechanism,
            ParamName::RoamingDifference => Setting::RoamingDifference,
            ParamName::RemoteConnectionCheck => Setting::RemoteConnectionCheck,
            ParamName::WmmEnabled => Setting::WmmEnabled,
            ParamName::TurboRoaming => Setting::TurboRoaming,
            ParamName::ApAliveCheck => Setting::ApAliveCheck,
        }
    }
}

/// A concrete setting change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterChange {
    pub param: Setting,
    /// `None` when the current value is unknown
    pub current_value: Option<String>,
    pub recommended_value: String,
    pub reason: String,
}

/// Problem/solution pair with optional setting changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub problem: String,
    pub solution: String,
    /// 1 (highest) to 5 (lowest), derived from `rank`
    pub priority: u8,
    /// Highest priority-table rank among the changed settings, 50 without changes
    pub rank: u32,
    pub parameter_changes: Vec<ParameterChange>,
}

/// Rubric-specific facts, discriminated by `logKind` in JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "logKind",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum Findings {
    ConfigurationDump {
        parameters: Vec<ExtractedParameter>,
    },
    EventStream {
        roaming_metrics: RoamingMetrics,
        roaming_events: Vec<RoamingEvent>,
    },
}

/// The engine's single output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(flatten)]
    pub findings: Findings,
    #[serde(flatten)]
    pub breakdown: ScoreBreakdown,
    pub recommendations: Vec<Recommendation>,
    /// All parameter changes, de-duplicated by setting, highest rank first
    pub config_changes: Vec<ParameterChange>,
    /// Non-fatal conditions met during the analysis
    pub warnings: Vec<AnalysisError>,
    /// Supplied by the caller; the engine never reads the clock
    pub timestamp: Option<DateTime<Utc>>,
}

impl AnalysisResult {
    pub fn log_kind(&self) -> LogKind {
        match self.findings {
            Findings::ConfigurationDump { .. } => LogKind::ConfigurationDump,
            Findings::EventStream { .. } => LogKind::EventStream,
        }
    }

    pub fn score(&self) -> u8 {
        self.breakdown.score
    }

    pub fn passed(&self) -> bool {
        self.breakdown.passed
    }

    pub fn metrics(&self) -> Option<&RoamingMetrics> {
        match &self.findings {
            Findings::EventStream { roaming_metrics, .. } => Some(roaming_metrics),
            Findings::ConfigurationDump { .. } => None,
        }
    }

    pub fn events(&self) -> Option<&[RoamingEvent]> {
        match &self.findings {
            Findings::EventStream { roaming_events, .. } => Some(roaming_events),
            Findings::ConfigurationDump { .. } => None,
        }
    }

    pub fn parameters(&self) -> Option<&[ExtractedParameter]> {
        match &self.findings {
            Findings::ConfigurationDump { parameters } => Some(parameters),
            Findings::EventStream { .. } => None,
        }
    }

    /// No facts could be extracted; callers should not present the score as a rating
    pub fn is_unparseable(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, AnalysisError::UnparseableLog { .. }))
    }
}
