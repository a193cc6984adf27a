//! Parameter catalog: ideal values, acceptable ranges and scoring weights.
//!
//! The ten configuration parameters carry 62 raw points and the three
//! event-stream metrics the remaining 38. Each analysis uses exactly one of
//! the two rubrics and normalizes it to 100.

use super::types::{Criterion, ParamKind, ParamName, RoamingMechanism, Value};

/// What a value outside the acceptable range costs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breach {
    /// Half the weight, status `warning`
    Recoverable,
    /// No points, status `error`
    Disqualifying,
}

/// Catalog entry of a configuration parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterDef {
    pub name: ParamName,
    pub kind: ParamKind,
    pub ideal: Value,
    /// Inclusive, numeric parameters only
    pub range: Option<(i64, i64)>,
    /// Raw points in the configuration rubric
    pub weight: u32,
    pub below_range: Breach,
    pub above_range: Breach,
    /// Unit appended when displaying values
    pub unit: &'static str,
}

impl ParameterDef {
    /// Weight normalized so the configuration rubric sums to 100
    pub fn normalized_weight(&self) -> f64 {
        f64::from(self.weight) * 100.0 / f64::from(config_rubric_weight())
    }

    /// Display a raw value with this parameter's unit
    pub fn display(&self, value: &Value) -> String {
        if self.unit.is_empty() {
            value.to_string()
        } else {
            format!("{} {}", value, self.unit)
        }
    }
}

/// Catalog entry of an event-stream metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricDef {
    pub criterion: Criterion,
    pub ideal: Option<f64>,
    pub range: Option<(f64, f64)>,
    /// Raw points in the event-stream rubric
    pub weight: u32,
}

impl MetricDef {
    /// Weight normalized so the event-stream rubric sums to 100
    pub fn normalized_weight(&self) -> f64 {
        f64::from(self.weight) * 100.0 / f64::from(event_rubric_weight())
    }
}

const fn numeric(
    name: ParamName,
    ideal: i64,
    range: (i64, i64),
    weight: u32,
    below_range: Breach,
    above_range: Breach,
    unit: &'static str,
) -> ParameterDef {
    ParameterDef {
        name,
        kind: ParamKind::Integer,
        ideal: Value::Integer(ideal),
        range: Some(range),
        weight,
        below_range,
        above_range,
        unit,
    }
}

const fn flag(name: ParamName, weight: u32) -> ParameterDef {
    ParameterDef {
        name,
        kind: ParamKind::Boolean,
        ideal: Value::Bool(true),
        range: None,
        weight,
        below_range: Breach::Disqualifying,
        above_range: Breach::Disqualifying,
        unit: "",
    }
}

/// Configuration rubric, in catalog order
pub static PARAMETERS: [ParameterDef; 10] = [
    // Too low a floor rate drags every client down; too high strands distant ones
    numeric(
        ParamName::MinTransmissionRate,
        12,
        (6, 24),
        8,
        Breach::Disqualifying,
        Breach::Recoverable,
        "Mbps",
    ),
    // Above 23 dBm is over the legal ceiling
    numeric(
        ParamName::MaxTransmissionPower,
        20,
        (17, 23),
        8,
        Breach::Recoverable,
        Breach::Disqualifying,
        "dBm",
    ),
    numeric(
        ParamName::RtsThreshold,
        512,
        (256, 2346),
        7,
        Breach::Disqualifying,
        Breach::Recoverable,
        "",
    ),
    numeric(
        ParamName::FragmentationThreshold,
        2346,
        (256, 2346),
        5,
        Breach::Recoverable,
        Breach::Recoverable,
        "",
    ),
    ParameterDef {
        name: ParamName::RoamingMechanism,
        kind: ParamKind::Mechanism,
        ideal: Value::Mechanism(RoamingMechanism::Snr),
        range: None,
        weight: 10,
        below_range: Breach::Recoverable,
        above_range: Breach::Recoverable,
        unit: "",
    },
    // Below 5 dB the client ping-pongs between APs
    numeric(
        ParamName::RoamingDifference,
        8,
        (5, 10),
        10,
        Breach::Disqualifying,
        Breach::Recoverable,
        "dB",
    ),
    flag(ParamName::RemoteConnectionCheck, 5),
    flag(ParamName::WmmEnabled, 3),
    flag(ParamName::TurboRoaming, 4),
    flag(ParamName::ApAliveCheck, 2),
];

/// Event-stream rubric
pub static METRICS: [MetricDef; 3] = [
    MetricDef {
        criterion: Criterion::HandoffTime,
        ideal: Some(50.0),
        range: Some((0.0, 100.0)),
        weight: 15,
    },
    MetricDef {
        criterion: Criterion::SnrImprovement,
        ideal: Some(10.0),
        range: Some((5.0, 20.0)),
        weight: 15,
    },
    MetricDef {
        // Percent of roams not caused by a connection loss
        criterion: Criterion::RoamingStability,
        ideal: Some(100.0),
        range: None,
        weight: 8,
    },
];

/// Definition of a catalog parameter
pub fn definition(name: ParamName) -> &'static ParameterDef {
    let index = match name {
        ParamName::MinTransmissionRate => 0,
        ParamName::MaxTransmissionPower => 1,
        ParamName::RtsThreshold => 2,
        ParamName::FragmentationThreshold => 3,
        ParamName::RoamingMechanism => 4,
        ParamName::RoamingDifference => 5,
        ParamName::RemoteConnectionCheck => 6,
        ParamName::WmmEnabled => 7,
        ParamName::TurboRoaming => 8,
        ParamName::ApAliveCheck => 9,
    };
    &PARAMETERS[index]
}

/// Look a parameter up by configuration key or console label
pub fn lookup(name: &str) -> Option<&'static ParameterDef> {
    if let Ok(param) = name.parse::<ParamName>() {
        return Some(definition(param));
    }
    let wanted = name.trim();
    PARAMETERS.iter().find(|def| {
        super::types::Setting::from(def.name)
            .label()
            .eq_ignore_ascii_case(wanted)
    })
}

/// Definition of an event-stream metric
pub fn metric(criterion: Criterion) -> Option<&'static MetricDef> {
    METRICS.iter().find(|m| m.criterion == criterion)
}

/// Raw points carried by the configuration rubric
pub fn config_rubric_weight() -> u32 {
    PARAMETERS.iter().map(|p| p.weight).sum()
}

/// Raw points carried by the event-stream rubric
pub fn event_rubric_weight() -> u32 {
    METRICS.iter().map(|m| m.weight).sum()
}
