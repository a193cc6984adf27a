//! Parameter extraction from configuration dumps.
//!
//! Also holds the token rules used to coerce caller-supplied configuration
//! values, so a value typed into a form and the same value found in a dump
//! parse identically.

use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;

use super::catalog;
use super::types::*;
use crate::error::AnalysisError;

/// Label patterns, one per catalog parameter, each followed by `:` or `=` and
/// the rest of the line. Case-insensitive; spaces, `_` and `-` between words
/// are interchangeable.
pub struct ConfigPatterns {
    labels: Vec<(ParamName, Regex)>,
    leading_integer: Regex,
}

impl ConfigPatterns {
    pub fn new() -> Self {
        let labels = ParamName::ALL
            .into_iter()
            .map(|name| {
                let pattern = format!(r"(?i){}\s*[=:]\s*([^\r\n]*)", label_pattern(name));
                (name, Regex::new(&pattern).expect("Invalid parameter label regex"))
            })
            .collect();

        Self {
            labels,
            leading_integer: Regex::new(r"^\s*(-?\d+)(?:[^\d.]|$)")
                .expect("Invalid leading integer regex"),
        }
    }

    fn label(&self, name: ParamName) -> Option<&Regex> {
        self.labels
            .iter()
            .find(|(param, _)| *param == name)
            .map(|(_, re)| re)
    }
}

impl Default for ConfigPatterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Global patterns instance
pub static PATTERNS: LazyLock<ConfigPatterns> = LazyLock::new(ConfigPatterns::new);

fn label_pattern(name: ParamName) -> &'static str {
    match name {
        // "Min Transmission Rate", "Minimum TX rate"
        ParamName::MinTransmissionRate => r"\bmin(?:imum)?\.?[\s_-]*(?:transmission|tx)[\s_-]*rate",
        ParamName::MaxTransmissionPower => r"\bmax(?:imum)?\.?[\s_-]*(?:transmission|tx)[\s_-]*power",
        ParamName::RtsThreshold => r"\brts[\s_-]*threshold",
        ParamName::FragmentationThreshold => r"\bfrag(?:mentation)?[\s_-]*threshold",
        // Some firmware labels the mechanism "Roaming threshold" or "Roaming mode"
        ParamName::RoamingMechanism => r"\broaming[\s_-]*(?:mechanism|threshold|mode)",
        ParamName::RoamingDifference => r"\broaming[\s_-]*diff(?:erence)?",
        ParamName::RemoteConnectionCheck => r"\bremote[\s_-]*connection[\s_-]*check",
        ParamName::WmmEnabled => r"\bwmm(?:[\s_-]*enabled?)?",
        ParamName::TurboRoaming => r"\bturbo[\s_-]*roaming",
        ParamName::ApAliveCheck => r"\bap[\s_-]*alive[\s_-]*check",
    }
}

/// Search a configuration dump for every catalog parameter.
///
/// Returns one entry per parameter in catalog order. When a label occurs more
/// than once the first occurrence whose value parses wins; a parameter whose
/// label is absent, or whose values never parse, has `parsed_value: None`.
pub fn extract_parameters(text: &str) -> Vec<ExtractedParameter> {
    ParamName::ALL
        .into_iter()
        .map(|name| extract_parameter(text, name))
        .collect()
}

fn extract_parameter(text: &str, name: ParamName) -> ExtractedParameter {
    let kind = catalog::definition(name).kind;
    let mut first_raw: Option<String> = None;

    if let Some(re) = PATTERNS.label(name) {
        for caps in re.captures_iter(text) {
            let raw = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            if let Some(value) = parse_token(kind, raw) {
                debug!("Found {} = {} ({:?})", name, raw, value);
                return ExtractedParameter {
                    name,
                    raw_value: Some(raw.to_string()),
                    parsed_value: Some(value),
                };
            }
            if first_raw.is_none() {
                first_raw = Some(raw.to_string());
            }
        }
    }

    if let Some(ref raw) = first_raw {
        debug!("Label for {} found but value {:?} did not parse", name, raw);
    }

    ExtractedParameter {
        name,
        raw_value: first_raw,
        parsed_value: None,
    }
}

/// Parse a value token according to the parameter kind
pub fn parse_token(kind: ParamKind, token: &str) -> Option<Value> {
    match kind {
        ParamKind::Integer => parse_integer_token(token).map(Value::Integer),
        ParamKind::Boolean => parse_bool_token(token).map(Value::Bool),
        ParamKind::Mechanism => parse_mechanism_phrase(token).map(Value::Mechanism),
    }
}

/// Leading integer of a token, units allowed after it ("20 dBm", "12Mbps")
pub fn parse_integer_token(token: &str) -> Option<i64> {
    let caps = PATTERNS.leading_integer.captures(token)?;
    caps.get(1)?.as_str().parse().ok()
}

/// enable/on/true/1 and disable/off/false/0, case-insensitive
pub fn parse_bool_token(token: &str) -> Option<bool> {
    let word = token
        .trim()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .next()?
        .to_ascii_lowercase();

    match word.as_str() {
        "enable" | "enabled" | "on" | "true" | "1" | "yes" => Some(true),
        "disable" | "disabled" | "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// "Based on SNR" -> snr, "Signal Strength" / "signal_strength" -> signal_strength
pub fn parse_mechanism_phrase(phrase: &str) -> Option<RoamingMechanism> {
    let lowered = phrase.to_ascii_lowercase();
    if lowered.contains("snr") {
        Some(RoamingMechanism::Snr)
    } else if lowered.contains("signal") || lowered.contains("rssi") {
        Some(RoamingMechanism::SignalStrength)
    } else {
        None
    }
}

/// Coerce one caller-supplied value against its parameter's type
pub fn coerce_config_value(name: ParamName, raw: &RawConfigValue) -> Result<Value, AnalysisError> {
    let kind = catalog::definition(name).kind;
    let parsed = match (kind, raw) {
        (ParamKind::Integer, RawConfigValue::Integer(v)) => Some(Value::Integer(*v)),
        (ParamKind::Boolean, RawConfigValue::Bool(v)) => Some(Value::Bool(*v)),
        (ParamKind::Boolean, RawConfigValue::Integer(0)) => Some(Value::Bool(false)),
        (ParamKind::Boolean, RawConfigValue::Integer(1)) => Some(Value::Bool(true)),
        (_, RawConfigValue::Text(text)) => parse_token(kind, text),
        _ => None,
    };

    parsed.ok_or_else(|| AnalysisError::InvalidConfigValue {
        param: name,
        value: raw.to_string(),
        expected: kind.expected().to_string(),
    })
}

/// Build a typed device configuration from a caller-supplied map.
///
/// Unknown keys are ignored. A value that fails to coerce leaves that
/// parameter absent and is reported in the returned list.
pub fn device_config_from_raw(raw: &RawConfig) -> (DeviceConfig, Vec<AnalysisError>) {
    let mut config = DeviceConfig::default();
    let mut errors = Vec::new();

    for (key, value) in raw {
        let name = match key.parse::<ParamName>() {
            Ok(name) => name,
            Err(_) => {
                debug!("Ignoring unknown configuration key {:?}", key);
                continue;
            }
        };

        match coerce_config_value(name, value) {
            Ok(parsed) => config.set(name, parsed),
            Err(err) => {
                warn!("{}; treating {} as missing", err, name);
                errors.push(err);
            }
        }
    }

    (config, errors)
}
