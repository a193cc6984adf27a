use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunable knobs of the analysis engine.
///
/// Every field has a default, so an empty YAML document is a valid settings
/// file. The pass threshold is deliberately absent: it is fixed at 70.
///
/// ```yaml
/// ping_pong_window: "30s"
/// ping_pong_lookback: 2
/// handoff_search_chars: 500
/// accept_rssi: true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    /// Two transitions between the same AP pair closer than this are a ping-pong
    #[serde(with = "humantime_serde")]
    pub ping_pong_window: Duration,
    /// How many previous events the ping-pong detector looks back over
    pub ping_pong_lookback: usize,
    /// Characters searched after a transition for a `handoff time: N ms` token
    pub handoff_search_chars: usize,
    /// Characters searched after a transition for a short `(N ms)` token
    pub short_handoff_search_chars: usize,
    /// Characters searched after a transition for the source AP's association time
    pub association_search_chars: usize,
    /// Characters before a transition inspected for connection-loss keywords
    pub reason_context_chars: usize,
    /// Accept `RSSI:` readings in place of `SNR:` (converted to an SNR estimate)
    pub accept_rssi: bool,
    /// Accept `BSSID:` in place of `MAC:`
    pub accept_bssid: bool,
    /// Below this many events the analysis is flagged as not representative
    pub min_events_for_full_analysis: usize,
    /// More deauthentications than this raise a recommendation
    pub deauth_alert_threshold: usize,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            ping_pong_window: Duration::from_secs(30),
            ping_pong_lookback: 2,
            handoff_search_chars: 500,
            short_handoff_search_chars: 200,
            association_search_chars: 500,
            reason_context_chars: 200,
            accept_rssi: true,
            accept_bssid: true,
            min_events_for_full_analysis: 3,
            deauth_alert_threshold: 3,
        }
    }
}

impl AnalyzerSettings {
    /// Validate the settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ping_pong_window.is_zero() {
            return Err(ValidationError::InvalidPingPong(
                "ping_pong_window must be greater than zero".to_string(),
            ));
        }
        if self.ping_pong_lookback == 0 {
            return Err(ValidationError::InvalidPingPong(
                "ping_pong_lookback must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            ("handoff_search_chars", self.handoff_search_chars),
            ("short_handoff_search_chars", self.short_handoff_search_chars),
            ("association_search_chars", self.association_search_chars),
            ("reason_context_chars", self.reason_context_chars),
        ] {
            if value == 0 {
                return Err(ValidationError::InvalidSearchWindow(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }

        Ok(())
    }

    /// The ping-pong window as a chrono duration, saturating on overflow
    pub fn ping_pong_window_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.ping_pong_window).unwrap_or(chrono::Duration::MAX)
    }
}

/// Errors that can occur during settings validation
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid ping-pong settings: {0}")]
    InvalidPingPong(String),
    #[error("Invalid search window: {0}")]
    InvalidSearchWindow(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = AnalyzerSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.ping_pong_window, Duration::from_secs(30));
        assert_eq!(settings.ping_pong_lookback, 2);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
ping_pong_window: "10s"
accept_rssi: false
"#;
        let settings: AnalyzerSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.ping_pong_window, Duration::from_secs(10));
        assert!(!settings.accept_rssi);
        assert!(settings.accept_bssid);
        assert_eq!(settings.handoff_search_chars, 500);
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut settings = AnalyzerSettings::default();
        settings.ping_pong_window = Duration::ZERO;
        assert!(matches!(
            settings.validate(),
            Err(ValidationError::InvalidPingPong(_))
        ));

        let mut settings = AnalyzerSettings::default();
        settings.reason_context_chars = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("reason_context_chars"));
    }
}
