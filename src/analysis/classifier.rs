//! Decide whether a log is a configuration dump or a roaming event stream.

use std::sync::LazyLock;

use regex::Regex;

use super::types::LogKind;
use crate::error::AnalysisError;

/// Match: "(12) 15/05/2024 10:00:01 [WLAN] Roaming"
static EVENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\d+\)\s+\d+/\d+/\d+\s+\d+:\d+:\d+\s+\[WLAN\]\s+Roaming")
        .expect("Invalid event line regex")
});

/// Classify raw log text.
///
/// A single matching roaming line makes the whole text an event stream.
/// Blank text is rejected with [`AnalysisError::EmptyInput`].
pub fn classify(text: &str) -> Result<LogKind, AnalysisError> {
    if text.trim().is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    if EVENT_LINE.is_match(text) {
        Ok(LogKind::EventStream)
    } else {
        Ok(LogKind::ConfigurationDump)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_stream() {
        let text = "boot ok\n(3) 15/05/2024 10:00:01 [WLAN] Roaming from AP [MAC: 00:90:E8:00:00:01, SNR: 12] to AP [MAC: 00:90:E8:00:00:02, SNR: 30]\n";
        assert_eq!(classify(text), Ok(LogKind::EventStream));
    }

    #[test]
    fn test_configuration_dump() {
        let text = "Roaming Mechanism: SNR\nTurbo Roaming: Enable\n";
        assert_eq!(classify(text), Ok(LogKind::ConfigurationDump));
    }

    #[test]
    fn test_mixed_log_is_event_stream() {
        let text = "RTS Threshold: 512\n(1) 1/2/2024 08:00:00 [WLAN] Roaming started\n";
        assert_eq!(classify(text), Ok(LogKind::EventStream));
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(classify(""), Err(AnalysisError::EmptyInput));
        assert_eq!(classify(" \n\t \r\n"), Err(AnalysisError::EmptyInput));
    }
}
