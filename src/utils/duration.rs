//! Duration parsing for command-line flags.
//!
//! Uses the same grammar as durations in settings files (`"500ms"`, `"30s"`,
//! `"1m30s"`). A bare number is taken as seconds.

use std::time::Duration;

/// Parse a duration string such as "30s", "500ms" or "1m 30s"
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use roamscore::utils::duration::parse_duration;
///
/// assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
/// assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
/// assert_eq!(parse_duration("1m30s"), Ok(Duration::from_secs(90)));
/// assert!(parse_duration("soon").is_err());
/// ```
pub fn parse_duration(duration: &str) -> Result<Duration, String> {
    let duration = duration.trim();

    if let Ok(secs) = duration.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    humantime::parse_duration(duration)
        .map_err(|e| format!("Invalid duration '{}': {}", duration, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("45"), Ok(Duration::from_secs(45)));
        assert_eq!(parse_duration("45 sec"), Ok(Duration::from_secs(45)));
        assert_eq!(parse_duration("10min"), Ok(Duration::from_secs(600)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    }

    #[test]
    fn test_matches_settings_file_grammar() {
        assert_eq!(parse_duration("1m30s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("1m 30s"), Ok(Duration::from_secs(90)));

        #[derive(serde::Deserialize)]
        struct Window {
            #[serde(with = "humantime_serde")]
            window: Duration,
        }
        let from_yaml: Window = serde_yaml::from_str("window: 1m30s").unwrap();
        assert_eq!(parse_duration("1m30s"), Ok(from_yaml.window));
    }

    #[test]
    fn test_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("ms").is_err());
        assert!(parse_duration("10 fortnights").is_err());
        assert!(parse_duration("-5s").is_err());
    }
}
