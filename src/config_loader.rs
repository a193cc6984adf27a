use crate::analysis::types::RawConfig;
use crate::config::AnalyzerSettings;
use color_eyre::eyre::{Context, Result};
use log::{debug, info};
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Load and validate analyzer settings from a YAML file
pub fn load_settings(settings_path: &Path) -> Result<AnalyzerSettings> {
    info!("Loading settings from: {:?}", settings_path);

    let file = File::open(settings_path)
        .with_context(|| format!("Failed to open settings file: {}", settings_path.display()))?;

    let settings: AnalyzerSettings = serde_yaml::from_reader(file)
        .with_context(|| format!("Failed to parse settings file: {}", settings_path.display()))?;

    settings.validate()?;

    Ok(settings)
}

/// Load a device's current configuration.
///
/// `.json` files are read as JSON, anything else as YAML. The file is a flat
/// map of parameter keys to values:
///
/// ```yaml
/// turbo_roaming: false
/// rts_threshold: 2346
/// roaming_mechanism: signal_strength
/// ```
pub fn load_device_config(config_path: &Path) -> Result<RawConfig> {
    info!("Loading device configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .with_context(|| format!("Failed to open device configuration: {}", config_path.display()))?;

    let is_json = config_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let config: RawConfig = if is_json {
        serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse JSON device configuration: {}", config_path.display()))?
    } else {
        serde_yaml::from_reader(file)
            .with_context(|| format!("Failed to parse YAML device configuration: {}", config_path.display()))?
    };

    debug!("Device configuration has {} entries", config.len());
    Ok(config)
}

/// CLI arguments that can override settings file values
#[derive(Debug, Clone, Default)]
pub struct SettingsCliOverrides {
    pub ping_pong_window: Option<Duration>,
}

/// Apply CLI overrides to analyzer settings
pub fn apply_settings_overrides(
    settings: &mut AnalyzerSettings,
    overrides: &SettingsCliOverrides,
) -> Result<()> {
    if let Some(window) = overrides.ping_pong_window {
        info!("Overriding ping-pong window: {:?}", window);
        settings.ping_pong_window = window;
    }

    // Re-validate after applying overrides
    settings.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::RawConfigValue;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    #[test]
    fn test_load_settings() {
        let yaml = r#"
ping_pong_window: "20s"
ping_pong_lookback: 3
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let settings = load_settings(temp_file.path()).unwrap();
        assert_eq!(settings.ping_pong_window, Duration::from_secs(20));
        assert_eq!(settings.ping_pong_lookback, 3);
        assert_eq!(settings.handoff_search_chars, 500);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "ping_pong_lookback: 0\n").unwrap();

        assert!(load_settings(temp_file.path()).is_err());
    }

    #[test]
    fn test_load_yaml_device_config() {
        let yaml = r#"
turbo_roaming: false
rts_threshold: 2346
roaming_mechanism: signal_strength
"#;

        let mut temp_file = Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let config = load_device_config(temp_file.path()).unwrap();
        assert_eq!(config.get("turbo_roaming"), Some(&RawConfigValue::Bool(false)));
        assert_eq!(config.get("rts_threshold"), Some(&RawConfigValue::Integer(2346)));
        assert_eq!(
            config.get("roaming_mechanism"),
            Some(&RawConfigValue::Text("signal_strength".to_string()))
        );
    }

    #[test]
    fn test_load_json_device_config() {
        let mut temp_file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(temp_file, r#"{{"wmm_enabled": true, "roaming_difference": "6 dB"}}"#).unwrap();

        let config = load_device_config(temp_file.path()).unwrap();
        assert_eq!(config.get("wmm_enabled"), Some(&RawConfigValue::Bool(true)));
        assert_eq!(
            config.get("roaming_difference"),
            Some(&RawConfigValue::Text("6 dB".to_string()))
        );
    }

    #[test]
    fn test_apply_overrides() {
        let mut settings = AnalyzerSettings::default();
        let overrides = SettingsCliOverrides {
            ping_pong_window: Some(Duration::from_secs(10)),
        };

        apply_settings_overrides(&mut settings, &overrides).unwrap();
        assert_eq!(settings.ping_pong_window, Duration::from_secs(10));

        let zero = SettingsCliOverrides {
            ping_pong_window: Some(Duration::ZERO),
        };
        assert!(apply_settings_overrides(&mut settings, &zero).is_err());
    }
}
