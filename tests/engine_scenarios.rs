#[cfg(test)]
mod engine_scenarios {
    use chrono::{DateTime, Utc};

    use roamscore::analysis::types::*;
    use roamscore::analysis::{analyze, analyze_with};
    use roamscore::config::AnalyzerSettings;
    use roamscore::error::AnalysisError;

    const AP1: &str = "00:90:E8:00:00:01";
    const AP2: &str = "00:90:E8:00:00:02";
    const AP3: &str = "00:90:E8:00:00:03";
    const AP4: &str = "00:90:E8:00:00:04";

    fn roam(id: u32, time: &str, from: &str, from_snr: i32, to: &str, to_snr: i32) -> String {
        format!(
            "({}) 15/05/2024 {} [WLAN] Roaming from AP [MAC: {}, SNR: {}] to AP [MAC: {}, SNR: {}]\n",
            id, time, from, from_snr, to, to_snr
        )
    }

    fn handoff(ap: &str, ms: u32) -> String {
        format!("Connected to AP [{}]; handoff time: {} ms\n", ap, ms)
    }

    fn fixed_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    /// A log exercising every event path: noise floor, RSSI, connection loss, deauth
    fn mixed_log() -> String {
        let mut log = String::new();
        log += &roam(1, "10:00:00", AP1, 12, AP2, 30);
        log += &handoff(AP2, 45);
        log += "Beacon timeout on AP\n";
        log += &roam(2, "10:02:00", AP2, 25, AP3, 35);
        log += "(3) 15/05/2024 10:04:00 [WLAN] Roaming from AP [MAC: 00:90:E8:00:00:03, SNR: 0, Noise floor: -95] to AP [MAC: 00:90:E8:00:00:04, SNR: 28, Noise floor: -93]\n";
        log += "Roam done (120 ms)\n";
        log += "(4) 15/05/2024 10:06:00 [WLAN] Roaming from AP [BSSID: 00:90:E8:00:00:04, RSSI: -105] to AP [BSSID: 00:90:E8:00:00:01, RSSI: -125]\n";
        log += "(5) 15/05/2024 10:06:30 [WLAN] Deauthentication from AP [MAC: 00:90:E8:00:00:01]\n";
        log
    }

    /// Scenario A: a weak configuration dump
    #[test]
    fn test_configuration_dump_scenario() {
        let input = "Min Transmission Rate: 6\nMax Transmission Power: 20\nRoaming Mechanism: Signal Strength\nRoaming Difference: 9";
        let result = analyze(input, &RawConfig::new()).unwrap();

        assert_eq!(result.log_kind(), LogKind::ConfigurationDump);
        let min_rate = result.breakdown.criterion(Criterion::MinTransmissionRate).unwrap();
        assert_eq!(min_rate.status, Status::Warning);
        let mechanism = result.breakdown.criterion(Criterion::RoamingMechanism).unwrap();
        assert_eq!(mechanism.status, Status::Warning);
        let power = result.breakdown.criterion(Criterion::MaxTransmissionPower).unwrap();
        assert_eq!(power.status, Status::Ok);

        assert!(result.score() < 70);
        assert_eq!(result.score(), 40);
        assert!(!result.passed());

        let switch = result
            .recommendations
            .iter()
            .flat_map(|r| r.parameter_changes.iter())
            .find(|c| c.param == Setting::RoamingMechanism)
            .expect("recommendation to switch the roaming mechanism");
        assert_eq!(switch.recommended_value, "SNR");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_complete_ideal_dump_passes() {
        let input = "\
Minimum transmission rate: 12 Mbps
Maximum transmission power: 20 dBm
RTS threshold: 512
Fragmentation threshold: 2346
Roaming mechanism: SNR
Roaming difference: 8 dB
Remote connection check: Enable
WMM: Enable
Turbo Roaming: Enable
AP alive check: Enable
";
        let result = analyze(input, &RawConfig::new()).unwrap();
        assert_eq!(result.score(), 100);
        assert!(result.passed());
        assert!(result.recommendations.is_empty());
        assert!(result.config_changes.is_empty());
        assert_eq!(result.parameters().unwrap().len(), 10);
    }

    /// Scenario B: two roams between the same pair within 10 seconds
    #[test]
    fn test_ping_pong_scenario() {
        let mut log = roam(1, "10:00:00", AP1, 22, AP2, 34);
        log += &handoff(AP2, 30);
        log += &roam(2, "10:00:08", AP2, 22, AP1, 34);
        log += &handoff(AP1, 30);

        let result = analyze(&log, &RawConfig::new()).unwrap();
        let metrics = result.metrics().unwrap();
        assert_eq!(metrics.total_events, 2);
        assert_eq!(metrics.ping_pong_count, 1);
        assert_eq!(metrics.ping_pong_pairs, vec![format!("{} <-> {}", AP1, AP2)]);

        let change = result
            .config_changes
            .iter()
            .find(|c| c.param == Setting::RoamingDifference)
            .unwrap();
        assert_eq!(change.current_value, None);
        assert_eq!(change.recommended_value, "10 dB");
    }

    #[test]
    fn test_ping_pong_window_setting() {
        let mut log = roam(1, "10:00:00", AP1, 22, AP2, 34);
        log += &roam(2, "10:00:08", AP2, 22, AP1, 34);

        let settings = AnalyzerSettings {
            ping_pong_window: std::time::Duration::from_secs(5),
            ..AnalyzerSettings::default()
        };
        let result = analyze_with(&log, &RawConfig::new(), &settings, None).unwrap();
        assert_eq!(result.metrics().unwrap().ping_pong_count, 0);
    }

    /// Scenario C: an event without any handoff token
    #[test]
    fn test_missing_handoff_scenario() {
        let mut log = roam(1, "10:00:00", AP1, 22, AP2, 34);
        log += &handoff(AP2, 40);
        log += &roam(2, "10:05:00", AP2, 22, AP3, 34);
        log += "Link up\n";

        let result = analyze(&log, &RawConfig::new()).unwrap();
        let events = result.events().unwrap();
        assert_eq!(events[0].handoff_time_ms, Some(40));
        assert_eq!(events[1].handoff_time_ms, None);

        let metrics = result.metrics().unwrap();
        assert_eq!(metrics.events_with_handoff_time, 1);
        assert_eq!(metrics.avg_handoff_time_ms, Some(40.0));
    }

    /// Scenario D: empty input never produces a score
    #[test]
    fn test_empty_input_scenario() {
        assert_eq!(analyze("", &RawConfig::new()), Err(AnalysisError::EmptyInput));
        assert_eq!(analyze("   \n\t", &RawConfig::new()), Err(AnalysisError::EmptyInput));
    }

    /// Absurd signal levels are clamped instead of aborting the analysis
    #[test]
    fn test_extreme_snr_values() {
        let log = roam(1, "10:00:01", AP1, i32::MAX, AP2, -5);
        let result = analyze(&log, &RawConfig::new()).unwrap();
        let event = &result.events().unwrap()[0];
        assert_eq!(event.snr_improvement, event.target_snr - event.source_snr);
        assert!(event.snr_improvement < 0);
        assert!(result.score() <= 100);
    }

    /// A low source SNR is an SNR drop even with loss keywords nearby
    #[test]
    fn test_snr_drop_outranks_loss_keywords() {
        let mut log = roam(1, "10:00:00", AP1, 30, AP2, 40);
        log += &handoff(AP2, 30);
        log += "Beacon timeout on AP\n";
        log += &roam(2, "10:02:00", AP2, 18, AP3, 35);

        let result = analyze(&log, &RawConfig::new()).unwrap();
        let events = result.events().unwrap();
        assert_eq!(events[1].reason, RoamingReason::SnrDrop);
        assert_eq!(result.metrics().unwrap().reason_histogram.connection_loss, 0);
    }

    #[test]
    fn test_event_stream_without_events() {
        let log = "(1) 15/05/2024 10:00:01 [WLAN] Roaming started\n(2) 15/05/2024 10:00:02 [WLAN] Roaming aborted\n";
        let result = analyze(log, &RawConfig::new()).unwrap();
        assert_eq!(result.log_kind(), LogKind::EventStream);
        assert_eq!(result.metrics().unwrap().total_events, 0);
        assert_eq!(result.score(), 0);
        assert!(result.is_unparseable());
        assert!(result.recommendations[0].solution.starts_with("Verify the log format"));
    }

    #[test]
    fn test_good_event_stream_passes() {
        let mut log = String::new();
        for (i, (from, to)) in [(AP1, AP2), (AP2, AP3), (AP3, AP4)].iter().enumerate() {
            log += &roam(i as u32 + 1, &format!("10:0{}:00", i * 2), from, 22, to, 38);
            log += &handoff(to, 30);
        }

        let result = analyze(&log, &RawConfig::new()).unwrap();
        assert_eq!(result.score(), 100);
        assert!(result.passed());
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_mixed_log_metrics() {
        let result = analyze(&mixed_log(), &RawConfig::new()).unwrap();
        let metrics = result.metrics().unwrap();
        let events = result.events().unwrap();

        assert_eq!(metrics.total_events, 4);
        assert_eq!(events[0].reason, RoamingReason::SnrDrop);
        // "Beacon timeout" precedes event 2
        assert_eq!(events[1].reason, RoamingReason::ConnectionLoss);
        assert_eq!(events[2].reason, RoamingReason::ConnectionLoss);
        assert_eq!(events[2].source_noise_floor, Some(-95));
        assert_eq!(events[2].handoff_time_ms, Some(120));
        assert!(events[3].snr_from_rssi);
        assert_eq!(events[3].source_snr, 10);

        assert_eq!(metrics.handoff_distribution.up_to_50ms, 1);
        assert_eq!(metrics.handoff_distribution.up_to_200ms, 1);
        assert_eq!(metrics.deauth_count, 1);
        assert_eq!(metrics.deauth_by_ap.get(AP1), Some(&1));

        let stability = result.breakdown.criterion(Criterion::RoamingStability).unwrap();
        assert_eq!(stability.status, Status::Error);
    }

    #[test]
    fn test_event_invariants() {
        let result = analyze(&mixed_log(), &RawConfig::new()).unwrap();
        let metrics = result.metrics().unwrap();
        assert_eq!(metrics.reason_histogram.total(), metrics.total_events);
        for event in result.events().unwrap() {
            assert_eq!(event.snr_improvement, event.target_snr - event.source_snr);
        }
    }

    #[test]
    fn test_current_config_drives_changes() {
        let mut log = String::new();
        log += &roam(1, "10:00:00", AP1, 22, AP2, 38);
        log += &handoff(AP2, 160);
        log += &roam(2, "10:02:00", AP2, 22, AP3, 38);
        log += &handoff(AP3, 180);
        log += &roam(3, "10:04:00", AP3, 22, AP4, 38);
        log += &handoff(AP4, 170);

        let mut current = RawConfig::new();
        current.insert("turbo_roaming".to_string(), RawConfigValue::Bool(false));
        current.insert("wmm_enabled".to_string(), RawConfigValue::Text("Disable".to_string()));
        current.insert("rts_threshold".to_string(), RawConfigValue::Integer(512));

        let result = analyze(&log, &current).unwrap();
        let params: Vec<Setting> = result.config_changes.iter().map(|c| c.param).collect();
        assert_eq!(params, vec![Setting::TurboRoaming, Setting::WmmEnabled]);

        let without = analyze(&log, &RawConfig::new()).unwrap();
        assert!(without.config_changes.is_empty());
        assert_eq!(without.score(), result.score());
    }

    #[test]
    fn test_score_range_and_pass_gate() {
        let inputs = [
            "Turbo Roaming: Enable".to_string(),
            "RTS Threshold: 100\nMax Transmission Power: 30".to_string(),
            mixed_log(),
            roam(1, "10:00:00", AP1, 22, AP2, 38) + &handoff(AP2, 20),
        ];
        for input in &inputs {
            let result = analyze(input, &RawConfig::new()).unwrap();
            assert!(result.score() <= 100);
            assert_eq!(result.passed(), result.score() >= 70);
            let earned: f64 = result.breakdown.details.iter().map(|d| d.earned_points).sum();
            // Displayed points are rounded to 2 decimals, the score is not
            assert!((f64::from(result.score()) - earned).abs() <= 0.6);
        }
    }

    #[test]
    fn test_idempotent() {
        let settings = AnalyzerSettings::default();
        let first = analyze_with(&mixed_log(), &RawConfig::new(), &settings, Some(fixed_time())).unwrap();
        let second = analyze_with(&mixed_log(), &RawConfig::new(), &settings, Some(fixed_time())).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_json_round_trip() {
        let settings = AnalyzerSettings::default();
        let result = analyze_with(&mixed_log(), &RawConfig::new(), &settings, Some(fixed_time())).unwrap();

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"logKind\":\"event_stream\""));
        assert!(json.contains("\"snrImprovement\""));
        assert!(json.contains("\"pingPongCount\""));

        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_concurrent_calls_agree() {
        let owned = mixed_log();
        let log = owned.as_str();
        let expected = analyze(log, &RawConfig::new()).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(move || analyze(log, &RawConfig::new()).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
