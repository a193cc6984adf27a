//! Summary statistics over extracted roaming events.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use log::debug;

use super::types::*;
use crate::config::AnalyzerSettings;

/// SNR (dB) below which the AP a client leaves is counted as weak
pub const LOW_SNR_DB: i32 = 15;

fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Ping-pong detector result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PingPong {
    pub count: usize,
    /// "AP1 <-> AP2", in order of first ping-pong
    pub pairs: Vec<String>,
}

/// Count events whose unordered AP pair already occurred within the last
/// `lookback` events and no more than `window` earlier.
///
/// Single forward pass keeping only the latest occurrence of each pair.
/// Events without a parsed timestamp never count as a ping-pong.
pub fn detect_ping_pong(events: &[RoamingEvent], window: Duration, lookback: usize) -> PingPong {
    let mut last_seen: HashMap<(&str, &str), (usize, Option<NaiveDateTime>)> = HashMap::new();
    let mut result = PingPong::default();

    for (index, event) in events.iter().enumerate() {
        let (a, b) = (event.source_ap.as_str(), event.target_ap.as_str());
        let key = if a <= b { (a, b) } else { (b, a) };

        if let Some(&(previous_index, previous_ts)) = last_seen.get(&key) {
            let close_in_sequence = index - previous_index <= lookback;
            let close_in_time = match (previous_ts, event.timestamp) {
                (Some(before), Some(now)) => {
                    let gap = if now >= before { now - before } else { before - now };
                    gap <= window
                }
                _ => false,
            };
            if close_in_sequence && close_in_time {
                result.count += 1;
                let pair = format!("{} <-> {}", key.0, key.1);
                if !result.pairs.contains(&pair) {
                    result.pairs.push(pair);
                }
            }
        }

        last_seen.insert(key, (index, event.timestamp));
    }

    result
}

/// Aggregate events and deauthentication notices into [`RoamingMetrics`]
pub fn aggregate(
    events: &[RoamingEvent],
    deauths: &[DeauthEvent],
    settings: &AnalyzerSettings,
) -> RoamingMetrics {
    let mut metrics = RoamingMetrics {
        total_events: events.len(),
        ..RoamingMetrics::default()
    };

    let handoffs: Vec<u32> = events.iter().filter_map(|e| e.handoff_time_ms).collect();
    metrics.events_with_handoff_time = handoffs.len();
    metrics.avg_handoff_time_ms = mean(handoffs.iter().map(|&ms| f64::from(ms)));
    metrics.min_handoff_time_ms = handoffs.iter().copied().min();
    metrics.max_handoff_time_ms = handoffs.iter().copied().max();
    for &ms in &handoffs {
        metrics.handoff_distribution.record(ms);
    }

    metrics.avg_snr_before = mean(events.iter().map(|e| f64::from(e.source_snr)));
    metrics.avg_snr_after = mean(events.iter().map(|e| f64::from(e.target_snr)));
    metrics.avg_snr_improvement = mean(events.iter().map(|e| f64::from(e.snr_improvement)));
    metrics.avg_association_time_ms = mean(
        events
            .iter()
            .filter_map(|e| e.association_time_ms)
            .map(f64::from),
    );

    for event in events {
        metrics.reason_histogram.record(event.reason);
        if event.source_snr < LOW_SNR_DB {
            *metrics
                .low_snr_by_ap
                .entry(event.source_ap.clone())
                .or_default() += 1;
        }
    }

    let ping_pong = detect_ping_pong(
        events,
        settings.ping_pong_window_chrono(),
        settings.ping_pong_lookback,
    );
    metrics.ping_pong_count = ping_pong.count;
    metrics.ping_pong_pairs = ping_pong.pairs;

    metrics.deauth_count = deauths.len();
    for deauth in deauths {
        let ap = deauth.ap.clone().unwrap_or_else(|| "unknown".to_string());
        *metrics.deauth_by_ap.entry(ap).or_default() += 1;
    }

    debug!(
        "Aggregated {} events: {} with handoff time, {} ping-pongs, {} deauths",
        metrics.total_events,
        metrics.events_with_handoff_time,
        metrics.ping_pong_count,
        metrics.deauth_count
    );

    metrics
}
