//! Roaming event extraction from device event logs.
//!
//! One event is produced per roaming-transition line. Handoff and association
//! times are looked up in the text that follows the transition, never past
//! the next transition, so a token is attached to at most one event.
//!
//! Pattern list, version [`PATTERN_VERSION`]:
//!
//! | Pattern        | Example                                                                |
//! |----------------|------------------------------------------------------------------------|
//! | transition     | `(12) 15/05/2024 10:00:01 [WLAN] Roaming from AP [MAC: X, SNR: 12] to AP [MAC: Y, SNR: 30]` |
//! | transition     | same, with `, Noise floor: -95` after either SNR                       |
//! | transition     | `RSSI: -70` in place of `SNR: 25` (option `accept_rssi`)               |
//! | transition     | `BSSID:` in place of `MAC:` (option `accept_bssid`)                    |
//! | handoff        | `handoff time: 42 ms`, `handoff time with AP [Y]: 42 ms`               |
//! | handoff        | `Handoff to AP [Y] completed in 42 ms`                                 |
//! | short handoff  | `(42 ms)`                                                              |
//! | association    | `Disconnected from AP [X]; last association: 900 ms`                   |
//! | association    | `Last association with AP [X]: 900 ms`, `Association time with AP [X]: 900 ms` |
//! | loss keywords  | `connection lost`, `disconnect`, `timeout`                             |
//! | deauth         | `deauthentication`, `deauth request`                                   |

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use log::{debug, trace};
use regex::{Captures, Regex};

use super::types::*;
use crate::config::AnalyzerSettings;

/// Bumped whenever a pattern below changes what it accepts
pub const PATTERN_VERSION: u32 = 1;

/// Source SNR (dB) at or below which a roam is attributed to an SNR drop
pub const SNR_DROP_DB: i32 = 20;

/// Parsed SNR/RSSI levels are clamped to +/- this many dB
pub const LEVEL_LIMIT_DB: i32 = 200;

/// Offset subtracted from |RSSI| to estimate an SNR
pub const RSSI_SNR_OFFSET: i32 = 95;

/// Accepted timestamp layouts, tried in order
const TIMESTAMP_FORMATS: [&str; 3] = ["%d/%m/%Y %H:%M:%S", "%m/%d/%Y %H:%M:%S", "%Y/%m/%d %H:%M:%S"];

/// Compiled regex patterns for event log parsing
pub struct LogPatterns {
    /// Match: "(N) D/M/Y H:M:S [WLAN] Roaming from AP [MAC: X, SNR: a] to AP [MAC: Y, SNR: b]"
    pub transition: Regex,
    /// Match: "handoff time: N ms" and its long forms
    pub handoff_time: Regex,
    /// Match: "(N ms)"
    pub short_handoff: Regex,
    /// Match: "Disconnected from AP [X]; last association: N ms" and its variants
    pub association_time: Regex,
    /// Match: connection loss keywords
    pub connection_loss: Regex,
    /// Match: "deauthentication" or "deauth request"
    pub deauth: Regex,
    /// Match: "[MAC: X" or "[BSSID: X"
    pub bracketed_ap: Regex,
    /// Match: a bare MAC address
    pub mac: Regex,
}

impl LogPatterns {
    pub fn new() -> Self {
        Self {
            transition: Regex::new(concat!(
                r"(?i)\((?P<id>\d+)\)\s+(?P<ts>\d+/\d+/\d+\s+\d+:\d+:\d+)\s+\[WLAN\]\s+Roaming from AP\s*",
                r"\[(?P<src_id>MAC|BSSID):\s*(?P<src_ap>[0-9A-F:.-]+),\s*(?P<src_metric>SNR|RSSI):\s*(?P<src_level>-?\d+)(?:\s*dBm?)?",
                r"(?:,\s*Noise floor:\s*(?P<src_noise>-?\d+)(?:\s*dBm)?)?\]",
                r"\s*to AP\s*",
                r"\[(?P<dst_id>MAC|BSSID):\s*(?P<dst_ap>[0-9A-F:.-]+),\s*(?P<dst_metric>SNR|RSSI):\s*(?P<dst_level>-?\d+)(?:\s*dBm?)?",
                r"(?:,\s*Noise floor:\s*(?P<dst_noise>-?\d+)(?:\s*dBm)?)?\]",
            ))
            .expect("Invalid transition regex"),
            handoff_time: Regex::new(
                r"(?i)handoff time(?: with AP \[[^\]\r\n]*\])?\s*:\s*(\d+)\s*ms|handoff to AP \[[^\]\r\n]*\] completed in (\d+)\s*ms"
            ).expect("Invalid handoff_time regex"),
            short_handoff: Regex::new(
                r"\((\d+)\s*ms\)"
            ).expect("Invalid short_handoff regex"),
            association_time: Regex::new(
                r"(?i)(?:disconnected from AP \[([^\]\r\n]+)\];\s*last association|last association with AP \[([^\]\r\n]+)\]|association time with AP \[([^\]\r\n]+)\])\s*:\s*(\d+)\s*ms"
            ).expect("Invalid association_time regex"),
            connection_loss: Regex::new(
                r"(?i)connection lost|disconnect|timeout"
            ).expect("Invalid connection_loss regex"),
            deauth: Regex::new(
                r"(?i)deauthentication|deauth\s+request"
            ).expect("Invalid deauth regex"),
            bracketed_ap: Regex::new(
                r"(?i)\[(?:MAC|BSSID):\s*([0-9A-F:.-]+)"
            ).expect("Invalid bracketed_ap regex"),
            mac: Regex::new(
                r"\b([0-9A-Fa-f]{2}(?::[0-9A-Fa-f]{2}){5})\b"
            ).expect("Invalid mac regex"),
        }
    }
}

impl Default for LogPatterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Global patterns instance
pub static PATTERNS: LazyLock<LogPatterns> = LazyLock::new(LogPatterns::new);

/// Parse a device timestamp.
/// Format: "15/05/2024 10:00:01", month-first and year-first layouts accepted
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.split_whitespace().collect::<Vec<_>>().join(" ");
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&s, fmt).ok())
}

/// Estimate an SNR from an RSSI reading
pub fn rssi_to_snr(rssi: i32) -> i32 {
    rssi.saturating_abs() - RSSI_SNR_OFFSET
}

/// Decide why the client roamed.
///
/// `context` is the text preceding the transition that is not already
/// attached to an earlier event.
pub fn classify_reason(source_snr: i32, context: &str) -> RoamingReason {
    if source_snr == 0 {
        RoamingReason::ConnectionLoss
    } else if source_snr <= SNR_DROP_DB {
        RoamingReason::SnrDrop
    } else if PATTERNS.connection_loss.is_match(context) {
        RoamingReason::ConnectionLoss
    } else {
        RoamingReason::Unknown
    }
}

/// One side of a transition
struct ApReading {
    ap: String,
    snr: i32,
    noise_floor: Option<i32>,
    from_rssi: bool,
}

/// Parse a signed dB level, saturating at [`LEVEL_LIMIT_DB`]
fn clamp_level(digits: &str) -> i32 {
    match digits.parse::<i64>() {
        Ok(v) => v.clamp(-i64::from(LEVEL_LIMIT_DB), i64::from(LEVEL_LIMIT_DB)) as i32,
        // Only overlong digit runs fail to parse
        Err(_) if digits.starts_with('-') => -LEVEL_LIMIT_DB,
        Err(_) => LEVEL_LIMIT_DB,
    }
}

fn read_side(caps: &Captures, prefix: &str, settings: &AnalyzerSettings) -> Option<ApReading> {
    let group = |name: &str| caps.name(&format!("{}_{}", prefix, name)).map(|m| m.as_str());

    if group("id")?.eq_ignore_ascii_case("BSSID") && !settings.accept_bssid {
        return None;
    }
    let from_rssi = group("metric")?.eq_ignore_ascii_case("RSSI");
    if from_rssi && !settings.accept_rssi {
        return None;
    }

    let level = clamp_level(group("level")?);
    let snr = if from_rssi { rssi_to_snr(level) } else { level };
    // A noise floor next to an RSSI reading says nothing about the estimate
    let noise_floor = if from_rssi {
        None
    } else {
        group("noise").and_then(|n| n.parse().ok())
    };

    Some(ApReading {
        ap: group("ap")?.to_ascii_uppercase(),
        snr,
        noise_floor,
        from_rssi,
    })
}

/// `text[from..]`, at most `len` bytes and never past `limit`, cut on a char boundary
fn forward_window(text: &str, from: usize, len: usize, limit: usize) -> &str {
    let mut end = from.saturating_add(len).min(limit).min(text.len());
    while end > from && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[from..end]
}

/// `text[..to]`, at most `len` bytes and never before `floor`, cut on a char boundary
fn backward_window(text: &str, to: usize, len: usize, floor: usize) -> &str {
    let mut start = to.saturating_sub(len).max(floor).min(to);
    while start < to && !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..to]
}

/// Handoff time following a transition, with the absolute offset where its token ends
fn find_handoff(text: &str, from: usize, limit: usize, settings: &AnalyzerSettings) -> Option<(u32, usize)> {
    let window = forward_window(text, from, settings.handoff_search_chars, limit);
    if let Some(caps) = PATTERNS.handoff_time.captures(window) {
        let value = caps.get(1).or_else(|| caps.get(2))?;
        if let Ok(ms) = value.as_str().parse() {
            return Some((ms, from + caps.get(0)?.end()));
        }
    }

    let window = forward_window(text, from, settings.short_handoff_search_chars, limit);
    let caps = PATTERNS.short_handoff.captures(window)?;
    let ms = caps.get(1)?.as_str().parse().ok()?;
    Some((ms, from + caps.get(0)?.end()))
}

/// Association time reported for `source_ap`, with the absolute offset where its token ends
fn find_association(
    text: &str,
    from: usize,
    limit: usize,
    source_ap: &str,
    settings: &AnalyzerSettings,
) -> Option<(u32, usize)> {
    let window = forward_window(text, from, settings.association_search_chars, limit);
    PATTERNS.association_time.captures_iter(window).find_map(|caps| {
        let ap = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
        if !ap.as_str().trim().eq_ignore_ascii_case(source_ap) {
            return None;
        }
        let ms = caps.get(4)?.as_str().parse().ok()?;
        Some((ms, from + caps.get(0)?.end()))
    })
}

/// Extract every roaming event from an event-stream log, in log order
pub fn extract_events(text: &str, settings: &AnalyzerSettings) -> Vec<RoamingEvent> {
    let matches: Vec<Captures> = PATTERNS.transition.captures_iter(text).collect();
    let mut events = Vec::with_capacity(matches.len());
    // End of the text already attributed to an earlier event
    let mut consumed = 0;

    for (i, caps) in matches.iter().enumerate() {
        let Some(whole) = caps.get(0) else { continue };
        let limit = matches
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());

        let (Some(source), Some(target)) = (
            read_side(caps, "src", settings),
            read_side(caps, "dst", settings),
        ) else {
            debug!("Skipping transition not accepted by parser options: {}", whole.as_str());
            consumed = whole.end();
            continue;
        };

        let context = backward_window(text, whole.start(), settings.reason_context_chars, consumed);
        let reason = classify_reason(source.snr, context);

        let handoff = find_handoff(text, whole.end(), limit, settings);
        let association = find_association(text, whole.end(), limit, &source.ap, settings);
        consumed = [
            Some(whole.end()),
            handoff.map(|(_, end)| end),
            association.map(|(_, end)| end),
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(whole.end());

        let raw_timestamp = caps.name("ts").map(|m| m.as_str()).unwrap_or_default();
        let event = RoamingEvent {
            id: caps
                .name("id")
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or_default(),
            raw_timestamp: raw_timestamp.to_string(),
            timestamp: parse_timestamp(raw_timestamp),
            snr_improvement: target.snr - source.snr,
            source_snr: source.snr,
            target_snr: target.snr,
            source_noise_floor: source.noise_floor,
            target_noise_floor: target.noise_floor,
            handoff_time_ms: handoff.map(|(ms, _)| ms),
            association_time_ms: association.map(|(ms, _)| ms),
            reason,
            snr_from_rssi: source.from_rssi || target.from_rssi,
            source_ap: source.ap,
            target_ap: target.ap,
        };
        trace!("Parsed roaming event {:?}", event);
        events.push(event);
    }

    debug!(
        "Extracted {} roaming events from {} transition lines (patterns v{})",
        events.len(),
        matches.len(),
        PATTERN_VERSION
    );
    events
}

/// Find deauthentication notices, one per line
pub fn extract_deauths(text: &str) -> Vec<DeauthEvent> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| PATTERNS.deauth.is_match(line))
        .map(|(i, line)| {
            let ap = PATTERNS
                .bracketed_ap
                .captures(line)
                .or_else(|| PATTERNS.mac.captures(line))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_ascii_uppercase());
            DeauthEvent {
                line_number: i + 1,
                ap,
            }
        })
        .collect()
}
