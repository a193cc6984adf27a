//! # RoamScore - roaming log analysis for industrial Wi-Fi client bridges
//!
//! This library scores Moxa client-bridge logs against a catalog of
//! recommended roaming settings and produces prioritized configuration
//! changes.
//!
//! ## Overview
//!
//! Two kinds of log text are accepted:
//!
//! - **Configuration dumps**: `Label: value` exports of the device settings,
//!   scored parameter by parameter.
//! - **Event streams**: timestamped `[WLAN] Roaming from AP ... to AP ...`
//!   lines, scored on handoff time, SNR improvement and roaming stability.
//!
//! Each rubric is normalized to 100 points and an analysis passes at 70.
//!
//! ## Architecture
//!
//! - `analysis::classifier`: decides which kind of log the text is
//! - `analysis::config_extractor`: reads parameters from a dump
//! - `analysis::log_parser`: reads roaming events from an event stream
//! - `analysis::metrics`: aggregates events, detects ping-pong roaming
//! - `analysis::scoring`: applies the catalog rubrics
//! - `analysis::recommendations`: turns the breakdown into actions
//! - `analysis::engine`: the `analyze` entry point and batch helpers
//! - `analysis::report`: JSON and text reports
//! - `config`, `config_loader`: analyzer settings and device configuration files
//!
//! ## Example Usage
//!
//! ```rust
//! use roamscore::analysis::{analyze, types::RawConfig};
//!
//! let result = analyze("Turbo Roaming: Enable\nWMM: on\n", &RawConfig::new())?;
//! assert!(!result.passed());
//! assert!(!result.recommendations.is_empty());
//! # Ok::<(), roamscore::error::AnalysisError>(())
//! ```
//!
//! ## Error Handling
//!
//! `analyze` returns [`error::AnalysisError`] and fails only on empty input;
//! degraded input is reported in the result's `warnings`. File and CLI code
//! uses `color_eyre` for error reporting with context.

pub mod analysis;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod utils;

pub use analysis::{analyze, analyze_with};
