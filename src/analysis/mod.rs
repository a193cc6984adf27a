//! Roaming log analysis for Moxa client bridges.
//!
//! This module classifies a log, extracts configuration parameters or
//! roaming events from it, scores the result against the parameter catalog
//! and derives prioritized recommendations.

pub mod types;
pub mod catalog;
pub mod classifier;
pub mod config_extractor;
pub mod log_parser;
pub mod metrics;
pub mod scoring;
pub mod recommendations;
pub mod engine;
pub mod report;

pub use types::*;
pub use engine::{analyze, analyze_file, analyze_files, analyze_with, discover_logs};
pub use report::{generate_json_report, generate_text_report, print_summary};
