//! Conditions signalled by the analysis engine.
//!
//! Only [`AnalysisError::EmptyInput`] aborts an analysis. The other two are
//! degraded-input conditions: the engine still produces a result and records
//! them in [`AnalysisResult::warnings`](crate::analysis::AnalysisResult).

use serde::{Deserialize, Serialize};

use crate::analysis::types::{LogKind, ParamName};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AnalysisError {
    /// Blank or whitespace-only log text. Rejected before classification.
    #[error("Log text is empty")]
    EmptyInput,
    /// The log was classified but no facts could be extracted from it.
    #[error("No usable facts found in {log_kind} log; verify the log format")]
    UnparseableLog { log_kind: LogKind },
    /// A caller-supplied configuration value does not match the parameter type.
    #[error("Invalid value {value:?} for {param}: expected {expected}")]
    InvalidConfigValue {
        param: ParamName,
        value: String,
        expected: String,
    },
}

impl AnalysisError {
    /// Whether this condition aborts the analysis call.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AnalysisError::EmptyInput)
    }
}
