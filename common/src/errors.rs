//! Error taxonomy for the nowcast pipeline
//!
//! Only malformed input records are recoverable (dropped and counted by
//! the normalizer). Anything that would compromise split validity, label
//! correctness, or metric correctness aborts the run: a wrong but
//! successfully computed metric is worse than a hard failure.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NowcastError {
    /// An input row lacked a resolvable date or ticker, or carried values
    /// outside their documented range. Recovered per record by dropping.
    #[error("malformed record from source `{source_name}`: {reason}")]
    MalformedRecord { source_name: String, reason: String },

    /// A split or decile could not be formed with enough rows.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// The training partition cannot support fitting a binary classifier.
    #[error("training failed: {0}")]
    Training(String),

    /// The run-wide deadline budget was exceeded; no partial metrics are
    /// emitted.
    #[error("run budget of {budget:?} exceeded at stage `{stage}`")]
    Timeout { stage: &'static str, budget: Duration },
}

impl NowcastError {
    pub fn malformed(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        NowcastError::MalformedRecord {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Stable error kind tag, for structured failure reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            NowcastError::MalformedRecord { .. } => "malformed_record",
            NowcastError::InsufficientData(_) => "insufficient_data",
            NowcastError::Training(_) => "training",
            NowcastError::Timeout { .. } => "timeout",
        }
    }
}
