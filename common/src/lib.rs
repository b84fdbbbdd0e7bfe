//! Shared data model for the buzz nowcast pipeline
//!
//! Every downstream crate speaks in the types defined here: raw per-source
//! records, the `(date, ticker)` keyed feature table rows, the labeled
//! model frame handed to trainers, and the per-run metrics object exposed
//! to report consumers.

mod errors;
mod frame;
mod types;

pub use errors::NowcastError;
pub use frame::ModelFrame;
pub use types::{
    AttentionRecord, FeatureRow, FeatureValue, PartialVector, PredictionRow, PriceRecord,
    RunMetrics, SignalKey,
};

// Re-export the identifier and date types used across crate boundaries.
pub use chrono::NaiveDate;
pub use uuid::Uuid;
