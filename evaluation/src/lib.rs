// Evaluation (Layer 4)
// Leakage-safe temporal splitting and decile-spread scoring of ranked
// holdout predictions

pub mod decile;
pub mod split;

pub use decile::{DecileEvaluator, BASELINE_ACCURACY, N_DECILES, TRADING_DAYS_PER_YEAR};
pub use split::{SplitConfig, SplitPoint, TemporalSplitter, MIN_PARTITION_ROWS};
