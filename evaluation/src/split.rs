//! Temporal Split Engine
//!
//! Partitions the labeled frame by a strict date cutoff: every training
//! row predates every holdout row. Never a shuffle — a random split would
//! leak future information into training and invalidate the evaluation.

use chrono::NaiveDate;
use common::{ModelFrame, NowcastError};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Minimum rows per partition for a stable fit and a meaningful decile
/// ranking.
pub const MIN_PARTITION_ROWS: usize = 50;

/// How the cutoff date is chosen. Fractions and trailing-day counts are
/// translated deterministically onto the distinct observed dates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPoint {
    /// Last training date, inclusive
    Date(NaiveDate),
    /// Fraction of distinct dates assigned to training, in (0, 1)
    Fraction(f64),
    /// Number of most-recent distinct trading dates reserved for holdout
    TrailingDays(usize),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Minimum rows each partition must hold
    #[serde(default = "default_min_rows")]
    pub min_rows: usize,

    #[serde(default = "default_split_point")]
    pub point: SplitPoint,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            point: default_split_point(),
            min_rows: default_min_rows(),
        }
    }
}

fn default_split_point() -> SplitPoint {
    SplitPoint::TrailingDays(60)
}

fn default_min_rows() -> usize {
    MIN_PARTITION_ROWS
}

#[derive(Debug, Clone, Default)]
pub struct TemporalSplitter {
    config: SplitConfig,
}

impl TemporalSplitter {
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    /// Split into `(train, holdout)` with `max(train dates) < min(holdout
    /// dates)`.
    pub fn split(&self, frame: &ModelFrame) -> Result<(ModelFrame, ModelFrame), NowcastError> {
        let dates = frame.distinct_dates();
        if dates.len() < 2 {
            return Err(NowcastError::InsufficientData(format!(
                "need at least 2 distinct dates to split, have {}",
                dates.len()
            )));
        }

        let cutoff = self.resolve_cutoff(&dates)?;

        let mut train_indices = Vec::new();
        let mut holdout_indices = Vec::new();
        for (i, key) in frame.keys.iter().enumerate() {
            if key.date <= cutoff {
                train_indices.push(i);
            } else {
                holdout_indices.push(i);
            }
        }

        if train_indices.len() < self.config.min_rows {
            return Err(NowcastError::InsufficientData(format!(
                "train partition has {} rows, below the {}-row minimum",
                train_indices.len(),
                self.config.min_rows
            )));
        }
        if holdout_indices.len() < self.config.min_rows {
            return Err(NowcastError::InsufficientData(format!(
                "holdout partition has {} rows after {cutoff}, below the {}-row minimum",
                holdout_indices.len(),
                self.config.min_rows
            )));
        }

        let train = frame.subset(&train_indices);
        let holdout = frame.subset(&holdout_indices);
        debug_assert!(train.max_date() < holdout.min_date());

        info!(
            cutoff = %cutoff,
            n_train = train.n_rows(),
            n_holdout = holdout.n_rows(),
            "temporal split"
        );
        Ok((train, holdout))
    }

    /// The last training date implied by the configured split point.
    fn resolve_cutoff(&self, dates: &[NaiveDate]) -> Result<NaiveDate, NowcastError> {
        let n = dates.len();
        match self.config.point {
            SplitPoint::Date(cutoff) => Ok(cutoff),
            SplitPoint::Fraction(fraction) => {
                if !(0.0..1.0).contains(&fraction) || fraction <= 0.0 {
                    return Err(NowcastError::InsufficientData(format!(
                        "split fraction {fraction} outside (0, 1)"
                    )));
                }
                let n_train_dates = ((fraction * n as f64).floor() as usize).clamp(1, n - 1);
                Ok(dates[n_train_dates - 1])
            }
            SplitPoint::TrailingDays(holdout_days) => {
                if holdout_days == 0 || holdout_days >= n {
                    return Err(NowcastError::InsufficientData(format!(
                        "cannot reserve {holdout_days} trailing dates out of {n}"
                    )));
                }
                Ok(dates[n - holdout_days - 1])
            }
        }
    }
}
