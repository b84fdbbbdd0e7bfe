//! Label Assigner
//!
//! For each row, the forward return over the next K *trading* days of
//! that ticker (starting the day after the row's date) decides the binary
//! direction label. Rows whose forward window is not observable keep
//! `label == None` and are excluded from training and evaluation.

use crate::builder::FeatureTable;
use crate::history::PriceHistory;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default forecast horizon: next trading day.
pub const DEFAULT_FORWARD_HORIZON_DAYS: usize = 1;

/// Default return threshold for the positive label. A forward return must
/// strictly exceed this to label `1`.
pub const DEFAULT_LABEL_THRESHOLD: f64 = 0.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Forward horizon K in trading days; must be at least 1
    #[serde(default = "default_horizon_days")]
    pub horizon_days: usize,

    /// Threshold the forward return must strictly exceed
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
            threshold: default_threshold(),
        }
    }
}

fn default_horizon_days() -> usize {
    DEFAULT_FORWARD_HORIZON_DAYS
}

fn default_threshold() -> f64 {
    DEFAULT_LABEL_THRESHOLD
}

#[derive(Debug, Clone, Default)]
pub struct LabelAssigner {
    config: LabelConfig,
}

impl LabelAssigner {
    pub fn new(config: LabelConfig) -> Self {
        Self { config }
    }

    pub fn horizon_days(&self) -> usize {
        self.config.horizon_days
    }

    /// Assign forward returns and labels to every row of the table.
    pub fn assign(&self, table: &mut FeatureTable, history: &PriceHistory) {
        let mut labeled = 0usize;
        let mut unobservable = 0usize;

        for row in table.rows_mut() {
            let forward = history
                .index_of(&row.ticker, row.date)
                .and_then(|idx| self.forward_return(history, &row.ticker, idx));

            match forward {
                Some(fr) => {
                    row.forward_return = Some(fr);
                    row.label = Some(fr > self.config.threshold);
                    labeled += 1;
                }
                None => {
                    row.forward_return = None;
                    row.label = None;
                    unobservable += 1;
                }
            }
        }

        info!(
            labeled,
            unobservable,
            horizon_days = self.config.horizon_days,
            "labels assigned"
        );
    }

    /// Forward return over the next K trading days from the bar at `idx`,
    /// or `None` when fewer than K future bars exist.
    fn forward_return(&self, history: &PriceHistory, ticker: &str, idx: usize) -> Option<f64> {
        let series = history.series(ticker)?;
        let target = idx + self.config.horizon_days;
        let future = series.get(target)?;
        let current = &series[idx];
        Some(future.close / current.close - 1.0)
    }
}
