//! Absent-value imputation
//!
//! The one place absent markers may be replaced by numbers. The rule is
//! median-of-training-column, fitted on the training partition only and
//! carried on the fitted model so holdout scoring reuses the exact same
//! values. A column with no present training values imputes to 0.0.

use common::ModelFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    medians: Vec<f64>,
}

impl Imputer {
    /// Fit per-column medians over the present values of the training
    /// frame.
    pub fn fit(frame: &ModelFrame) -> Self {
        let n_columns = frame.n_columns();
        let mut medians = Vec::with_capacity(n_columns);

        for column in 0..n_columns {
            let mut present: Vec<f64> = frame
                .features
                .iter()
                .filter_map(|row| row[column])
                .collect();
            present.sort_by(|a, b| a.total_cmp(b));
            medians.push(median_of_sorted(&present));
        }

        debug!(columns = n_columns, "imputer fitted on training columns");
        Self { medians }
    }

    pub fn medians(&self) -> &[f64] {
        &self.medians
    }

    /// Replace absent values in one row by the fitted medians.
    pub fn transform_row(&self, row: &[Option<f64>]) -> Vec<f64> {
        row.iter()
            .zip(&self.medians)
            .map(|(value, median)| value.unwrap_or(*median))
            .collect()
    }

    /// Dense row-major matrix for a whole frame.
    pub fn transform_frame(&self, frame: &ModelFrame) -> Vec<Vec<f64>> {
        frame
            .features
            .iter()
            .map(|row| self.transform_row(row))
            .collect()
    }
}

fn median_of_sorted(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}
