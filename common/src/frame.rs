//! Labeled design data extracted from a feature table
//!
//! A `ModelFrame` is the bridge between the keyed feature table and the
//! trainers: rows in schema column order, features still carrying their
//! absent markers, labels and realized forward returns aligned by index.

use crate::types::SignalKey;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFrame {
    /// Feature column names, in schema order
    pub columns: Vec<String>,
    /// Row keys, parallel to `features`/`labels`/`forward_returns`
    pub keys: Vec<SignalKey>,
    /// Row-major feature matrix; `None` marks an absent value
    pub features: Vec<Vec<Option<f64>>>,
    pub labels: Vec<bool>,
    pub forward_returns: Vec<f64>,
}

impl ModelFrame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            keys: Vec::new(),
            features: Vec::new(),
            labels: Vec::new(),
            forward_returns: Vec::new(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.keys.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn push_row(
        &mut self,
        key: SignalKey,
        features: Vec<Option<f64>>,
        label: bool,
        forward_return: f64,
    ) {
        debug_assert_eq!(features.len(), self.columns.len());
        self.keys.push(key);
        self.features.push(features);
        self.labels.push(label);
        self.forward_returns.push(forward_return);
    }

    /// Copy out the rows at `indices`, keeping column order.
    pub fn subset(&self, indices: &[usize]) -> ModelFrame {
        ModelFrame {
            columns: self.columns.clone(),
            keys: indices.iter().map(|&i| self.keys[i].clone()).collect(),
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            forward_returns: indices.iter().map(|&i| self.forward_returns[i]).collect(),
        }
    }

    /// Distinct dates present in the frame, ascending.
    pub fn distinct_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.keys.iter().map(|k| k.date).collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }

    pub fn min_date(&self) -> Option<NaiveDate> {
        self.keys.iter().map(|k| k.date).min()
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.keys.iter().map(|k| k.date).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn sample_frame() -> ModelFrame {
        let mut frame = ModelFrame::new(vec!["r1".to_string(), "mentions".to_string()]);
        frame.push_row(
            SignalKey::new(day(3), "AAPL"),
            vec![Some(0.01), None],
            true,
            0.02,
        );
        frame.push_row(
            SignalKey::new(day(4), "AAPL"),
            vec![Some(-0.02), Some(5.0)],
            false,
            -0.01,
        );
        frame.push_row(
            SignalKey::new(day(4), "MSFT"),
            vec![Some(0.005), Some(1.0)],
            true,
            0.03,
        );
        frame
    }

    #[test]
    fn test_subset_keeps_row_alignment() {
        let frame = sample_frame();
        let sub = frame.subset(&[0, 2]);

        assert_eq!(sub.n_rows(), 2);
        assert_eq!(sub.keys[1].ticker, "MSFT");
        assert_eq!(sub.labels, vec![true, true]);
        assert_eq!(sub.forward_returns, vec![0.02, 0.03]);
        assert_eq!(sub.features[0][1], None);
    }

    #[test]
    fn test_distinct_dates_sorted_and_deduped() {
        let frame = sample_frame();
        assert_eq!(frame.distinct_dates(), vec![day(3), day(4)]);
        assert_eq!(frame.min_date(), Some(day(3)));
        assert_eq!(frame.max_date(), Some(day(4)));
    }
}
