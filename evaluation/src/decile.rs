//! Decile-Spread Evaluator
//!
//! Ranks holdout predictions by probability and measures the realized
//! forward-return gap between the most- and least-confident deciles. The
//! ranking is fully deterministic: probability descending, then ticker
//! lexical order, then date, so identical inputs always produce identical
//! decile membership.

use common::{PredictionRow, RunMetrics};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::{info, warn};
use uuid::Uuid;

pub const N_DECILES: usize = 10;

/// Trading days per year used to compound the per-period spread.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Coin-flip reference accuracy for a binary direction target.
pub const BASELINE_ACCURACY: f64 = 0.5;

/// Spread of realized forward returns between the top and bottom deciles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DecileSpread {
    pub daily: f64,
    pub annualized: f64,
}

#[derive(Debug, Clone)]
pub struct DecileEvaluator {
    /// Forecast horizon K of the label assigner, in trading days. The
    /// annualization exponent is 252/K so multi-day horizons compound
    /// correctly.
    horizon_days: usize,
}

impl DecileEvaluator {
    pub fn new(horizon_days: usize) -> Self {
        Self { horizon_days }
    }

    /// Rank predictions into a deterministic order.
    pub fn ranked(&self, predictions: &[PredictionRow]) -> Vec<PredictionRow> {
        let mut ranked = predictions.to_vec();
        ranked.sort_by(|a, b| {
            b.probability
                .total_cmp(&a.probability)
                .then_with(|| a.ticker.cmp(&b.ticker))
                .then_with(|| a.date.cmp(&b.date))
        });
        ranked
    }

    /// Partition the ranked predictions into ten groups, top decile
    /// first. Groups are as equal as possible; when the count is not
    /// divisible by ten, the remainder rows go to the lowest deciles.
    pub fn deciles(&self, predictions: &[PredictionRow]) -> Vec<Vec<PredictionRow>> {
        let ranked = self.ranked(predictions);
        let n = ranked.len();
        let base = n / N_DECILES;
        let remainder = n % N_DECILES;

        let mut groups = Vec::with_capacity(N_DECILES);
        let mut offset = 0;
        for decile in 0..N_DECILES {
            let size = if decile >= N_DECILES - remainder {
                base + 1
            } else {
                base
            };
            groups.push(ranked[offset..offset + size].to_vec());
            offset += size;
        }
        groups
    }

    /// Top-minus-bottom decile spread of realized forward returns. With
    /// fewer than ten rows a decile is empty and the spread is NaN — a
    /// degenerate ranking is reported, not raised.
    pub fn spread(&self, predictions: &[PredictionRow]) -> DecileSpread {
        let groups = self.deciles(predictions);
        let top = groups.first();
        let bottom = groups.last();

        let daily = match (top, bottom) {
            (Some(top), Some(bottom)) if !top.is_empty() && !bottom.is_empty() => {
                let top_mean = top
                    .iter()
                    .map(|p| p.realized_forward_return)
                    .mean();
                let bottom_mean = bottom
                    .iter()
                    .map(|p| p.realized_forward_return)
                    .mean();
                top_mean - bottom_mean
            }
            _ => {
                warn!(
                    n_rows = predictions.len(),
                    "fewer than {N_DECILES} holdout rows, spread undefined"
                );
                f64::NAN
            }
        };

        DecileSpread {
            daily,
            annualized: self.annualize(daily),
        }
    }

    /// Compound a per-period spread to a trading year at the label
    /// horizon: `(1 + s)^(252/K) - 1`.
    pub fn annualize(&self, spread: f64) -> f64 {
        let periods_per_year = TRADING_DAYS_PER_YEAR / self.horizon_days.max(1) as f64;
        (1.0 + spread).powf(periods_per_year) - 1.0
    }

    /// Fraction of rows where the thresholded probability matches the
    /// realized label.
    pub fn accuracy(&self, predictions: &[PredictionRow]) -> f64 {
        if predictions.is_empty() {
            return f64::NAN;
        }
        let correct = predictions
            .iter()
            .filter(|p| (p.probability >= 0.5) == p.label)
            .count();
        correct as f64 / predictions.len() as f64
    }

    /// Assemble the per-run metrics object for one model variant.
    pub fn evaluate(
        &self,
        model_name: &str,
        predictions: &[PredictionRow],
        n_train: usize,
    ) -> RunMetrics {
        let spread = self.spread(predictions);
        let holdout_accuracy = self.accuracy(predictions);

        let metrics = RunMetrics {
            run_id: Uuid::new_v4(),
            model_name: model_name.to_string(),
            holdout_accuracy,
            baseline_accuracy: BASELINE_ACCURACY,
            decile_spread_daily: spread.daily,
            decile_spread_annualized: spread.annualized,
            n_train,
            n_holdout: predictions.len(),
        };

        info!(
            model = model_name,
            accuracy = holdout_accuracy,
            spread_daily = spread.daily,
            spread_annualized = spread.annualized,
            "holdout evaluated"
        );
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn prediction(ticker: &str, probability: f64, ret: f64) -> PredictionRow {
        PredictionRow {
            date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            ticker: ticker.to_string(),
            probability,
            label: ret > 0.0,
            realized_forward_return: ret,
        }
    }

    /// 10 rows with monotonically increasing probability and return.
    fn monotone_rows() -> Vec<PredictionRow> {
        (0..10)
            .map(|i| {
                prediction(
                    &format!("T{i:02}"),
                    0.05 + i as f64 * 0.09,
                    -0.05 + i as f64 * 0.01,
                )
            })
            .collect()
    }

    #[test]
    fn test_ten_monotone_rows_give_single_row_deciles() {
        let evaluator = DecileEvaluator::new(1);
        let rows = monotone_rows();
        let groups = evaluator.deciles(&rows);

        assert!(groups.iter().all(|g| g.len() == 1));
        // Top decile holds the highest probability
        assert_eq!(groups[0][0].ticker, "T09");
        assert_eq!(groups[9][0].ticker, "T00");

        let spread = evaluator.spread(&rows);
        let expected = rows[9].realized_forward_return - rows[0].realized_forward_return;
        assert!((spread.daily - expected).abs() < 1e-12);
    }

    #[test]
    fn test_annualization_round_trip_at_k1() {
        let evaluator = DecileEvaluator::new(1);
        let s: f64 = 0.0123;
        let expected = (1.0 + s).powf(252.0) - 1.0;
        assert!((evaluator.annualize(s) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_annualization_exponent_tracks_horizon() {
        let evaluator = DecileEvaluator::new(5);
        let s: f64 = 0.02;
        let expected = (1.0 + s).powf(252.0 / 5.0) - 1.0;
        assert!((evaluator.annualize(s) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_spread_is_nan_below_ten_rows() {
        let evaluator = DecileEvaluator::new(1);
        let rows: Vec<PredictionRow> = monotone_rows().into_iter().take(7).collect();
        let spread = evaluator.spread(&rows);
        assert!(spread.daily.is_nan());
        assert!(spread.annualized.is_nan());
    }

    #[test]
    fn test_remainder_rows_go_to_lowest_deciles() {
        let evaluator = DecileEvaluator::new(1);
        let rows: Vec<PredictionRow> = (0..23)
            .map(|i| prediction(&format!("T{i:02}"), i as f64 / 23.0, 0.0))
            .collect();

        let groups = evaluator.deciles(&rows);
        let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2, 2, 2, 2, 2, 2, 3, 3, 3]);
    }

    #[test]
    fn test_evaluation_is_deterministic_under_ties() {
        let evaluator = DecileEvaluator::new(1);
        // All probabilities tie; membership must come from ticker order
        let rows: Vec<PredictionRow> = (0..20)
            .map(|i| prediction(&format!("T{:02}", 19 - i), 0.5, i as f64 * 0.001))
            .collect();

        let first = evaluator.deciles(&rows);
        let second = evaluator.deciles(&rows);
        for (a, b) in first.iter().zip(&second) {
            let a_keys: Vec<&str> = a.iter().map(|p| p.ticker.as_str()).collect();
            let b_keys: Vec<&str> = b.iter().map(|p| p.ticker.as_str()).collect();
            assert_eq!(a_keys, b_keys);
        }

        let s1 = evaluator.spread(&rows);
        let s2 = evaluator.spread(&rows);
        assert_eq!(s1.daily.to_bits(), s2.daily.to_bits());

        // Tie-break is ticker lexical order, top decile first
        assert_eq!(first[0][0].ticker, "T00");
        assert_eq!(first[0][1].ticker, "T01");
    }

    #[test]
    fn test_accuracy_against_labels() {
        let evaluator = DecileEvaluator::new(1);
        let rows = vec![
            prediction("A", 0.9, 0.01),  // correct
            prediction("B", 0.1, -0.02), // correct
            prediction("C", 0.8, -0.01), // wrong
            prediction("D", 0.2, 0.03),  // wrong
        ];
        assert!((evaluator.accuracy(&rows) - 0.5).abs() < 1e-12);

        let metrics = evaluator.evaluate("logistic_regression", &rows, 120);
        assert_eq!(metrics.n_holdout, 4);
        assert_eq!(metrics.n_train, 120);
        assert_eq!(metrics.baseline_accuracy, 0.5);
    }
}
