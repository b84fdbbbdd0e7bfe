//! Core record and table types keyed by `(date, ticker)`

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Unique key of every row in the feature table.
///
/// Ordering is date-major, then ticker lexical, which makes `BTreeMap`
/// iteration over keyed rows deterministic across runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SignalKey {
    pub date: NaiveDate,
    pub ticker: String,
}

impl SignalKey {
    pub fn new(date: NaiveDate, ticker: impl Into<String>) -> Self {
        Self {
            date,
            ticker: ticker.into(),
        }
    }
}

/// The fields one source contributes for one `(date, ticker)` key.
pub type PartialVector = BTreeMap<String, f64>;

/// Daily attention aggregate for one ticker, produced once per
/// `(date, ticker)` by the buzz collector. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttentionRecord {
    pub date: NaiveDate,
    pub ticker: String,
    /// Number of mentions across all monitored feeds
    pub mention_count: u32,
    /// Mean compound sentiment of mentioning items, in [-1, 1]
    pub mean_sentiment: f64,
    /// Number of distinct feeds that mentioned the ticker
    pub source_count: u32,
}

/// One trading day of OHLCV for one ticker, plus any indicator columns the
/// market-data collector shipped alongside. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub ticker: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Collector-supplied indicator columns, by name
    #[serde(default)]
    pub indicators: BTreeMap<String, f64>,
}

/// A feature value that distinguishes "not observed" from zero.
///
/// `Absent` survives the whole pipeline; only the trainer may replace it,
/// through its recorded imputation rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FeatureValue {
    Present(f64),
    Absent,
}

impl FeatureValue {
    pub fn from_option(value: Option<f64>) -> Self {
        match value {
            Some(v) => FeatureValue::Present(v),
            None => FeatureValue::Absent,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Present(v) => Some(*v),
            FeatureValue::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FeatureValue::Absent)
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Present(value)
    }
}

/// One row of the merged feature table.
///
/// Invariant: every feature value is computable from information dated at
/// or before `date`; `forward_return` and `label` use only the window
/// `(date, date + K]` in trading days. `label == None` means the forward
/// window is not observable and the row is excluded from training and
/// evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub ticker: String,
    pub features: BTreeMap<String, FeatureValue>,
    pub forward_return: Option<f64>,
    pub label: Option<bool>,
}

impl FeatureRow {
    pub fn new(date: NaiveDate, ticker: impl Into<String>) -> Self {
        Self {
            date,
            ticker: ticker.into(),
            features: BTreeMap::new(),
            forward_return: None,
            label: None,
        }
    }

    pub fn key(&self) -> SignalKey {
        SignalKey::new(self.date, self.ticker.clone())
    }

    /// Look up a feature by name; columns the row never saw are `Absent`.
    pub fn feature(&self, name: &str) -> FeatureValue {
        self.features
            .get(name)
            .copied()
            .unwrap_or(FeatureValue::Absent)
    }
}

/// Scored holdout row, consumed only by the decile evaluator and discarded
/// once the run's metrics are emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRow {
    pub date: NaiveDate,
    pub ticker: String,
    /// Predicted probability of the positive label, in [0, 1]
    pub probability: f64,
    /// Realized direction label for the forward window
    pub label: bool,
    /// Realized forward return over the label horizon
    pub realized_forward_return: f64,
}

/// Per-run evaluation metrics for one model variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetrics {
    pub run_id: Uuid,
    pub model_name: String,
    /// Fraction of holdout rows where `(probability >= 0.5) == label`
    pub holdout_accuracy: f64,
    /// Coin-flip reference for a binary direction target
    pub baseline_accuracy: f64,
    /// Top-minus-bottom decile mean forward return, per period
    pub decile_spread_daily: f64,
    /// Spread compounded to a year of trading days at the label horizon
    pub decile_spread_annualized: f64,
    pub n_train: usize,
    pub n_holdout: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_key_ordering_is_date_major() {
        let d1 = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();

        let earlier = SignalKey::new(d1, "ZZZZ");
        let later = SignalKey::new(d2, "AAPL");
        assert!(earlier < later);

        let a = SignalKey::new(d1, "AAPL");
        let b = SignalKey::new(d1, "MSFT");
        assert!(a < b);
    }

    #[test]
    fn test_feature_value_absent_is_not_zero() {
        let absent = FeatureValue::Absent;
        let zero = FeatureValue::Present(0.0);

        assert_ne!(absent, zero);
        assert!(absent.is_absent());
        assert_eq!(absent.as_f64(), None);
        assert_eq!(zero.as_f64(), Some(0.0));
    }

    #[test]
    fn test_feature_row_missing_column_reads_absent() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let mut row = FeatureRow::new(date, "AAPL");
        row.features.insert("mentions".to_string(), 3.0.into());

        assert_eq!(row.feature("mentions"), FeatureValue::Present(3.0));
        assert!(row.feature("avg_sentiment").is_absent());
    }

    #[test]
    fn test_feature_value_serde_round_trip() {
        let v = FeatureValue::Present(0.25);
        let json = serde_json::to_string(&v).unwrap();
        let back: FeatureValue = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);

        let absent = FeatureValue::Absent;
        let json = serde_json::to_string(&absent).unwrap();
        let back: FeatureValue = serde_json::from_str(&json).unwrap();
        assert!(back.is_absent());
    }
}
