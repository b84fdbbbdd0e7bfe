//! Caller-owned price history store
//!
//! One `PriceHistory` is built per run from the collector's parsed bars
//! and passed explicitly to the builder and label assigner. There is no
//! process-wide cache; the store's lifetime is the run's lifetime, which
//! keeps repeated runs reproducible and testable in isolation.

use chrono::NaiveDate;
use common::PriceRecord;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    by_ticker: BTreeMap<String, Vec<PriceRecord>>,
}

impl PriceHistory {
    /// Group records per ticker and sort each series by date. Duplicate
    /// bars for the same day keep the last occurrence.
    pub fn from_records(records: Vec<PriceRecord>) -> Self {
        let mut by_ticker: BTreeMap<String, Vec<PriceRecord>> = BTreeMap::new();
        for record in records {
            by_ticker.entry(record.ticker.clone()).or_default().push(record);
        }

        for series in by_ticker.values_mut() {
            series.sort_by_key(|r| r.date);
            series.dedup_by(|b, a| {
                if a.date == b.date {
                    *a = b.clone();
                    true
                } else {
                    false
                }
            });
        }

        Self { by_ticker }
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.by_ticker.keys().map(String::as_str)
    }

    /// Date-sorted bars for one ticker.
    pub fn series(&self, ticker: &str) -> Option<&[PriceRecord]> {
        self.by_ticker.get(ticker).map(Vec::as_slice)
    }

    /// Index of the bar at exactly `date` within a ticker's series.
    pub fn index_of(&self, ticker: &str, date: NaiveDate) -> Option<usize> {
        let series = self.by_ticker.get(ticker)?;
        series.binary_search_by_key(&date, |r| r.date).ok()
    }

    pub fn n_tickers(&self) -> usize {
        self.by_ticker.len()
    }

    pub fn n_records(&self) -> usize {
        self.by_ticker.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ticker.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn bar(ticker: &str, day: u32, close: f64) -> PriceRecord {
        PriceRecord {
            date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            ticker: ticker.to_string(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
            indicators: BTreeMap::new(),
        }
    }

    #[test]
    fn test_series_sorted_by_date() {
        let history = PriceHistory::from_records(vec![
            bar("AAPL", 4, 202.0),
            bar("AAPL", 2, 200.0),
            bar("AAPL", 3, 201.0),
        ]);

        let closes: Vec<f64> = history
            .series("AAPL")
            .unwrap()
            .iter()
            .map(|r| r.close)
            .collect();
        assert_eq!(closes, vec![200.0, 201.0, 202.0]);
    }

    #[test]
    fn test_duplicate_day_keeps_last() {
        let history =
            PriceHistory::from_records(vec![bar("AAPL", 2, 200.0), bar("AAPL", 2, 205.0)]);
        let series = history.series("AAPL").unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].close, 205.0);
    }

    #[test]
    fn test_index_of() {
        let history = PriceHistory::from_records(vec![bar("AAPL", 2, 200.0), bar("AAPL", 4, 201.0)]);
        assert_eq!(
            history.index_of("AAPL", NaiveDate::from_ymd_opt(2025, 6, 4).unwrap()),
            Some(1)
        );
        assert_eq!(
            history.index_of("AAPL", NaiveDate::from_ymd_opt(2025, 6, 3).unwrap()),
            None
        );
        assert_eq!(
            history.index_of("MSFT", NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()),
            None
        );
    }
}
