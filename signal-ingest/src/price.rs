//! Market-data source normalizer
//!
//! The market-data collector delivers daily OHLCV bars in long format,
//! optionally with precomputed indicator columns. Parsing here produces
//! both the canonical `PriceRecord`s (the price history the feature
//! builder derives from) and the per-key partial vectors merged into the
//! feature table.

use crate::source::{canonical_ticker, parse_date, SignalSource};
use common::{NowcastError, PartialVector, PriceRecord, SignalKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Field names the price source always contributes.
pub const PRICE_FIELDS: &[&str] = &["open", "high", "low", "close", "volume"];

/// An OHLCV row as shipped by the market-data collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPriceRecord {
    pub date: String,
    pub ticker: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Collector-side indicator columns, by name
    #[serde(default)]
    pub indicators: BTreeMap<String, f64>,
}

/// Normalizer for the market-data collector output.
#[derive(Debug, Clone, Default)]
pub struct PriceSource;

impl PriceSource {
    pub fn new() -> Self {
        Self
    }

    /// Parse and validate one raw bar into the canonical record.
    pub fn parse(&self, raw: &RawPriceRecord) -> Result<PriceRecord, NowcastError> {
        let date = parse_date(&raw.date).ok_or_else(|| {
            NowcastError::malformed("market", format!("unresolvable date `{}`", raw.date))
        })?;
        let ticker = canonical_ticker(&raw.ticker)
            .ok_or_else(|| NowcastError::malformed("market", "empty ticker"))?;

        for (name, value) in [
            ("open", raw.open),
            ("high", raw.high),
            ("low", raw.low),
            ("close", raw.close),
        ] {
            if !value.is_finite() {
                return Err(NowcastError::malformed(
                    "market",
                    format!("non-finite {name} for {ticker} on {date}"),
                ));
            }
        }
        if raw.close <= 0.0 {
            return Err(NowcastError::malformed(
                "market",
                format!("non-positive close {} for {ticker} on {date}", raw.close),
            ));
        }
        if !raw.volume.is_finite() || raw.volume < 0.0 {
            return Err(NowcastError::malformed(
                "market",
                format!("invalid volume {} for {ticker} on {date}", raw.volume),
            ));
        }

        // Indicator columns are optional; silently dropping a non-finite
        // one would hide collector bugs, so they are malformed too.
        for (name, value) in &raw.indicators {
            if !value.is_finite() {
                return Err(NowcastError::malformed(
                    "market",
                    format!("non-finite indicator `{name}` for {ticker} on {date}"),
                ));
            }
        }

        Ok(PriceRecord {
            date,
            ticker,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
            indicators: raw.indicators.clone(),
        })
    }

    /// Partial feature vector for one canonical price record: raw OHLCV
    /// plus any collector-supplied indicator columns under their own
    /// names.
    pub fn vector(&self, record: &PriceRecord) -> PartialVector {
        let mut vector = PartialVector::new();
        vector.insert("open".to_string(), record.open);
        vector.insert("high".to_string(), record.high);
        vector.insert("low".to_string(), record.low);
        vector.insert("close".to_string(), record.close);
        vector.insert("volume".to_string(), record.volume);
        for (name, value) in &record.indicators {
            vector.insert(name.clone(), *value);
        }
        vector
    }
}

impl SignalSource for PriceSource {
    type Record = RawPriceRecord;

    fn name(&self) -> &'static str {
        "market"
    }

    fn fields(&self) -> &'static [&'static str] {
        PRICE_FIELDS
    }

    fn normalize(&self, record: &Self::Record) -> Result<(SignalKey, PartialVector), NowcastError> {
        let parsed = self.parse(record)?;
        let key = SignalKey::new(parsed.date, parsed.ticker.clone());
        Ok((key, self.vector(&parsed)))
    }
}

/// Parsed price batch: canonical records plus the dropped-record count.
#[derive(Debug, Clone)]
pub struct PriceBatch {
    pub records: Vec<PriceRecord>,
    pub dropped: usize,
}

/// Parse a whole collector batch into canonical records, dropping and
/// counting malformed rows. Duplicate `(date, ticker)` bars are resolved
/// by letting the later record replace the earlier one.
pub fn parse_price_batch(raw: &[RawPriceRecord]) -> PriceBatch {
    let source = PriceSource::new();
    let mut by_key: BTreeMap<SignalKey, PriceRecord> = BTreeMap::new();
    let mut dropped = 0usize;

    for record in raw {
        match source.parse(record) {
            Ok(parsed) => {
                let key = SignalKey::new(parsed.date, parsed.ticker.clone());
                if by_key.insert(key.clone(), parsed).is_some() {
                    warn!(
                        date = %key.date,
                        ticker = %key.ticker,
                        "duplicate price bar, later record wins"
                    );
                }
            }
            Err(err) => {
                warn!(error = %err, "dropping malformed price record");
                dropped += 1;
            }
        }
    }

    PriceBatch {
        records: by_key.into_values().collect(),
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, ticker: &str, close: f64) -> RawPriceRecord {
        RawPriceRecord {
            date: date.to_string(),
            ticker: ticker.to_string(),
            open: close * 0.99,
            high: close * 1.01,
            low: close * 0.98,
            close,
            volume: 1_000_000.0,
            indicators: BTreeMap::new(),
        }
    }

    #[test]
    fn test_parse_valid_bar() {
        let source = PriceSource::new();
        let record = source.parse(&raw("2025-06-02", "brk.b", 412.5)).unwrap();
        assert_eq!(record.ticker, "BRK-B");
        assert_eq!(record.close, 412.5);
    }

    #[test]
    fn test_vector_includes_collector_indicators() {
        let source = PriceSource::new();
        let mut bar = raw("2025-06-02", "AAPL", 200.0);
        bar.indicators.insert("atr14".to_string(), 3.2);

        let (_, vector) = source.normalize(&bar).unwrap();
        assert_eq!(vector.get("close"), Some(&200.0));
        assert_eq!(vector.get("atr14"), Some(&3.2));
    }

    #[test]
    fn test_batch_drops_malformed_and_dedupes() {
        let mut bad_close = raw("2025-06-03", "MSFT", -5.0);
        bad_close.close = -5.0;

        let batch = parse_price_batch(&[
            raw("2025-06-02", "AAPL", 200.0),
            raw("2025-06-02", "AAPL", 201.0), // duplicate bar, wins
            bad_close,
            raw("not-a-date", "NVDA", 100.0),
        ]);

        assert_eq!(batch.dropped, 2);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].close, 201.0);
    }

    #[test]
    fn test_non_finite_indicator_is_malformed() {
        let source = PriceSource::new();
        let mut bar = raw("2025-06-02", "AAPL", 200.0);
        bar.indicators.insert("atr14".to_string(), f64::NAN);
        assert!(source.parse(&bar).is_err());
    }
}
