//! Buzz (attention + sentiment) source normalizer
//!
//! The buzz collector aggregates RSS/Reddit mentions per day and hands
//! over one row per (date, ticker) with a mention count, a mean compound
//! sentiment, and the feeds that contributed.

use crate::source::{canonical_ticker, parse_date, SignalSource};
use common::{AttentionRecord, NowcastError, PartialVector, SignalKey};
use serde::{Deserialize, Serialize};

/// Field names contributed by the attention source.
pub const ATTENTION_FIELDS: &[&str] = &["mentions", "avg_sentiment", "source_count"];

/// A buzz row exactly as the collector wrote it: stringly date and ticker,
/// sources as a `;`-joined feed list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAttentionRecord {
    pub date: String,
    pub ticker: String,
    pub mentions: f64,
    pub avg_sentiment: f64,
    #[serde(default)]
    pub sources: String,
}

/// Normalizer for the buzz collector output.
#[derive(Debug, Clone, Default)]
pub struct AttentionSource;

impl AttentionSource {
    pub fn new() -> Self {
        Self
    }

    /// Parse and validate one raw row into the canonical record.
    pub fn parse(&self, raw: &RawAttentionRecord) -> Result<AttentionRecord, NowcastError> {
        let date = parse_date(&raw.date)
            .ok_or_else(|| NowcastError::malformed("buzz", format!("unresolvable date `{}`", raw.date)))?;
        let ticker = canonical_ticker(&raw.ticker)
            .ok_or_else(|| NowcastError::malformed("buzz", "empty ticker"))?;

        if !raw.mentions.is_finite() || raw.mentions < 0.0 {
            return Err(NowcastError::malformed(
                "buzz",
                format!("mention count `{}` out of range for {ticker}", raw.mentions),
            ));
        }
        if !raw.avg_sentiment.is_finite() || !(-1.0..=1.0).contains(&raw.avg_sentiment) {
            return Err(NowcastError::malformed(
                "buzz",
                format!("sentiment `{}` outside [-1, 1] for {ticker}", raw.avg_sentiment),
            ));
        }

        let source_count = raw
            .sources
            .split(';')
            .filter(|s| !s.trim().is_empty())
            .count() as u32;

        Ok(AttentionRecord {
            date,
            ticker,
            mention_count: raw.mentions as u32,
            mean_sentiment: raw.avg_sentiment,
            source_count,
        })
    }

    /// Partial feature vector for one canonical attention record.
    pub fn vector(&self, record: &AttentionRecord) -> PartialVector {
        let mut vector = PartialVector::new();
        vector.insert("mentions".to_string(), f64::from(record.mention_count));
        vector.insert("avg_sentiment".to_string(), record.mean_sentiment);
        vector.insert("source_count".to_string(), f64::from(record.source_count));
        vector
    }
}

impl SignalSource for AttentionSource {
    type Record = RawAttentionRecord;

    fn name(&self) -> &'static str {
        "buzz"
    }

    fn fields(&self) -> &'static [&'static str] {
        ATTENTION_FIELDS
    }

    fn normalize(&self, record: &Self::Record) -> Result<(SignalKey, PartialVector), NowcastError> {
        let parsed = self.parse(record)?;
        let key = SignalKey::new(parsed.date, parsed.ticker.clone());
        Ok((key, self.vector(&parsed)))
    }
}
