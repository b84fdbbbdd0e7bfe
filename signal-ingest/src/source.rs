// Source trait and the batch driver shared by all normalizers

use common::{NowcastError, PartialVector, SignalKey};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// One upstream signal source (buzz collector, market-data collector, ...).
///
/// A source only ever reports the fields it actually supplies; it never
/// fabricates values for keys it did not observe.
pub trait SignalSource {
    type Record;

    fn name(&self) -> &'static str;

    /// Canonical field names this source contributes to the feature table.
    fn fields(&self) -> &'static [&'static str];

    /// Map one raw record to its `(date, ticker)` key and partial vector.
    /// Records without a resolvable date or ticker, or with values outside
    /// their documented range, fail with `MalformedRecord`.
    fn normalize(&self, record: &Self::Record) -> Result<(SignalKey, PartialVector), NowcastError>;
}

/// Result of normalizing one source batch. Malformed records are dropped
/// and counted, never fatal to the batch.
#[derive(Debug, Clone)]
pub struct NormalizeOutcome {
    pub source_name: &'static str,
    pub vectors: BTreeMap<SignalKey, PartialVector>,
    pub dropped: usize,
}

/// Normalize a whole batch from one source.
///
/// Duplicate keys within the batch are resolved by letting the later
/// record replace the earlier one.
pub fn normalize_batch<S: SignalSource>(source: &S, records: &[S::Record]) -> NormalizeOutcome {
    let mut vectors: BTreeMap<SignalKey, PartialVector> = BTreeMap::new();
    let mut dropped = 0usize;

    for record in records {
        match source.normalize(record) {
            Ok((key, vector)) => {
                if let Some(previous) = vectors.insert(key.clone(), vector) {
                    warn!(
                        source = source.name(),
                        date = %key.date,
                        ticker = %key.ticker,
                        replaced_fields = previous.len(),
                        "duplicate key in source batch, later record wins"
                    );
                }
            }
            Err(err) => {
                warn!(source = source.name(), error = %err, "dropping malformed record");
                dropped += 1;
            }
        }
    }

    debug!(
        source = source.name(),
        keys = vectors.len(),
        dropped,
        "normalized source batch"
    );

    NormalizeOutcome {
        source_name: source.name(),
        vectors,
        dropped,
    }
}

/// Normalize a ticker symbol to the internal form: trimmed, uppercase,
/// dots replaced by dashes (BRK.B -> BRK-B).
pub(crate) fn canonical_ticker(raw: &str) -> Option<String> {
    let ticker = raw.trim().to_uppercase().replace('.', "-");
    if ticker.is_empty() {
        None
    } else {
        Some(ticker)
    }
}

/// Parse a collector-supplied date string (YYYY-MM-DD).
pub(crate) fn parse_date(raw: &str) -> Option<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}
