//! Feature Table Builder
//!
//! Outer-join merge of per-source partial vectors on `(date, ticker)`,
//! plus derived indicators computed strictly from price history at or
//! before each row's date. The column schema is fixed and versioned;
//! sources that did not report a key leave explicit `Absent` markers.

use crate::history::PriceHistory;
use crate::indicators;
use chrono::NaiveDate;
use common::{FeatureRow, FeatureValue, ModelFrame, SignalKey};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use signal_ingest::NormalizeOutcome;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Version of the feature column schema below. Bump when columns change.
pub const SCHEMA_VERSION: u32 = 1;

/// Canonical feature columns, in model input order.
pub const SCHEMA_COLUMNS: &[&str] = &[
    "r1",
    "r5",
    "r20",
    "vol20",
    "rsi14",
    "hi52_dist",
    "lo52_dist",
    "mentions",
    "avg_sentiment",
    "source_count",
];

/// Indicator windows behind the schema columns. These are part of the
/// versioned schema, not run configuration: changing them changes what a
/// column means.
const RETURN_WINDOW_SHORT: usize = 1;
const RETURN_WINDOW_MEDIUM: usize = 5;
const RETURN_WINDOW_LONG: usize = 20;
const VOL_WINDOW: usize = 20;
const RSI_WINDOW: usize = 14;
const EXTREME_WINDOW: usize = 252;

pub fn schema_columns() -> Vec<String> {
    SCHEMA_COLUMNS.iter().map(|c| c.to_string()).collect()
}

/// Builder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Minimum prior trading days before rolling-extreme features are
    /// considered computable
    #[serde(default = "default_min_lookback_days")]
    pub min_lookback_days: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            min_lookback_days: default_min_lookback_days(),
        }
    }
}

fn default_min_lookback_days() -> usize {
    20
}

/// The merged feature table. `(date, ticker)` is a unique key by
/// construction; iteration order is date-major, then ticker.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    schema_version: u32,
    rows: BTreeMap<SignalKey, FeatureRow>,
}

impl FeatureTable {
    fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            rows: BTreeMap::new(),
        }
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &SignalKey) -> Option<&FeatureRow> {
        self.rows.get(key)
    }

    pub fn rows(&self) -> impl Iterator<Item = &FeatureRow> {
        self.rows.values()
    }

    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = &mut FeatureRow> {
        self.rows.values_mut()
    }

    /// Read-only snapshot of the rows within an inclusive date range.
    pub fn range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = &FeatureRow> + '_ {
        self.rows
            .range(SignalKey::new(start, String::new())..)
            .take_while(move |(key, _)| key.date <= end)
            .map(|(_, row)| row)
    }

    /// Extract the labeled design data in schema column order. Rows whose
    /// forward window was not observable carry no label and are excluded.
    pub fn to_frame(&self) -> ModelFrame {
        let columns = schema_columns();
        let mut frame = ModelFrame::new(columns.clone());

        for row in self.rows.values() {
            let (label, forward_return) = match (row.label, row.forward_return) {
                (Some(label), Some(fr)) => (label, fr),
                _ => continue,
            };
            let features = columns
                .iter()
                .map(|column| row.feature(column).as_f64())
                .collect();
            frame.push_row(row.key(), features, label, forward_return);
        }
        frame
    }
}

/// Merges source vectors and computes derived indicator columns.
#[derive(Debug, Clone, Default)]
pub struct FeatureTableBuilder {
    config: FeatureConfig,
}

/// Derived columns for one row, in fixed order.
type DerivedRow = (NaiveDate, [Option<f64>; 7]);

const DERIVED_NAMES: [&str; 7] = [
    "r1",
    "r5",
    "r20",
    "vol20",
    "rsi14",
    "hi52_dist",
    "lo52_dist",
];

impl FeatureTableBuilder {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Build the table for the union of all observed keys within the
    /// inclusive `[start, end]` range.
    pub fn build(
        &self,
        sources: &[NormalizeOutcome],
        history: &PriceHistory,
        start: NaiveDate,
        end: NaiveDate,
    ) -> FeatureTable {
        let mut table = FeatureTable::new();

        // Outer join of all sources on (date, ticker)
        for outcome in sources {
            for (key, vector) in &outcome.vectors {
                if key.date < start || key.date > end {
                    continue;
                }
                let row = table
                    .rows
                    .entry(key.clone())
                    .or_insert_with(|| FeatureRow::new(key.date, key.ticker.clone()));
                for (name, value) in vector {
                    if row
                        .features
                        .insert(name.clone(), FeatureValue::Present(*value))
                        .is_some()
                    {
                        debug!(
                            field = %name,
                            source = outcome.source_name,
                            ticker = %key.ticker,
                            "field overwritten by later source"
                        );
                    }
                }
            }
        }

        // Row dates per ticker, for the derived pass
        let mut dates_by_ticker: BTreeMap<String, Vec<NaiveDate>> = BTreeMap::new();
        for key in table.rows.keys() {
            dates_by_ticker
                .entry(key.ticker.clone())
                .or_default()
                .push(key.date);
        }

        // Per-ticker indicator series are disjoint, so they are computed
        // in parallel and merged back by key.
        let per_ticker: Vec<(String, Vec<DerivedRow>)> = dates_by_ticker
            .into_iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(ticker, dates)| {
                let derived = self.derive_for_ticker(&ticker, &dates, history);
                (ticker, derived)
            })
            .collect();

        for (ticker, derived_rows) in per_ticker {
            for (date, values) in derived_rows {
                let key = SignalKey::new(date, ticker.clone());
                if let Some(row) = table.rows.get_mut(&key) {
                    for (name, value) in DERIVED_NAMES.iter().zip(values) {
                        // Derived columns are computed locally and take
                        // precedence over same-named collector columns.
                        if let Some(prev) = row
                            .features
                            .insert(name.to_string(), FeatureValue::from_option(value))
                        {
                            if !prev.is_absent() && value.is_none() {
                                debug!(
                                    field = %name,
                                    ticker = %ticker,
                                    "collector column replaced by locally derived value"
                                );
                            }
                        }
                    }
                }
            }
        }

        // Every schema column exists on every row, explicitly absent when
        // no source reported it.
        for row in table.rows.values_mut() {
            for column in SCHEMA_COLUMNS {
                row.features
                    .entry(column.to_string())
                    .or_insert(FeatureValue::Absent);
            }
        }

        info!(
            rows = table.len(),
            schema_version = table.schema_version(),
            "feature table built"
        );
        table
    }

    /// Indicator values for one ticker's row dates, computed from its
    /// full price series. A date without a price bar, or with too little
    /// lookback, yields absent values.
    fn derive_for_ticker(
        &self,
        ticker: &str,
        dates: &[NaiveDate],
        history: &PriceHistory,
    ) -> Vec<DerivedRow> {
        let series = match history.series(ticker) {
            Some(series) => series,
            None => return dates.iter().map(|d| (*d, [None; 7])).collect(),
        };
        let closes: Vec<f64> = series.iter().map(|r| r.close).collect();

        let r1 = indicators::simple_return(&closes, RETURN_WINDOW_SHORT);
        let r5 = indicators::simple_return(&closes, RETURN_WINDOW_MEDIUM);
        let r20 = indicators::simple_return(&closes, RETURN_WINDOW_LONG);
        let vol20 = indicators::rolling_std(&r1, VOL_WINDOW);
        let rsi14 = indicators::wilder_rsi(&closes, RSI_WINDOW);
        let hi52 = indicators::rolling_max(&closes, EXTREME_WINDOW, self.config.min_lookback_days);
        let lo52 = indicators::rolling_min(&closes, EXTREME_WINDOW, self.config.min_lookback_days);

        dates
            .iter()
            .map(|date| {
                let idx = match series.binary_search_by_key(date, |r| r.date) {
                    Ok(idx) => idx,
                    Err(_) => return (*date, [None; 7]),
                };
                let close = closes[idx];
                let hi_dist = hi52[idx].map(|hi| close / hi - 1.0);
                let lo_dist = lo52[idx].map(|lo| close / lo - 1.0);
                (
                    *date,
                    [r1[idx], r5[idx], r20[idx], vol20[idx], rsi14[idx], hi_dist, lo_dist],
                )
            })
            .collect()
    }
}
