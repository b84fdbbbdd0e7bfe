//! End-to-end runs over synthetic collector data

use chrono::{Days, NaiveDate};
use evaluation::{SplitConfig, SplitPoint};
use nowcast_model::{ForestConfig, ModelConfig};
use nowcast_pipeline::{NowcastConfig, NowcastPipeline};
use signal_ingest::{RawAttentionRecord, RawPriceRecord};
use std::collections::BTreeMap;

const TICKERS: [&str; 4] = ["AAPL", "MSFT", "NVDA", "TSLA"];

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn date_string(offset: u64) -> String {
    (start_date() + Days::new(offset)).format("%Y-%m-%d").to_string()
}

/// Oscillating closes so both label classes appear.
fn synthetic_prices(n_days: u64) -> Vec<RawPriceRecord> {
    let mut prices = Vec::new();
    for (t, ticker) in TICKERS.iter().enumerate() {
        let base = 100.0 + t as f64 * 50.0;
        for i in 0..n_days {
            let wave = (i as f64 * 0.7 + t as f64).sin() * 0.04;
            let drift = i as f64 * 0.0002;
            let close = base * (1.0 + wave + drift);
            prices.push(RawPriceRecord {
                date: date_string(i),
                ticker: ticker.to_string(),
                open: close * 0.995,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume: 1_000_000.0 + (i as f64 * 1000.0),
                indicators: BTreeMap::new(),
            });
        }
    }
    prices
}

/// Buzz for every ticker except TSLA.
fn synthetic_buzz(n_days: u64) -> Vec<RawAttentionRecord> {
    let mut buzz = Vec::new();
    for (t, ticker) in TICKERS.iter().take(3).enumerate() {
        for i in 0..n_days {
            buzz.push(RawAttentionRecord {
                date: date_string(i),
                ticker: ticker.to_string(),
                mentions: 1.0 + ((i + t as u64) % 7) as f64,
                avg_sentiment: ((i as f64 * 0.3).sin() * 0.6).clamp(-1.0, 1.0),
                sources: "wsj;reddit-stocks;yahoo".to_string(),
            });
        }
    }
    buzz
}

fn test_config() -> NowcastConfig {
    NowcastConfig {
        split: SplitConfig {
            min_rows: 50,
            point: SplitPoint::TrailingDays(20),
        },
        model: ModelConfig {
            forest: ForestConfig {
                n_trees: 20,
                max_depth: 5,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn full_run_produces_metrics_for_every_model() {
    let n_days = 120;
    let pipeline = NowcastPipeline::new(test_config()).unwrap();
    let run = pipeline
        .run(
            &synthetic_buzz(n_days),
            &synthetic_prices(n_days),
            start_date(),
            start_date() + Days::new(n_days - 1),
        )
        .unwrap();

    assert_eq!(run.metrics.len(), 2);
    assert_eq!(run.metrics[0].model_name, "logistic_regression");
    assert_eq!(run.metrics[1].model_name, "random_forest");

    for metrics in &run.metrics {
        assert!((0.0..=1.0).contains(&metrics.holdout_accuracy));
        assert_eq!(metrics.baseline_accuracy, 0.5);
        // 119 labeled dates per ticker, last 20 reserved for holdout
        assert_eq!(metrics.n_train, 4 * 99);
        assert_eq!(metrics.n_holdout, 4 * 20);
        assert!(metrics.decile_spread_daily.is_finite());
        assert!(metrics.decile_spread_annualized.is_finite());
    }

    assert_eq!(run.dropped_attention, 0);
    assert_eq!(run.dropped_prices, 0);
    // One row per (date, ticker) price bar
    assert_eq!(run.table.len(), 4 * 120);
}

#[test]
fn snapshot_preserves_absent_attention_for_uncovered_ticker() {
    let n_days = 120;
    let pipeline = NowcastPipeline::new(test_config()).unwrap();
    let run = pipeline
        .run(
            &synthetic_buzz(n_days),
            &synthetic_prices(n_days),
            start_date(),
            start_date() + Days::new(n_days - 1),
        )
        .unwrap();

    let day = start_date() + Days::new(60);
    let snapshot = run.snapshot(day, day);
    assert_eq!(snapshot.len(), 4);

    for row in snapshot {
        if row.ticker == "TSLA" {
            assert!(row.feature("mentions").is_absent());
            assert!(row.feature("avg_sentiment").is_absent());
        } else {
            assert!(!row.feature("mentions").is_absent());
        }
        // Price-derived features are present for everyone by day 60
        assert!(!row.feature("r1").is_absent());
        assert!(!row.feature("vol20").is_absent());
    }
}

#[test]
fn repeated_runs_are_reproducible() {
    let n_days = 120;
    let buzz = synthetic_buzz(n_days);
    let prices = synthetic_prices(n_days);
    let end = start_date() + Days::new(n_days - 1);

    let pipeline = NowcastPipeline::new(test_config()).unwrap();
    let first = pipeline.run(&buzz, &prices, start_date(), end).unwrap();
    let second = pipeline.run(&buzz, &prices, start_date(), end).unwrap();

    for (a, b) in first.metrics.iter().zip(&second.metrics) {
        assert_eq!(a.model_name, b.model_name);
        assert_eq!(a.holdout_accuracy.to_bits(), b.holdout_accuracy.to_bits());
        assert_eq!(
            a.decile_spread_daily.to_bits(),
            b.decile_spread_daily.to_bits()
        );
    }
}

#[test]
fn malformed_records_are_counted_not_fatal() {
    let n_days = 120;
    let mut buzz = synthetic_buzz(n_days);
    buzz.push(RawAttentionRecord {
        date: "someday".to_string(),
        ticker: "AAPL".to_string(),
        mentions: 1.0,
        avg_sentiment: 0.0,
        sources: String::new(),
    });
    let mut prices = synthetic_prices(n_days);
    prices.push(RawPriceRecord {
        date: date_string(5),
        ticker: "".to_string(),
        open: 1.0,
        high: 1.0,
        low: 1.0,
        close: 1.0,
        volume: 0.0,
        indicators: BTreeMap::new(),
    });

    let pipeline = NowcastPipeline::new(test_config()).unwrap();
    let run = pipeline
        .run(&buzz, &prices, start_date(), start_date() + Days::new(n_days - 1))
        .unwrap();

    assert_eq!(run.dropped_attention, 1);
    assert_eq!(run.dropped_prices, 1);
    assert_eq!(run.metrics.len(), 2);
}

#[test]
fn monotone_market_fails_training_with_single_class() {
    let n_days = 120;
    // Strictly rising closes: every forward return is positive
    let prices: Vec<RawPriceRecord> = synthetic_prices(n_days)
        .into_iter()
        .enumerate()
        .map(|(i, mut bar)| {
            bar.close = 100.0 + i as f64;
            bar.open = bar.close;
            bar.high = bar.close;
            bar.low = bar.close;
            bar
        })
        .collect();

    let pipeline = NowcastPipeline::new(test_config()).unwrap();
    let err = pipeline
        .run(
            &[],
            &prices,
            start_date(),
            start_date() + Days::new(n_days - 1),
        )
        .expect_err("single-class labels cannot train");
    assert_eq!(err.kind(), "training");
}

#[test]
fn too_narrow_range_fails_split() {
    let n_days = 120;
    let pipeline = NowcastPipeline::new(test_config()).unwrap();
    let err = pipeline
        .run(
            &synthetic_buzz(n_days),
            &synthetic_prices(n_days),
            start_date(),
            start_date() + Days::new(10),
        )
        .expect_err("11 dates cannot satisfy the split floor");
    assert_eq!(err.kind(), "insufficient_data");
}
