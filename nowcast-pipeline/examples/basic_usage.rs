//! Example run of the buzz nowcast pipeline over synthetic data

use chrono::{Days, NaiveDate};
use evaluation::{SplitConfig, SplitPoint};
use nowcast_model::{ForestConfig, ModelConfig};
use nowcast_pipeline::{NowcastConfig, NowcastPipeline};
use signal_ingest::{RawAttentionRecord, RawPriceRecord};
use std::collections::BTreeMap;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    println!("=== Buzz Nowcast Pipeline Example ===\n");

    // Synthetic collector output: 3 tickers, 150 trading days
    let tickers = ["AAPL", "MSFT", "NVDA"];
    let start = NaiveDate::from_ymd_opt(2025, 1, 1)
        .ok_or_else(|| anyhow::anyhow!("bad start date"))?;
    let n_days = 150u64;

    let mut prices = Vec::new();
    let mut buzz = Vec::new();
    for (t, ticker) in tickers.iter().enumerate() {
        for i in 0..n_days {
            let date = (start + Days::new(i)).format("%Y-%m-%d").to_string();
            let close =
                (120.0 + t as f64 * 40.0) * (1.0 + (i as f64 * 0.6 + t as f64).sin() * 0.03);
            prices.push(RawPriceRecord {
                date: date.clone(),
                ticker: ticker.to_string(),
                open: close * 0.995,
                high: close * 1.008,
                low: close * 0.991,
                close,
                volume: 2_000_000.0,
                indicators: BTreeMap::new(),
            });
            buzz.push(RawAttentionRecord {
                date,
                ticker: ticker.to_string(),
                mentions: 1.0 + ((i * (t as u64 + 3)) % 9) as f64,
                avg_sentiment: (i as f64 * 0.4).sin() * 0.5,
                sources: "wsj;yahoo;reddit-stocks".to_string(),
            });
        }
    }

    // A lighter forest keeps the example quick
    let config = NowcastConfig {
        split: SplitConfig {
            min_rows: 50,
            point: SplitPoint::TrailingDays(30),
        },
        model: ModelConfig {
            forest: ForestConfig {
                n_trees: 50,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    };

    let pipeline = NowcastPipeline::new(config)?;
    let run = pipeline.run(&buzz, &prices, start, start + Days::new(n_days - 1))?;

    println!(
        "Feature table: {} rows ({} attention dropped, {} prices dropped)\n",
        run.table.len(),
        run.dropped_attention,
        run.dropped_prices
    );

    for metrics in &run.metrics {
        println!("== {} ==", metrics.model_name);
        println!(
            "Holdout accuracy: {:.3} (baseline {:.3})",
            metrics.holdout_accuracy, metrics.baseline_accuracy
        );
        println!(
            "Top-bottom decile daily spread: {:.4}%",
            metrics.decile_spread_daily * 100.0
        );
        println!(
            "Top-bottom decile annualized:   {:.2}%",
            metrics.decile_spread_annualized * 100.0
        );
        println!(
            "Rows: {} train / {} holdout\n",
            metrics.n_train, metrics.n_holdout
        );
    }

    Ok(())
}
