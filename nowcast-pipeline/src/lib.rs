//! Buzz Nowcast Pipeline
//!
//! Orchestrates one batch run over already-fetched collector records:
//! normalize per-source signals, merge them into the keyed feature table,
//! assign forward-return labels, split by time, fit each configured model
//! variant, and score the ranked holdout predictions into per-run
//! metrics.
//!
//! The run is all-or-nothing: an exceeded budget or any fatal stage error
//! aborts before metrics are emitted.

mod config;

pub use config::{create_config_template, load_config, save_config, NowcastConfig};

use chrono::NaiveDate;
use common::{FeatureRow, NowcastError, RunMetrics, SignalKey};
use evaluation::{DecileEvaluator, TemporalSplitter};
use feature_engine::{FeatureTable, FeatureTableBuilder, LabelAssigner, PriceHistory};
use nowcast_model::NowcastTrainer;
use signal_ingest::{
    normalize_batch, parse_price_batch, AttentionSource, NormalizeOutcome, PriceSource,
    RawAttentionRecord, RawPriceRecord,
};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Output of one successful run.
#[derive(Debug, Clone)]
pub struct NowcastRun {
    /// One metrics object per configured model variant, in order
    pub metrics: Vec<RunMetrics>,
    /// The finalized feature table
    pub table: FeatureTable,
    /// Malformed attention records dropped during normalization
    pub dropped_attention: usize,
    /// Malformed price records dropped during normalization
    pub dropped_prices: usize,
}

impl NowcastRun {
    /// Read-only snapshot of the feature rows in an inclusive date range,
    /// for downstream report consumers.
    pub fn snapshot(&self, start: NaiveDate, end: NaiveDate) -> Vec<&FeatureRow> {
        self.table.range(start, end).collect()
    }
}

/// Run-wide wall-clock budget, polled between stages.
struct RunBudget {
    deadline: Option<Instant>,
    budget: Duration,
}

impl RunBudget {
    fn start(budget_secs: Option<u64>) -> Self {
        match budget_secs {
            Some(secs) => {
                let budget = Duration::from_secs(secs);
                Self {
                    deadline: Instant::now().checked_add(budget),
                    budget,
                }
            }
            None => Self {
                deadline: None,
                budget: Duration::ZERO,
            },
        }
    }

    fn check(&self, stage: &'static str) -> Result<(), NowcastError> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(NowcastError::Timeout {
                    stage,
                    budget: self.budget,
                });
            }
        }
        Ok(())
    }
}

/// The daily nowcast batch pipeline.
pub struct NowcastPipeline {
    config: NowcastConfig,
}

impl NowcastPipeline {
    /// Create a pipeline with a validated configuration.
    pub fn new(config: NowcastConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &NowcastConfig {
        &self.config
    }

    /// Execute one batch run over in-memory collector records, producing
    /// rows for the inclusive `[start, end]` date range.
    pub fn run(
        &self,
        attention: &[RawAttentionRecord],
        prices: &[RawPriceRecord],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<NowcastRun, NowcastError> {
        let budget = RunBudget::start(self.config.budget_secs);

        budget.check("normalize")?;
        let attention_outcome = normalize_batch(&AttentionSource::new(), attention);
        let price_batch = parse_price_batch(prices);
        let dropped_attention = attention_outcome.dropped;
        let dropped_prices = price_batch.dropped;

        let price_source = PriceSource::new();
        let mut price_vectors = BTreeMap::new();
        for record in &price_batch.records {
            price_vectors.insert(
                SignalKey::new(record.date, record.ticker.clone()),
                price_source.vector(record),
            );
        }
        let price_outcome = NormalizeOutcome {
            source_name: "market",
            vectors: price_vectors,
            dropped: price_batch.dropped,
        };
        let history = PriceHistory::from_records(price_batch.records);

        budget.check("build_features")?;
        let builder = FeatureTableBuilder::new(self.config.features.clone());
        let mut table = builder.build(&[price_outcome, attention_outcome], &history, start, end);

        budget.check("assign_labels")?;
        let assigner = LabelAssigner::new(self.config.labels.clone());
        assigner.assign(&mut table, &history);

        budget.check("split")?;
        let frame = table.to_frame();
        let splitter = TemporalSplitter::new(self.config.split.clone());
        let (train, holdout) = splitter.split(&frame)?;

        let trainer = NowcastTrainer::new(self.config.model.clone());
        let evaluator = DecileEvaluator::new(self.config.labels.horizon_days);
        let mut metrics = Vec::with_capacity(self.config.models.len());

        for kind in &self.config.models {
            budget.check("train_and_score")?;
            let fitted = trainer.train(*kind, &train)?;
            if let Some(ranking) = fitted.feature_importances() {
                debug!(
                    model = fitted.model_name(),
                    top = ?ranking.first(),
                    "feature importance ranking"
                );
            }
            let predictions = fitted.score_frame(&holdout);
            metrics.push(evaluator.evaluate(fitted.model_name(), &predictions, train.n_rows()));
        }

        budget.check("finalize")?;
        info!(
            models = metrics.len(),
            rows = table.len(),
            dropped_attention,
            dropped_prices,
            "nowcast run complete"
        );

        Ok(NowcastRun {
            metrics,
            table,
            dropped_attention,
            dropped_prices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_budget_reports_timeout() {
        let budget = RunBudget {
            deadline: Instant::now().checked_sub(Duration::from_millis(1)),
            budget: Duration::from_secs(30),
        };
        let err = budget.check("train_and_score").expect_err("deadline passed");
        assert_eq!(err.kind(), "timeout");
        assert!(err.to_string().contains("train_and_score"));
    }

    #[test]
    fn test_unbounded_budget_never_times_out() {
        let budget = RunBudget::start(None);
        assert!(budget.check("normalize").is_ok());
    }
}
