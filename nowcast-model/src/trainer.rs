//! Trainer/Scorer facade
//!
//! Model variants form a fixed, enumerated set selected by configuration.
//! Each fitted model carries its imputer and column list, so a scorer is
//! self-contained: hand it a feature vector with absent markers and it
//! returns a probability.

use crate::forest::{ForestConfig, RandomForest};
use crate::imputation::Imputer;
use crate::logistic::{LogisticConfig, LogisticModel};
use common::{ModelFrame, NowcastError, PredictionRow};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

/// The enumerated classifier variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Linear,
    TreeEnsemble,
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Linear => "logistic_regression",
            ModelKind::TreeEnsemble => "random_forest",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Seed for every stochastic component, for reproducible runs
    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default)]
    pub logistic: LogisticConfig,

    #[serde(default)]
    pub forest: ForestConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            logistic: LogisticConfig::default(),
            forest: ForestConfig::default(),
        }
    }
}

fn default_seed() -> u64 {
    42
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum FittedModel {
    Linear(LogisticModel),
    TreeEnsemble(RandomForest),
}

/// A fitted scorer: imputation rule + column order + model weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedNowcast {
    kind: ModelKind,
    columns: Vec<String>,
    imputer: Imputer,
    model: FittedModel,
}

impl FittedNowcast {
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn model_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Probability of the positive label for one feature vector, given in
    /// the fitted column order with absent markers intact.
    pub fn score(&self, features: &[Option<f64>]) -> f64 {
        let dense = self.imputer.transform_row(features);
        let probability = match &self.model {
            FittedModel::Linear(model) => model.score_one(&dense),
            FittedModel::TreeEnsemble(forest) => forest.score_one(&dense),
        };
        probability.clamp(0.0, 1.0)
    }

    /// Score every row of a holdout frame into prediction rows.
    pub fn score_frame(&self, frame: &ModelFrame) -> Vec<PredictionRow> {
        debug_assert_eq!(frame.columns, self.columns, "column order mismatch");
        frame
            .keys
            .iter()
            .enumerate()
            .map(|(i, key)| PredictionRow {
                date: key.date,
                ticker: key.ticker.clone(),
                probability: self.score(&frame.features[i]),
                label: frame.labels[i],
                realized_forward_return: frame.forward_returns[i],
            })
            .collect()
    }

    /// Split-gain importance per column, for the tree ensemble only.
    pub fn feature_importances(&self) -> Option<Vec<(String, f64)>> {
        match &self.model {
            FittedModel::TreeEnsemble(forest) => {
                let mut ranking: Vec<(String, f64)> = self
                    .columns
                    .iter()
                    .cloned()
                    .zip(forest.feature_importances().iter().copied())
                    .collect();
                ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
                Some(ranking)
            }
            FittedModel::Linear(_) => None,
        }
    }
}

/// Fits the configured model variants on a training frame.
#[derive(Debug, Clone, Default)]
pub struct NowcastTrainer {
    config: ModelConfig,
}

impl NowcastTrainer {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    /// Fit one variant on the training partition. Fails with a training
    /// error when the labels contain a single class, since no binary
    /// decision boundary exists to fit.
    pub fn train(&self, kind: ModelKind, train: &ModelFrame) -> Result<FittedNowcast, NowcastError> {
        if train.is_empty() {
            return Err(NowcastError::Training("empty training frame".to_string()));
        }

        let positives = train.labels.iter().filter(|&&l| l).count();
        if positives == 0 || positives == train.n_rows() {
            return Err(NowcastError::Training(format!(
                "single-class training set ({positives} of {} rows positive)",
                train.n_rows()
            )));
        }

        let imputer = Imputer::fit(train);
        let dense = imputer.transform_frame(train);
        let labels: Vec<f64> = train.labels.iter().map(|&l| f64::from(u8::from(l))).collect();

        let model = match kind {
            ModelKind::Linear => {
                let n_rows = dense.len();
                let n_columns = train.n_columns();
                let flat: Vec<f64> = dense.into_iter().flatten().collect();
                let x = Array2::from_shape_vec((n_rows, n_columns), flat).map_err(|e| {
                    NowcastError::Training(format!("malformed design matrix: {e}"))
                })?;
                let y = Array1::from_vec(labels);
                FittedModel::Linear(LogisticModel::fit(&x, &y, &self.config.logistic))
            }
            ModelKind::TreeEnsemble => FittedModel::TreeEnsemble(RandomForest::fit(
                &dense,
                &labels,
                &self.config.forest,
                self.config.seed,
            )),
        };

        info!(
            model = kind.name(),
            n_train = train.n_rows(),
            positives,
            "model fitted"
        );

        Ok(FittedNowcast {
            kind,
            columns: train.columns.clone(),
            imputer,
            model,
        })
    }
}
