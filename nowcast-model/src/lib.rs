// Nowcast Model (Layer 3)
// Fits direction classifiers on the training partition and scores holdout
// rows into ranked probabilities

pub mod forest;
pub mod imputation;
pub mod logistic;
pub mod trainer;

pub use forest::{ForestConfig, RandomForest};
pub use imputation::Imputer;
pub use logistic::{LogisticConfig, LogisticModel};
pub use trainer::{FittedNowcast, ModelConfig, ModelKind, NowcastTrainer};
