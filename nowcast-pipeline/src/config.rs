//! Run configuration
//!
//! One TOML-backed config object covers the whole run: feature windows,
//! label horizon, split policy, model selection and seeds, and the
//! optional wall-clock budget. Every field has a serde default so a
//! partial file (or none at all) yields the documented baseline run.

use evaluation::SplitConfig;
use feature_engine::{FeatureConfig, LabelConfig};
use nowcast_model::{ModelConfig, ModelKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NowcastConfig {
    /// Model variants to fit and evaluate, in order
    #[serde(default = "default_models")]
    pub models: Vec<ModelKind>,

    /// Wall-clock budget for the whole run, in seconds; absent means
    /// unbounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_secs: Option<u64>,

    #[serde(default)]
    pub features: FeatureConfig,

    #[serde(default)]
    pub labels: LabelConfig,

    #[serde(default)]
    pub split: SplitConfig,

    #[serde(default)]
    pub model: ModelConfig,
}

impl Default for NowcastConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
            budget_secs: None,
            features: FeatureConfig::default(),
            labels: LabelConfig::default(),
            split: SplitConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

fn default_models() -> Vec<ModelKind> {
    vec![ModelKind::Linear, ModelKind::TreeEnsemble]
}

impl NowcastConfig {
    /// Reject configurations that cannot produce a valid run.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.models.is_empty() {
            anyhow::bail!("at least one model variant must be configured");
        }
        if self.labels.horizon_days == 0 {
            anyhow::bail!("label horizon must be at least 1 trading day");
        }
        if self.split.min_rows == 0 {
            anyhow::bail!("split minimum rows must be positive");
        }
        if let Some(0) = self.budget_secs {
            anyhow::bail!("run budget must be positive when set");
        }
        Ok(())
    }
}

/// Load configuration from a TOML file.
pub fn load_config(path: &str) -> anyhow::Result<NowcastConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: NowcastConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to a TOML file.
pub fn save_config(config: &NowcastConfig, path: &str) -> anyhow::Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Create a default configuration file template.
pub fn create_config_template(path: &str) -> anyhow::Result<()> {
    let template = "# Buzz Nowcast Pipeline Configuration

# Model variants fitted and evaluated each run
models = [\"linear\", \"tree_ensemble\"]

# Wall-clock budget for the whole run, in seconds (unset = unbounded)
# budget_secs = 300

[features]
# Minimum prior trading days before rolling-extreme features are computable
min_lookback_days = 20

[labels]
# Forward horizon K in trading days
horizon_days = 1

# Return threshold the forward return must strictly exceed for label 1
threshold = 0.0

[split]
# Minimum rows each partition must hold
min_rows = 50

# Reserve the most recent N trading dates for holdout
[split.point]
trailing_days = 60

[model]
# Seed for every stochastic component
seed = 42

[model.logistic]
learning_rate = 0.1
max_iter = 1000
tolerance = 1e-6
l2 = 0.0

[model.forest]
n_trees = 300
max_depth = 10
min_samples_split = 5
min_samples_leaf = 2
";

    std::fs::write(path, template)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = NowcastConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.labels.horizon_days, 1);
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = NowcastConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: NowcastConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(deserialized.models, config.models);
        assert_eq!(deserialized.model.seed, config.model.seed);
        assert_eq!(deserialized.split.min_rows, config.split.min_rows);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: NowcastConfig = toml::from_str(
            "models = [\"tree_ensemble\"]\n\n[labels]\nhorizon_days = 5\n",
        )
        .unwrap();

        assert_eq!(config.models, vec![ModelKind::TreeEnsemble]);
        assert_eq!(config.labels.horizon_days, 5);
        // Untouched sections keep their defaults
        assert_eq!(config.model.seed, 42);
        assert_eq!(config.features.min_lookback_days, 20);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let mut config = NowcastConfig::default();
        config.models.clear();
        assert!(config.validate().is_err());

        let mut config = NowcastConfig::default();
        config.labels.horizon_days = 0;
        assert!(config.validate().is_err());

        let mut config = NowcastConfig::default();
        config.budget_secs = Some(0);
        assert!(config.validate().is_err());
    }
}
