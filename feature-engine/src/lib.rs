// Feature Engine (Layer 2)
// Merges per-source signal vectors into the keyed feature table, derives
// causal price indicators, and assigns forward-return labels

pub mod builder;
pub mod history;
pub mod indicators;
pub mod labels;

pub use builder::{
    schema_columns, FeatureConfig, FeatureTable, FeatureTableBuilder, SCHEMA_COLUMNS,
    SCHEMA_VERSION,
};
pub use history::PriceHistory;
pub use labels::{
    LabelAssigner, LabelConfig, DEFAULT_FORWARD_HORIZON_DAYS, DEFAULT_LABEL_THRESHOLD,
};
