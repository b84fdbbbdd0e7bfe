//! Random-forest direction classifier
//!
//! Bagged CART trees with gini splits and √d feature subsampling. All
//! randomness flows from one explicit seed (tree i draws from seed + i),
//! so identical inputs and seed reproduce identical probabilities. Trees
//! are independent and fitted in parallel; their order in the ensemble is
//! fixed by index, keeping the fit deterministic regardless of scheduling.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` means √d
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_features: Option<usize>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            max_features: None,
        }
    }
}

fn default_n_trees() -> usize {
    300
}

fn default_max_depth() -> usize {
    10
}

fn default_min_samples_split() -> usize {
    5
}

fn default_min_samples_leaf() -> usize {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        positive_fraction: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn score(&self, features: &[f64]) -> f64 {
        match self {
            Node::Leaf { positive_fraction } => *positive_fraction,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if features[*feature] <= *threshold {
                    left.score(features)
                } else {
                    right.score(features)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Tree {
    root: Node,
    /// Split-gain mass per feature, unnormalized
    importances: Vec<f64>,
}

/// Fitted forest classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<Tree>,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    /// Fit on a dense matrix and binary labels, seeding every tree from
    /// `seed + tree_index`.
    pub fn fit(x: &[Vec<f64>], y: &[f64], config: &ForestConfig, seed: u64) -> Self {
        if x.is_empty() {
            return Self {
                config: config.clone(),
                trees: Vec::new(),
                feature_importances: Vec::new(),
            };
        }
        let n_features = x.first().map(Vec::len).unwrap_or(0);
        let max_features = config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize)
            .clamp(1, n_features.max(1));

        let trees: Vec<Tree> = (0..config.n_trees)
            .into_par_iter()
            .map(|tree_index| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(tree_index as u64));
                let indices: Vec<usize> =
                    (0..x.len()).map(|_| rng.gen_range(0..x.len())).collect();
                let mut importances = vec![0.0; n_features];
                let root = build_node(x, y, &indices, 0, config, max_features, &mut rng,
                    &mut importances);
                Tree { root, importances }
            })
            .collect();

        // Aggregate and normalize split-gain importances
        let mut feature_importances = vec![0.0; n_features];
        for tree in &trees {
            for (total, tree_mass) in feature_importances.iter_mut().zip(&tree.importances) {
                *total += tree_mass;
            }
        }
        let mass: f64 = feature_importances.iter().sum();
        if mass > 0.0 {
            for importance in &mut feature_importances {
                *importance /= mass;
            }
        }

        debug!(trees = trees.len(), max_features, "forest fitted");
        Self {
            config: config.clone(),
            trees,
            feature_importances,
        }
    }

    /// Probability of the positive label: mean of leaf positive-class
    /// frequencies across trees.
    pub fn score_one(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let total: f64 = self.trees.iter().map(|t| t.root.score(features)).sum();
        total / self.trees.len() as f64
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Normalized split-gain importance per feature column.
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }
}

fn gini(labels: &[f64]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let p = labels.iter().filter(|&&l| l > 0.5).count() as f64 / labels.len() as f64;
    2.0 * p * (1.0 - p)
}

fn positive_fraction(labels: &[f64]) -> f64 {
    if labels.is_empty() {
        return 0.5;
    }
    labels.iter().filter(|&&l| l > 0.5).count() as f64 / labels.len() as f64
}

#[allow(clippy::too_many_arguments)]
fn build_node(
    x: &[Vec<f64>],
    y: &[f64],
    indices: &[usize],
    depth: usize,
    config: &ForestConfig,
    max_features: usize,
    rng: &mut ChaCha8Rng,
    importances: &mut [f64],
) -> Node {
    let labels: Vec<f64> = indices.iter().map(|&i| y[i]).collect();
    let impurity = gini(&labels);

    if depth >= config.max_depth
        || indices.len() < config.min_samples_split
        || impurity < 1e-10
    {
        return Node::Leaf {
            positive_fraction: positive_fraction(&labels),
        };
    }

    match find_best_split(x, y, indices, max_features, rng, impurity) {
        Some(split) if split.left.len() >= config.min_samples_leaf
            && split.right.len() >= config.min_samples_leaf =>
        {
            importances[split.feature] += split.gain * indices.len() as f64;

            let left = build_node(x, y, &split.left, depth + 1, config, max_features, rng,
                importances);
            let right = build_node(x, y, &split.right, depth + 1, config, max_features, rng,
                importances);

            Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: Box::new(left),
                right: Box::new(right),
            }
        }
        _ => Node::Leaf {
            positive_fraction: positive_fraction(&labels),
        },
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

fn find_best_split(
    x: &[Vec<f64>],
    y: &[f64],
    indices: &[usize],
    max_features: usize,
    rng: &mut ChaCha8Rng,
    parent_impurity: f64,
) -> Option<BestSplit> {
    let n_features = x.first().map(Vec::len).unwrap_or(0);
    let mut candidates: Vec<usize> = (0..n_features).collect();
    candidates.shuffle(rng);
    candidates.truncate(max_features);
    // Shuffled order would make tie-broken splits depend on the draw;
    // scanning features in index order keeps the chosen split stable.
    candidates.sort_unstable();

    let mut best: Option<BestSplit> = None;

    for feature in candidates {
        let mut values: Vec<f64> = indices.iter().map(|&i| x[i][feature]).collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup();

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| x[i][feature] <= threshold);

            if left.is_empty() || right.is_empty() {
                continue;
            }

            let left_labels: Vec<f64> = left.iter().map(|&i| y[i]).collect();
            let right_labels: Vec<f64> = right.iter().map(|&i| y[i]).collect();
            let n = indices.len() as f64;
            let weighted = (left.len() as f64 * gini(&left_labels)
                + right.len() as f64 * gini(&right_labels))
                / n;
            let gain = parent_impurity - weighted;

            if gain > best.as_ref().map(|b| b.gain).unwrap_or(0.0) {
                best = Some(BestSplit {
                    feature,
                    threshold,
                    gain,
                    left,
                    right,
                });
            }
        }
    }

    best
}
