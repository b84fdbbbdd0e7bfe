//! Logistic regression direction classifier
//!
//! Gradient-descent fit with optional L2 shrinkage. Columns are z-scored
//! with statistics from the training partition; the scaler travels with
//! the fitted model so scoring applies identical transforms.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticConfig {
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// L2 penalty weight; 0 disables regularization
    #[serde(default)]
    pub l2: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            max_iter: default_max_iter(),
            tolerance: default_tolerance(),
            l2: 0.0,
        }
    }
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_max_iter() -> usize {
    1000
}

fn default_tolerance() -> f64 {
    1e-6
}

/// Fitted linear model: weights and bias in z-scored feature space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    weights: Vec<f64>,
    bias: f64,
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl LogisticModel {
    /// Fit by batch gradient descent on log loss.
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, config: &LogisticConfig) -> Self {
        let n_samples = x.nrows() as f64;
        let n_features = x.ncols();

        // Column statistics from the training partition only
        let means = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(n_features));
        let stds = x
            .axis_iter(Axis(1))
            .zip(means.iter())
            .map(|(column, mean)| {
                let variance =
                    column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n_samples;
                let std = variance.sqrt();
                if std > 1e-12 {
                    std
                } else {
                    1.0
                }
            })
            .collect::<Array1<f64>>();

        let z = standardize(x, &means, &stds);

        let mut weights = Array1::<f64>::zeros(n_features);
        let mut bias = 0.0;
        let mut previous_cost = f64::INFINITY;

        for iteration in 0..config.max_iter {
            let linear = z.dot(&weights) + bias;
            let predictions = linear.mapv(sigmoid);
            let errors = &predictions - y;

            let mut gradient = z.t().dot(&errors) / n_samples;
            if config.l2 > 0.0 {
                gradient = &gradient + &(&weights * config.l2);
            }
            let bias_gradient = errors.sum() / n_samples;

            weights = &weights - &(&gradient * config.learning_rate);
            bias -= config.learning_rate * bias_gradient;

            let cost = log_loss(y, &predictions);
            if (previous_cost - cost).abs() < config.tolerance {
                debug!(iteration, cost, "logistic fit converged");
                break;
            }
            previous_cost = cost;
        }

        Self {
            weights: weights.to_vec(),
            bias,
            means: means.to_vec(),
            stds: stds.to_vec(),
        }
    }

    /// Probability of the positive label for one feature vector.
    pub fn score_one(&self, features: &[f64]) -> f64 {
        let linear: f64 = features
            .iter()
            .zip(&self.means)
            .zip(&self.stds)
            .zip(&self.weights)
            .map(|(((value, mean), std), weight)| (value - mean) / std * weight)
            .sum::<f64>()
            + self.bias;
        sigmoid(linear)
    }
}

fn standardize(x: &Array2<f64>, means: &Array1<f64>, stds: &Array1<f64>) -> Array2<f64> {
    let mut z = x.clone();
    for mut row in z.axis_iter_mut(Axis(0)) {
        for (j, value) in row.iter_mut().enumerate() {
            *value = (*value - means[j]) / stds[j];
        }
    }
    z
}

/// Numerically stable sigmoid.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn log_loss(y: &Array1<f64>, p: &Array1<f64>) -> f64 {
    let eps = 1e-15;
    let n = y.len() as f64;
    -y.iter()
        .zip(p.iter())
        .map(|(&y, &p)| {
            let p = p.clamp(eps, 1.0 - eps);
            y * p.ln() + (1.0 - y) * (1.0 - p).ln()
        })
        .sum::<f64>()
        / n
}
