//! Multinomial logistic regression over the dense feature layout
//!
//! Features are standardized with training statistics; missing values are
//! imputed with the training mean (zero after standardization). Training is
//! full-batch gradient descent with an L2 penalty. Per-row gradients are
//! accumulated in parallel with rayon.

use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::features::FeatureLayout;

/// Scales below this are treated as constant features
const MIN_SCALE: f64 = 1e-12;

/// Floor for probabilities inside the log-loss
const PROB_FLOOR: f64 = 1e-15;

/// Errors raised while training or applying the classifier
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Column '{column}' has unsupported type {dtype} for scoring")]
    UnsupportedDtype { column: String, dtype: String },

    #[error("Encoded columns do not match the training layout (expected schema {expected}, found {found})")]
    SchemaMismatch { expected: String, found: String },

    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Got {targets} targets for {rows} rows")]
    TargetLength { rows: usize, targets: usize },

    #[error("At least two classes are required, got {0}")]
    TooFewClasses(usize),

    #[error("Class code {code} is out of range for {n_classes} classes")]
    ClassOutOfRange { code: u32, n_classes: usize },

    #[error("Invalid classifier state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Gradient descent settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainerConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub l2: f64,
    /// Stop once the loss improves by less than this between epochs
    pub tolerance: f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs: 500,
            learning_rate: 0.5,
            l2: 1e-4,
            tolerance: 1e-7,
        }
    }
}

/// Summary of a training run, stored with the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    pub rows: usize,
    pub epochs_run: usize,
    pub final_loss: f64,
    pub converged: bool,
}

/// Fitted softmax classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftmaxClassifier {
    layout: FeatureLayout,
    means: Vec<f64>,
    scales: Vec<f64>,
    /// `weights[class][feature]`
    weights: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
    training: TrainingStats,
}

/// Per-thread gradient accumulator
struct Gradient {
    weights: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
    loss: f64,
}

impl Gradient {
    fn zeros(classes: usize, features: usize) -> Self {
        Self {
            weights: vec![vec![0.0; features]; classes],
            intercepts: vec![0.0; classes],
            loss: 0.0,
        }
    }

    fn merge(mut self, other: Gradient) -> Self {
        for (mine, theirs) in self.weights.iter_mut().zip(&other.weights) {
            for (a, b) in mine.iter_mut().zip(theirs) {
                *a += b;
            }
        }
        for (a, b) in self.intercepts.iter_mut().zip(&other.intercepts) {
            *a += b;
        }
        self.loss += other.loss;
        self
    }
}

impl SoftmaxClassifier {
    /// Train on an encoded frame with one class code per row.
    pub fn fit(
        encoded: &DataFrame,
        targets: &[u32],
        n_classes: usize,
        config: &TrainerConfig,
    ) -> Result<Self, ModelError> {
        if n_classes < 2 {
            return Err(ModelError::TooFewClasses(n_classes));
        }
        if encoded.height() == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if encoded.height() != targets.len() {
            return Err(ModelError::TargetLength {
                rows: encoded.height(),
                targets: targets.len(),
            });
        }
        if let Some(&code) = targets.iter().find(|&&t| t as usize >= n_classes) {
            return Err(ModelError::ClassOutOfRange { code, n_classes });
        }

        let layout = FeatureLayout::fit(encoded)?;
        let raw = layout.rows(encoded)?;
        let (means, scales) = column_statistics(&raw, layout.width());
        let x: Vec<Vec<f64>> = raw
            .iter()
            .map(|row| standardize(row, &means, &scales))
            .collect();

        let d = layout.width();
        let n = x.len() as f64;
        let mut weights = vec![vec![0.0; d]; n_classes];
        let mut intercepts = vec![0.0; n_classes];
        let mut previous_loss = f64::INFINITY;
        let mut stats = TrainingStats {
            rows: x.len(),
            epochs_run: 0,
            final_loss: f64::NAN,
            converged: false,
        };

        for epoch in 0..config.epochs {
            let gradient = x
                .par_iter()
                .zip(targets.par_iter())
                .fold(
                    || Gradient::zeros(n_classes, d),
                    |mut g, (row, &y)| {
                        let probs = softmax(&logits(&weights, &intercepts, row));
                        let y = y as usize;
                        for (class, p) in probs.iter().enumerate() {
                            let err = p - if class == y { 1.0 } else { 0.0 };
                            g.intercepts[class] += err;
                            for (acc, xj) in g.weights[class].iter_mut().zip(row) {
                                *acc += err * xj;
                            }
                        }
                        g.loss -= probs[y].max(PROB_FLOOR).ln();
                        g
                    },
                )
                .reduce(|| Gradient::zeros(n_classes, d), Gradient::merge);

            let penalty: f64 = weights.iter().flatten().map(|w| w * w).sum::<f64>() * 0.5 * config.l2;
            let loss = gradient.loss / n + penalty;

            for class in 0..n_classes {
                for j in 0..d {
                    let step = gradient.weights[class][j] / n + config.l2 * weights[class][j];
                    weights[class][j] -= config.learning_rate * step;
                }
                intercepts[class] -= config.learning_rate * gradient.intercepts[class] / n;
            }

            stats.epochs_run = epoch + 1;
            stats.final_loss = loss;

            if epoch % 100 == 0 {
                debug!(epoch, loss, "Training progress");
            }
            if (previous_loss - loss).abs() < config.tolerance {
                stats.converged = true;
                break;
            }
            previous_loss = loss;
        }

        info!(
            rows = stats.rows,
            features = d,
            classes = n_classes,
            epochs = stats.epochs_run,
            loss = stats.final_loss,
            converged = stats.converged,
            "Classifier trained"
        );

        Ok(Self {
            layout,
            means,
            scales,
            weights,
            intercepts,
            training: stats,
        })
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    pub fn n_classes(&self) -> usize {
        self.intercepts.len()
    }

    pub fn training_stats(&self) -> &TrainingStats {
        &self.training
    }

    /// Fingerprint of the encoded schema this classifier was trained on
    pub fn input_fingerprint(&self) -> String {
        self.layout.source_fingerprint()
    }

    /// Check dimensions, e.g. after deserialization.
    pub fn validate(&self) -> Result<(), ModelError> {
        let d = self.layout.width();
        if self.intercepts.len() < 2 {
            return Err(ModelError::TooFewClasses(self.intercepts.len()));
        }
        if self.weights.len() != self.intercepts.len() {
            return Err(ModelError::InvalidState(format!(
                "{} weight rows for {} classes",
                self.weights.len(),
                self.intercepts.len()
            )));
        }
        if self.weights.iter().any(|w| w.len() != d) || self.means.len() != d || self.scales.len() != d {
            return Err(ModelError::InvalidState(format!(
                "parameter width does not match layout width {}",
                d
            )));
        }
        Ok(())
    }

    /// Class probabilities for one dense row
    pub fn predict_proba_row(&self, row: &[Option<f64>]) -> Vec<f64> {
        let x = standardize(row, &self.means, &self.scales);
        softmax(&logits(&self.weights, &self.intercepts, &x))
    }

    /// Class probabilities for every row of an encoded frame
    pub fn predict_proba(&self, encoded: &DataFrame) -> Result<Vec<Vec<f64>>, ModelError> {
        let rows = self.layout.rows(encoded)?;
        Ok(rows.par_iter().map(|row| self.predict_proba_row(row)).collect())
    }

    /// Most probable class for every row of an encoded frame
    pub fn predict(&self, encoded: &DataFrame) -> Result<Vec<usize>, ModelError> {
        Ok(self
            .predict_proba(encoded)?
            .iter()
            .map(|p| argmax(p))
            .collect())
    }
}

/// Index of the largest value; first wins on ties.
pub fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, max), (i, &v)| {
            if v > max {
                (i, v)
            } else {
                (best, max)
            }
        })
        .0
}

fn column_statistics(rows: &[Vec<Option<f64>>], width: usize) -> (Vec<f64>, Vec<f64>) {
    let mut means = vec![0.0; width];
    let mut scales = vec![1.0; width];

    for j in 0..width {
        let values: Vec<f64> = rows.iter().filter_map(|r| r[j]).collect();
        if values.is_empty() {
            continue;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        means[j] = mean;
        let std = variance.sqrt();
        if std > MIN_SCALE {
            scales[j] = std;
        }
    }

    (means, scales)
}

fn standardize(row: &[Option<f64>], means: &[f64], scales: &[f64]) -> Vec<f64> {
    row.iter()
        .zip(means.iter().zip(scales))
        .map(|(value, (mean, scale))| match value {
            Some(v) => (v - mean) / scale,
            None => 0.0,
        })
        .collect()
}

fn logits(weights: &[Vec<f64>], intercepts: &[f64], x: &[f64]) -> Vec<f64> {
    weights
        .iter()
        .zip(intercepts)
        .map(|(w, b)| b + w.iter().zip(x).map(|(wi, xi)| wi * xi).sum::<f64>())
        .collect()
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
