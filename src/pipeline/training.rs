//! Training orchestration: raw dataset -> fitted bundle

use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::{info, warn};

use super::bundle::ScoringBundle;
use super::classifier::{SoftmaxClassifier, TrainerConfig, TrainingStats};
use super::encoder::MultiValueEncoder;
use super::target::encode_target;

/// What happened during a training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub rows: usize,
    pub dropped_null_targets: usize,
    pub input_columns: usize,
    pub encoded_columns: usize,
    pub dense_features: usize,
    pub class_labels: Vec<String>,
    pub class_counts: Vec<usize>,
    pub training_accuracy: f64,
    pub stats: TrainingStats,
}

/// Fit the encoder and classifier on `df` and package them into a bundle.
///
/// Rows with a null target are dropped. Every other column is a feature.
pub fn train_bundle(
    df: &DataFrame,
    target: &str,
    encoder: &MultiValueEncoder,
    config: &TrainerConfig,
) -> Result<(ScoringBundle, TrainingReport)> {
    let target_col = df
        .column(target)
        .with_context(|| format!("Target column '{}' not found", target))?;

    let dropped_null_targets = target_col.null_count();
    let df = if dropped_null_targets > 0 {
        warn!(
            rows = dropped_null_targets,
            column = target,
            "Dropping rows with a null target"
        );
        let mask = target_col.is_not_null();
        df.filter(&mask)?
    } else {
        df.clone()
    };

    let encoding = encode_target(&df, target)?;
    let features = df.drop(target)?;
    let input_columns = features.width();

    let (fitted, encoded) = encoder
        .fit_transform(&features)
        .context("Failed to fit the multi-value encoder")?;

    let classifier = SoftmaxClassifier::fit(&encoded, &encoding.codes, encoding.n_classes(), config)
        .context("Failed to train the classifier")?;

    let predictions = classifier.predict(&encoded)?;
    let correct = predictions
        .iter()
        .zip(&encoding.codes)
        .filter(|(p, &y)| **p == y as usize)
        .count();
    let training_accuracy = correct as f64 / predictions.len().max(1) as f64;

    let report = TrainingReport {
        rows: encoded.height(),
        dropped_null_targets,
        input_columns,
        encoded_columns: encoded.width(),
        dense_features: classifier.layout().width(),
        class_labels: encoding.labels.clone(),
        class_counts: encoding.class_counts(),
        training_accuracy,
        stats: classifier.training_stats().clone(),
    };

    let bundle = ScoringBundle::new(fitted, classifier, encoding.labels)?;

    info!(
        rows = report.rows,
        accuracy = report.training_accuracy,
        "Training complete"
    );

    Ok((bundle, report))
}
