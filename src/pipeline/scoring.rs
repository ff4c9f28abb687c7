//! Scoring invocation: raw record -> encoder -> classifier -> prediction
//!
//! A [`Scorer`] is immutable and `Send + Sync`. A process normally loads
//! one bundle at startup through [`init`] and reads it via [`global`].

use std::path::Path;
use std::sync::OnceLock;

use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::bundle::{BundleError, ScoringBundle};
use super::classifier::{argmax, ModelError};
use super::encoder::EncoderError;
use super::input::{InputError, InputSchema};
use super::record::{records_to_frame, RawRecord, RecordError};

static SCORER: OnceLock<Scorer> = OnceLock::new();

/// Errors raised while scoring a request
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Encoder(#[from] EncoderError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error("Classifier returned class {0} which has no label")]
    UnknownClass(usize),

    #[error("Scorer is already initialized")]
    AlreadyInitialized,

    #[error("Scorer is not initialized")]
    NotInitialized,
}

/// Coarse risk tier attached to a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Unknown,
}

impl RiskTier {
    pub fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "good" => RiskTier::Low,
            "standard" => RiskTier::Medium,
            "poor" => RiskTier::High,
            _ => RiskTier::Unknown,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low risk of defaulting",
            RiskTier::Medium => "Medium risk of defaulting",
            RiskTier::High => "High risk of defaulting",
            RiskTier::Unknown => "No risk tier for this class",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::Low => write!(f, "low"),
            RiskTier::Medium => write!(f, "medium"),
            RiskTier::High => write!(f, "high"),
            RiskTier::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassProbability {
    pub class_code: usize,
    pub label: String,
    pub probability: f64,
}

/// Result of scoring one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub class_code: usize,
    pub label: String,
    pub risk: RiskTier,
    pub probabilities: Vec<ClassProbability>,
}

impl Prediction {
    fn from_probabilities(probabilities: &[f64], labels: &[String]) -> Result<Self, ScoringError> {
        let class_code = argmax(probabilities);
        let label = labels
            .get(class_code)
            .cloned()
            .ok_or(ScoringError::UnknownClass(class_code))?;

        Ok(Self {
            class_code,
            risk: RiskTier::from_label(&label),
            label,
            probabilities: probabilities
                .iter()
                .zip(labels)
                .enumerate()
                .map(|(code, (&probability, label))| ClassProbability {
                    class_code: code,
                    label: label.clone(),
                    probability,
                })
                .collect(),
        })
    }

    /// Probability of the predicted class
    pub fn confidence(&self) -> f64 {
        self.probabilities
            .get(self.class_code)
            .map(|p| p.probability)
            .unwrap_or(0.0)
    }
}

/// Scores raw records against a loaded bundle
#[derive(Debug, Clone)]
pub struct Scorer {
    bundle: ScoringBundle,
    input_schema: Option<InputSchema>,
}

impl Scorer {
    pub fn new(bundle: ScoringBundle) -> Self {
        Self {
            bundle,
            input_schema: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        Ok(Self::new(ScoringBundle::load(path)?))
    }

    /// Validate every record against `schema` before encoding.
    pub fn with_input_schema(mut self, schema: InputSchema) -> Self {
        self.input_schema = Some(schema);
        self
    }

    pub fn bundle(&self) -> &ScoringBundle {
        &self.bundle
    }

    pub fn score_record(&self, record: &RawRecord) -> Result<Prediction, ScoringError> {
        if let Some(schema) = &self.input_schema {
            schema.validate(record)?;
        }
        let frame = records_to_frame(std::slice::from_ref(record))?;
        let mut predictions = self.predict_frame(&frame)?;
        predictions.pop().ok_or(ScoringError::Record(RecordError::Empty))
    }

    /// Score records in parallel. One failing record does not affect the others.
    pub fn score_records(&self, records: &[RawRecord]) -> Vec<Result<Prediction, ScoringError>> {
        records
            .par_iter()
            .map(|record| self.score_record(record))
            .collect()
    }

    /// Score every row of a raw DataFrame.
    ///
    /// The input schema is not applied here; the frame goes straight to the
    /// encoder.
    pub fn score_frame(&self, df: &DataFrame) -> Result<Vec<Prediction>, ScoringError> {
        self.predict_frame(df)
    }

    fn predict_frame(&self, df: &DataFrame) -> Result<Vec<Prediction>, ScoringError> {
        let encoded = self.bundle.encoder.transform(df)?;
        debug!(rows = encoded.height(), width = encoded.width(), "Scoring encoded rows");
        let probabilities = self.bundle.classifier.predict_proba(&encoded)?;
        probabilities
            .iter()
            .map(|p| Prediction::from_probabilities(p, &self.bundle.class_labels))
            .collect()
    }
}

/// Load the bundle at `path` into the process-wide scorer.
///
/// Fails if a scorer is already installed.
pub fn init(path: &Path) -> Result<&'static Scorer, ScoringError> {
    if SCORER.get().is_some() {
        return Err(ScoringError::AlreadyInitialized);
    }
    install(Scorer::load(path)?)
}

/// Install an already-built scorer as the process-wide scorer.
pub fn install(scorer: Scorer) -> Result<&'static Scorer, ScoringError> {
    SCORER
        .set(scorer)
        .map_err(|_| ScoringError::AlreadyInitialized)?;
    global()
}

/// The process-wide scorer
pub fn global() -> Result<&'static Scorer, ScoringError> {
    SCORER.get().ok_or(ScoringError::NotInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_tier_from_label() {
        assert_eq!(RiskTier::from_label("good"), RiskTier::Low);
        assert_eq!(RiskTier::from_label("Standard"), RiskTier::Medium);
        assert_eq!(RiskTier::from_label("poor"), RiskTier::High);
        assert_eq!(RiskTier::from_label("7"), RiskTier::Unknown);
        assert_eq!(RiskTier::High.message(), "High risk of defaulting");
    }

    #[test]
    fn test_prediction_from_probabilities() {
        let labels = vec!["good".to_string(), "poor".to_string(), "standard".to_string()];
        let prediction = Prediction::from_probabilities(&[0.1, 0.7, 0.2], &labels).unwrap();

        assert_eq!(prediction.class_code, 1);
        assert_eq!(prediction.label, "poor");
        assert_eq!(prediction.risk, RiskTier::High);
        assert!((prediction.confidence() - 0.7).abs() < 1e-12);
        assert_eq!(prediction.probabilities[2].label, "standard");
    }

    #[test]
    fn test_prediction_unknown_class() {
        let labels = vec!["good".to_string()];
        assert!(matches!(
            Prediction::from_probabilities(&[0.1, 0.9], &labels),
            Err(ScoringError::UnknownClass(1))
        ));
    }
}
