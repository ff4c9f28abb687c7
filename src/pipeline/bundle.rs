//! Persisted scoring artifact: fitted encoder + classifier + class labels
//!
//! The bundle is a single JSON document. At load time the stored schema
//! fingerprint, the encoder's recomputed fingerprint and the classifier's
//! input fingerprint must all agree.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::classifier::{ModelError, SoftmaxClassifier};
use super::encoder::{EncoderError, FittedEncoder};
use super::fingerprint::short_fingerprint;

/// Current on-disk format version
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// Errors raised while saving or loading a bundle
#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Bundle not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to access bundle {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt bundle {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported bundle format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Schema fingerprint mismatch: bundle records {stored}, {component} computes {computed}")]
    FingerprintMismatch {
        stored: String,
        computed: String,
        component: &'static str,
    },

    #[error("Bundle has {labels} class labels but the classifier predicts {classes} classes")]
    ClassCount { labels: usize, classes: usize },

    #[error("Invalid encoder state: {0}")]
    Encoder(#[from] EncoderError),

    #[error("Invalid classifier state: {0}")]
    Model(#[from] ModelError),

    #[error("Failed to serialize bundle: {0}")]
    Serialize(serde_json::Error),
}

/// Everything needed to score a raw record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringBundle {
    pub format_version: u32,
    /// ISO 8601 creation timestamp
    pub created_at: String,
    pub crate_version: String,
    pub schema_fingerprint: String,
    /// Label of each class code, indexed by code
    pub class_labels: Vec<String>,
    pub encoder: FittedEncoder,
    pub classifier: SoftmaxClassifier,
}

impl ScoringBundle {
    pub fn new(
        encoder: FittedEncoder,
        classifier: SoftmaxClassifier,
        class_labels: Vec<String>,
    ) -> Result<Self, BundleError> {
        let bundle = Self {
            format_version: BUNDLE_FORMAT_VERSION,
            created_at: Utc::now().to_rfc3339(),
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            schema_fingerprint: encoder.fingerprint(),
            class_labels,
            encoder,
            classifier,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Check version, component states, fingerprints and class count.
    pub fn validate(&self) -> Result<(), BundleError> {
        if self.format_version != BUNDLE_FORMAT_VERSION {
            return Err(BundleError::UnsupportedVersion {
                found: self.format_version,
                supported: BUNDLE_FORMAT_VERSION,
            });
        }

        self.encoder.validate()?;
        self.classifier.validate()?;

        let encoder_fp = self.encoder.fingerprint();
        if encoder_fp != self.schema_fingerprint {
            return Err(BundleError::FingerprintMismatch {
                stored: self.schema_fingerprint.clone(),
                computed: encoder_fp,
                component: "encoder",
            });
        }
        let classifier_fp = self.classifier.input_fingerprint();
        if classifier_fp != self.schema_fingerprint {
            return Err(BundleError::FingerprintMismatch {
                stored: self.schema_fingerprint.clone(),
                computed: classifier_fp,
                component: "classifier",
            });
        }

        if self.class_labels.len() != self.classifier.n_classes() {
            return Err(BundleError::ClassCount {
                labels: self.class_labels.len(),
                classes: self.classifier.n_classes(),
            });
        }
        Ok(())
    }

    /// Label for a class code
    pub fn label(&self, code: usize) -> Option<&str> {
        self.class_labels.get(code).map(String::as_str)
    }

    pub fn save(&self, path: &Path) -> Result<(), BundleError> {
        let json = serde_json::to_string_pretty(self).map_err(BundleError::Serialize)?;
        fs::write(path, json).map_err(|source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            path = %path.display(),
            fingerprint = short_fingerprint(&self.schema_fingerprint),
            "Scoring bundle saved"
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, BundleError> {
        if !path.exists() {
            return Err(BundleError::NotFound(path.to_path_buf()));
        }
        let json = fs::read_to_string(path).map_err(|source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let bundle: ScoringBundle =
            serde_json::from_str(&json).map_err(|source| BundleError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;
        bundle.validate()?;

        info!(
            path = %path.display(),
            fingerprint = short_fingerprint(&bundle.schema_fingerprint),
            columns = bundle.encoder.columns().len(),
            classes = bundle.class_labels.len(),
            "Scoring bundle loaded"
        );
        Ok(bundle)
    }
}
