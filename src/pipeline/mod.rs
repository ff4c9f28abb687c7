//! Pipeline module - encoding, training and scoring

pub mod bundle;
pub mod classifier;
pub mod encoder;
pub mod features;
pub mod fingerprint;
pub mod input;
pub mod loader;
pub mod record;
pub mod scoring;
pub mod target;
pub mod training;

pub use bundle::{BundleError, ScoringBundle, BUNDLE_FORMAT_VERSION};
pub use classifier::{ModelError, SoftmaxClassifier, TrainerConfig, TrainingStats};
pub use encoder::{EncoderConfig, EncoderError, FittedEncoder, MultiValueEncoder};
pub use features::{FeatureLayout, FeatureSlot};
pub use fingerprint::{schema_fingerprint, short_fingerprint};
pub use input::{FieldKind, InputError, InputSchema, Violation};
pub use loader::*;
pub use record::{
    frame_to_records, parse_assignment, records_to_frame, FieldValue, RawRecord, RecordError,
};
pub use scoring::{ClassProbability, Prediction, RiskTier, Scorer, ScoringError};
pub use target::{encode_target, TargetEncoding};
pub use training::{train_bundle, TrainingReport};
