//! Command-line argument definitions using clap

use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::pipeline::encoder::{DEFAULT_DATA_SEP, DEFAULT_NAME_SEP};
use crate::pipeline::{EncoderConfig, TrainerConfig};

/// Environment variable holding the default bundle path
pub const BUNDLE_ENV: &str = "CREDSCORE_BUNDLE";

/// credscore - Encode multi-valued text columns and score credit records
#[derive(Parser, Debug)]
#[command(name = "credscore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Encoder settings shared by `encode` and `train`
#[derive(Args, Debug, Clone)]
pub struct EncoderArgs {
    /// Separator between tokens inside a multi-valued cell
    #[arg(long, default_value_t = DEFAULT_DATA_SEP, value_parser = parse_separator)]
    pub data_sep: char,

    /// Separator between prefix and token in generated column names
    #[arg(long, default_value_t = DEFAULT_NAME_SEP, value_parser = parse_separator)]
    pub name_sep: char,

    /// Explicit prefix for a multi-valued column (repeatable).
    /// Example: --prefix Type_of_Loan=loan
    #[arg(long = "prefix", value_name = "COLUMN=PREFIX", value_parser = parse_prefix)]
    pub prefixes: Vec<(String, String)>,
}

impl EncoderArgs {
    pub fn to_config(&self) -> EncoderConfig {
        self.prefixes.iter().fold(
            EncoderConfig::new()
                .with_data_sep(self.data_sep)
                .with_name_sep(self.name_sep),
            |config, (column, prefix)| config.with_prefix(column.clone(), prefix.clone()),
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fit the multi-value encoder on a dataset and write the encoded dataset
    Encode {
        /// Input file path (CSV or Parquet)
        input: PathBuf,

        /// Output file path (CSV or Parquet, determined by extension).
        /// Defaults to input directory with '_encoded' suffix.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the fitted encoder state (with metadata) to this JSON file
        #[arg(long)]
        encoder_out: Option<PathBuf>,

        /// Columns to drop before encoding (comma-separated)
        #[arg(long, value_delimiter = ',')]
        drop_columns: Vec<String>,

        /// Number of rows to use for schema inference (CSV only).
        /// Use 0 for full table scan.
        #[arg(long, default_value = "10000")]
        infer_schema_length: usize,

        #[command(flatten)]
        encoder: EncoderArgs,
    },

    /// Fit the encoder and classifier and write a scoring bundle
    Train {
        /// Training file path (CSV or Parquet)
        input: PathBuf,

        /// Target column name
        #[arg(short, long, default_value = "Credit_Score")]
        target: String,

        /// Bundle output path. Defaults to input directory with '_bundle.json' suffix.
        #[arg(short, long)]
        bundle: Option<PathBuf>,

        /// Columns to drop before training (comma-separated), e.g. identifiers
        #[arg(long, value_delimiter = ',')]
        drop_columns: Vec<String>,

        /// Number of rows to use for schema inference (CSV only).
        /// Use 0 for full table scan.
        #[arg(long, default_value = "10000")]
        infer_schema_length: usize,

        /// Maximum gradient descent epochs
        #[arg(long, default_value = "500", value_parser = validate_epochs)]
        epochs: usize,

        /// Gradient descent step size
        #[arg(long, default_value = "0.5", value_parser = validate_learning_rate)]
        learning_rate: f64,

        /// L2 penalty strength
        #[arg(long, default_value = "0.0001", value_parser = validate_l2)]
        l2: f64,

        #[command(flatten)]
        encoder: EncoderArgs,
    },

    /// Score a single record
    Score {
        /// Scoring bundle path
        #[arg(short, long, env = BUNDLE_ENV)]
        bundle: PathBuf,

        /// JSON file holding one record object
        #[arg(long)]
        record: Option<PathBuf>,

        /// Set a field value (repeatable); overrides values from --record.
        /// Example: --set "Type_of_Loan=auto loan,payday loan"
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,

        /// Validate the record against the credit input contract
        #[arg(long)]
        strict: bool,

        /// Print the prediction as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Score every row of a dataset or records file
    ScoreBatch {
        /// Input file path (CSV, Parquet, JSON or JSONL)
        input: PathBuf,

        /// Scoring bundle path
        #[arg(short, long, env = BUNDLE_ENV)]
        bundle: PathBuf,

        /// Output file path (CSV or Parquet).
        /// Defaults to input directory with '_scored' suffix.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Validate every record against the credit input contract
        #[arg(long)]
        strict: bool,

        /// Number of rows to use for schema inference (CSV only).
        /// Use 0 for full table scan.
        #[arg(long, default_value = "10000")]
        infer_schema_length: usize,
    },

    /// Show the contents of a scoring bundle
    Inspect {
        /// Scoring bundle path
        #[arg(short, long, env = BUNDLE_ENV)]
        bundle: PathBuf,

        /// Print the encoder state and bundle metadata as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Trainer settings for the `train` command
    pub fn trainer_config(&self) -> Option<TrainerConfig> {
        match self {
            Commands::Train {
                epochs,
                learning_rate,
                l2,
                ..
            } => Some(TrainerConfig {
                epochs: *epochs,
                learning_rate: *learning_rate,
                l2: *l2,
                ..TrainerConfig::default()
            }),
            _ => None,
        }
    }
}

/// Derive an output path next to `input`: `<stem><suffix>.<extension>`.
/// `extension` falls back to the input's own extension.
pub fn derive_output_path(input: &Path, suffix: &str, extension: Option<&str>) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let extension = extension
        .or_else(|| input.extension().and_then(|e| e.to_str()))
        .unwrap_or("parquet");
    parent.join(format!("{}{}.{}", stem, suffix, extension))
}

/// Validator for single-character separators
fn parse_separator(s: &str) -> Result<char, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("separator must be a single character, got '{}'", s)),
    }
}

/// Validator for `COLUMN=PREFIX` pairs
fn parse_prefix(s: &str) -> Result<(String, String), String> {
    let (column, prefix) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=PREFIX, got '{}'", s))?;
    if column.is_empty() || prefix.is_empty() {
        return Err(format!("column and prefix must be non-empty, got '{}'", s));
    }
    Ok((column.to_string(), prefix.to_string()))
}

/// Validator for epochs parameter
fn validate_epochs(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value == 0 {
        Err("epochs must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

/// Validator for learning_rate parameter
fn validate_learning_rate(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(format!("learning_rate must be positive, got {}", value))
    }
}

/// Validator for l2 parameter
fn validate_l2(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value >= 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(format!("l2 must be non-negative, got {}", value))
    }
}
