//! `train` command: fit encoder + classifier and write the scoring bundle

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use super::args::{derive_output_path, EncoderArgs};
use crate::pipeline::{
    drop_columns, get_column_names, load_dataset, train_bundle, MultiValueEncoder, TrainerConfig,
};
use crate::report::{EncodingSummary, TrainingSummary};
use crate::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_step_header, print_step_time, print_success, print_warning,
};

pub struct TrainParams<'a> {
    pub input: &'a Path,
    pub target: &'a str,
    pub bundle: Option<&'a Path>,
    pub drop_columns: &'a [String],
    pub infer_schema_length: usize,
    pub trainer: TrainerConfig,
    pub encoder: &'a EncoderArgs,
}

pub fn run_train(params: &TrainParams) -> Result<()> {
    let bundle_path = params
        .bundle
        .map(Path::to_path_buf)
        .unwrap_or_else(|| derive_output_path(params.input, "_bundle", Some("json")));

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(
        "Train",
        &[
            ("Input", params.input.display().to_string()),
            ("Target", params.target.to_string()),
            ("Bundle", bundle_path.display().to_string()),
            ("Epochs", params.trainer.epochs.to_string()),
            ("Learning rate", params.trainer.learning_rate.to_string()),
            ("L2", params.trainer.l2.to_string()),
        ],
    );

    print_step_header(1, "Load dataset");
    let step_start = Instant::now();
    let spinner = create_spinner("Loading dataset...");
    let df = load_dataset(params.input, params.infer_schema_length)?;
    finish_with_success(
        &spinner,
        &format!("Loaded {} rows × {} columns", df.height(), df.width()),
    );

    if !get_column_names(&df).iter().any(|c| c == params.target) {
        anyhow::bail!(
            "Target column '{}' not found in {}",
            params.target,
            params.input.display()
        );
    }
    let (df, missing) = drop_columns(df, params.drop_columns)?;
    if !missing.is_empty() {
        print_warning(&format!(
            "Columns not found, skipped dropping: {}",
            missing.join(", ")
        ));
    }
    print_step_time(step_start.elapsed());

    print_step_header(2, "Train");
    let step_start = Instant::now();
    let spinner = create_spinner("Fitting encoder and classifier...");
    let encoder = MultiValueEncoder::new(params.encoder.to_config());
    let (bundle, report) = train_bundle(&df, params.target, &encoder, &params.trainer)
        .with_context(|| format!("Training failed on {}", params.input.display()))?;
    finish_with_success(&spinner, "Model trained");
    print_step_time(step_start.elapsed());

    print_step_header(3, "Save bundle");
    let step_start = Instant::now();
    bundle.save(&bundle_path)?;
    print_success(&format!("Saved to {}", bundle_path.display()));
    print_step_time(step_start.elapsed());

    EncodingSummary::new(&bundle.encoder, report.rows, report.input_columns).display();
    TrainingSummary::new(&report).display();
    print_completion("Training complete!");

    Ok(())
}
