//! `encode` command: fit the encoder and write the encoded dataset

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use super::args::{derive_output_path, EncoderArgs};
use crate::pipeline::{drop_columns, load_dataset, save_dataset, MultiValueEncoder};
use crate::report::{export_encoder_state, EncodingSummary};
use crate::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_count, print_step_header, print_step_time, print_success, print_warning,
};

pub struct EncodeParams<'a> {
    pub input: &'a Path,
    pub output: Option<&'a Path>,
    pub encoder_out: Option<&'a Path>,
    pub drop_columns: &'a [String],
    pub infer_schema_length: usize,
    pub encoder: &'a EncoderArgs,
}

pub fn run_encode(params: &EncodeParams) -> Result<()> {
    let output_path = params
        .output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| derive_output_path(params.input, "_encoded", None));

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(
        "Encode",
        &[
            ("Input", params.input.display().to_string()),
            ("Output", output_path.display().to_string()),
            ("Data separator", format!("'{}'", params.encoder.data_sep)),
            ("Name separator", format!("'{}'", params.encoder.name_sep)),
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
    let (df, missing) = drop_columns(df, params.drop_columns)?;
    if !missing.is_empty() {
        print_warning(&format!(
            "Columns not found, skipped dropping: {}",
            missing.join(", ")
        ));
    }
    print_step_time(step_start.elapsed());

    print_step_header(2, "Fit and transform");
    let step_start = Instant::now();
    let encoder = MultiValueEncoder::new(params.encoder.to_config());
    let (fitted, mut encoded) = encoder
        .fit_transform(&df)
        .with_context(|| format!("Failed to encode {}", params.input.display()))?;
    print_count("multi-valued columns", fitted.dummy_cols().len());
    print_success("Encoder fitted");
    print_step_time(step_start.elapsed());

    print_step_header(3, "Save");
    let step_start = Instant::now();
    save_dataset(&mut encoded, &output_path)?;
    print_success(&format!("Saved to {}", output_path.display()));
    if let Some(path) = params.encoder_out {
        export_encoder_state(
            &fitted,
            &params.input.display().to_string(),
            df.height(),
            path,
        )?;
        print_success(&format!("Encoder state written to {}", path.display()));
    }
    print_step_time(step_start.elapsed());

    EncodingSummary::new(&fitted, df.height(), df.width()).display();
    print_completion("Encoding complete!");

    Ok(())
}
