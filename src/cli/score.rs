//! `score` and `score-batch` commands

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::warn;

use super::args::derive_output_path;
use crate::pipeline::{
    frame_to_records, is_records_file, load_dataset, load_records, parse_assignment,
    records_to_frame, save_dataset, scoring, FieldValue, InputSchema, RawRecord, Scorer,
};
use crate::report::{display_prediction, predictions_frame};
use crate::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_completion,
    print_config, print_count, print_info, print_step_header, print_step_time, print_success,
};

/// Build the record for `score` from an optional JSON file plus `FIELD=VALUE`
/// overrides.
///
/// With a schema, override values are parsed per field kind; otherwise
/// numbers are inferred.
pub fn build_record(
    record_file: Option<&Path>,
    assignments: &[String],
    schema: Option<&InputSchema>,
) -> Result<RawRecord> {
    let mut record = match record_file {
        Some(path) => {
            let mut records = load_records(path)?;
            if records.len() != 1 {
                anyhow::bail!(
                    "{} holds {} records; use score-batch for more than one",
                    path.display(),
                    records.len()
                );
            }
            records.remove(0)
        }
        None => RawRecord::new(),
    };

    for raw in assignments {
        let (field, value) = parse_assignment(raw)?;
        let value = match schema {
            Some(schema) if schema.field(&field).is_some() => schema.coerce(&field, &value)?,
            _ => FieldValue::infer(&value),
        };
        record.insert(field, value);
    }

    if record.is_empty() {
        anyhow::bail!("No record given. Use --record FILE and/or --set FIELD=VALUE");
    }
    Ok(record)
}

pub fn run_score(
    bundle: &Path,
    record_file: Option<&Path>,
    assignments: &[String],
    strict: bool,
    json: bool,
) -> Result<()> {
    let schema = strict.then(InputSchema::credit);
    let record = build_record(record_file, assignments, schema.as_ref())?;

    if let Some(schema) = &schema {
        schema.validate(&record)?;
    }

    let scorer = scoring::init(bundle)
        .with_context(|| format!("Failed to load scoring bundle {}", bundle.display()))?;
    let prediction = scorer.score_record(&record)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
    } else {
        display_prediction(&prediction);
    }
    Ok(())
}

pub struct ScoreBatchParams<'a> {
    pub input: &'a Path,
    pub bundle: &'a Path,
    pub output: Option<&'a Path>,
    pub strict: bool,
    pub infer_schema_length: usize,
}

fn batch_output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(p) => p.to_path_buf(),
        None if is_records_file(input) => derive_output_path(input, "_scored", Some("csv")),
        None => derive_output_path(input, "_scored", None),
    }
}

pub fn run_score_batch(params: &ScoreBatchParams) -> Result<()> {
    let output_path = batch_output_path(params.input, params.output);

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(
        "Score batch",
        &[
            ("Input", params.input.display().to_string()),
            ("Bundle", params.bundle.display().to_string()),
            ("Output", output_path.display().to_string()),
            ("Strict", params.strict.to_string()),
        ],
    );

    print_step_header(1, "Load bundle and records");
    let step_start = Instant::now();
    let mut scorer = Scorer::load(params.bundle)
        .with_context(|| format!("Failed to load scoring bundle {}", params.bundle.display()))?;
    if params.strict {
        scorer = scorer.with_input_schema(InputSchema::credit());
        print_info("Rows failing input validation are reported in the error column");
    }

    let (input_frame, records) = if is_records_file(params.input) {
        let records = load_records(params.input)?;
        (records_to_frame(&records)?, records)
    } else {
        let df = load_dataset(params.input, params.infer_schema_length)?;
        let records = frame_to_records(&df)?;
        (df, records)
    };
    print_count("records", records.len());
    print_step_time(step_start.elapsed());

    print_step_header(2, "Score");
    let step_start = Instant::now();
    let spinner = create_spinner("Scoring records...");
    let results = scorer.score_records(&records);
    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        warn!(failed, total = results.len(), "Some records failed to score");
        finish_with_warning(
            &spinner,
            &format!("{} of {} records failed", failed, results.len()),
        );
    } else {
        finish_with_success(&spinner, &format!("Scored {} records", results.len()));
    }
    print_step_time(step_start.elapsed());

    print_step_header(3, "Save");
    let step_start = Instant::now();
    let predictions = predictions_frame(&results, &scorer.bundle().class_labels)?;
    let mut output = input_frame
        .hstack(predictions.get_columns())
        .context("Prediction columns clash with input column names")?;
    save_dataset(&mut output, &output_path)?;
    print_success(&format!("Saved to {}", output_path.display()));
    print_step_time(step_start.elapsed());

    print_completion("Scoring complete!");
    Ok(())
}
