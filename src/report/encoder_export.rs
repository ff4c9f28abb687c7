//! Fitted encoder export with run metadata

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::FittedEncoder;

/// Metadata about the encoding run
#[derive(Serialize)]
pub struct ExportMetadata {
    /// Timestamp of the export (ISO 8601 format)
    pub timestamp: String,
    pub credscore_version: String,
    pub input_file: String,
    pub rows: usize,
    pub schema_fingerprint: String,
}

/// One multi-valued source column and the dummies it expands into
#[derive(Serialize)]
pub struct DummyBlock {
    pub source_column: String,
    pub prefix: String,
    pub dummy_columns: Vec<String>,
}

/// Complete export: metadata, a readable view of the blocks, and the
/// reloadable encoder state
#[derive(Serialize)]
pub struct EncoderExport<'a> {
    pub metadata: ExportMetadata,
    pub blocks: Vec<DummyBlock>,
    pub encoder: &'a FittedEncoder,
}

impl<'a> EncoderExport<'a> {
    pub fn new(encoder: &'a FittedEncoder, input_file: &str, rows: usize) -> Self {
        let blocks = encoder
            .dummy_cols()
            .iter()
            .zip(encoder.dummy_prefix())
            .map(|(column, prefix)| DummyBlock {
                source_column: column.clone(),
                prefix: prefix.clone(),
                dummy_columns: encoder
                    .dummy_columns_for(column)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            })
            .collect();

        Self {
            metadata: ExportMetadata {
                timestamp: Utc::now().to_rfc3339(),
                credscore_version: env!("CARGO_PKG_VERSION").to_string(),
                input_file: input_file.to_string(),
                rows,
                schema_fingerprint: encoder.fingerprint(),
            },
            blocks,
            encoder,
        }
    }
}

/// Write the encoder export to a JSON file
pub fn export_encoder_state(
    encoder: &FittedEncoder,
    input_file: &str,
    rows: usize,
    output_path: &Path,
) -> Result<()> {
    let export = EncoderExport::new(encoder, input_file, rows);
    let json =
        serde_json::to_string_pretty(&export).context("Failed to serialize encoder state to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write encoder state to {}", output_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::MultiValueEncoder;
    use polars::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_export_contains_blocks_and_state() {
        let df = df! {
            "Age" => [30i64, 40],
            "Type_of_Loan" => ["auto loan,home equity loan", "mortgage loan"],
        }
        .unwrap();
        let encoder = MultiValueEncoder::default().fit(&df).unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("encoder.json");

        export_encoder_state(&encoder, "train.csv", 2, &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["metadata"]["rows"], 2);
        assert_eq!(json["blocks"][0]["prefix"], "ToL");
        assert_eq!(
            json["blocks"][0]["dummy_columns"].as_array().unwrap().len(),
            3
        );
        let state: FittedEncoder = serde_json::from_value(json["encoder"].clone()).unwrap();
        assert_eq!(state, encoder);
    }
}
