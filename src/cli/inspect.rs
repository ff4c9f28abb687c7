//! `inspect` command: show what a bundle contains

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::pipeline::ScoringBundle;
use crate::report::display_bundle;

/// Bundle metadata without the classifier weights
#[derive(Serialize)]
struct BundleOverview<'a> {
    format_version: u32,
    created_at: &'a str,
    crate_version: &'a str,
    schema_fingerprint: &'a str,
    class_labels: &'a [String],
    dense_features: usize,
    training_rows: usize,
    encoder: &'a crate::pipeline::FittedEncoder,
}

pub fn run_inspect(bundle_path: &Path, json: bool) -> Result<()> {
    let bundle = ScoringBundle::load(bundle_path)
        .with_context(|| format!("Failed to load scoring bundle {}", bundle_path.display()))?;

    if json {
        let overview = BundleOverview {
            format_version: bundle.format_version,
            created_at: &bundle.created_at,
            crate_version: &bundle.crate_version,
            schema_fingerprint: &bundle.schema_fingerprint,
            class_labels: &bundle.class_labels,
            dense_features: bundle.classifier.layout().width(),
            training_rows: bundle.classifier.training_stats().rows,
            encoder: &bundle.encoder,
        };
        println!("{}", serde_json::to_string_pretty(&overview)?);
    } else {
        display_bundle(&bundle);
    }
    Ok(())
}
