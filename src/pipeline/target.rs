//! Target column analysis and class-code mapping
//!
//! Integer targets are used directly as class codes. Text targets are
//! label-encoded in sorted order, so `Good`/`Poor`/`Standard` become 0/1/2.

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Tolerance for floating point comparison when checking integer codes
const TOLERANCE: f64 = 1e-9;

/// Labels for class codes 0, 1 and 2 when the target is already numeric
pub const DEFAULT_CLASS_LABELS: [&str; 3] = ["good", "poor", "standard"];

/// Class codes for every row plus the label of each code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEncoding {
    pub codes: Vec<u32>,
    pub labels: Vec<String>,
}

impl TargetEncoding {
    pub fn n_classes(&self) -> usize {
        self.labels.len()
    }

    /// Rows per class code
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.labels.len()];
        for &code in &self.codes {
            counts[code as usize] += 1;
        }
        counts
    }
}

/// Map the target column of `df` onto class codes.
///
/// The column must be free of nulls; callers drop those rows first.
pub fn encode_target(df: &DataFrame, target: &str) -> Result<TargetEncoding> {
    let target_col = df
        .column(target)
        .with_context(|| format!("Target column '{}' not found", target))?;

    if target_col.len() == 0 {
        anyhow::bail!("Target column '{}' is empty", target);
    }
    if target_col.null_count() > 0 {
        anyhow::bail!(
            "Target column '{}' contains {} null values",
            target,
            target_col.null_count()
        );
    }

    if target_col.dtype().is_primitive_numeric() {
        encode_numeric_target(target_col, target)
    } else {
        encode_text_target(target_col)
    }
}

fn encode_numeric_target(col: &Column, target: &str) -> Result<TargetEncoding> {
    let float_col = col.cast(&DataType::Float64)?;
    let mut codes = Vec::with_capacity(col.len());

    for value in float_col.f64()?.into_iter().flatten() {
        if value < 0.0 || (value - value.round()).abs() > TOLERANCE {
            anyhow::bail!(
                "Target column '{}' holds {} which is not a non-negative class code",
                target,
                value
            );
        }
        codes.push(value.round() as u32);
    }

    let max_code = codes.iter().copied().max().unwrap_or(0) as usize;
    let labels = if max_code < DEFAULT_CLASS_LABELS.len() {
        DEFAULT_CLASS_LABELS[..=max_code]
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        (0..=max_code).map(|c| c.to_string()).collect()
    };

    Ok(TargetEncoding { codes, labels })
}

fn encode_text_target(col: &Column) -> Result<TargetEncoding> {
    let text = col.cast(&DataType::String)?;
    let values: Vec<&str> = text.str()?.into_iter().flatten().collect();

    let mut unique: Vec<&str> = values.clone();
    unique.sort_unstable();
    unique.dedup();

    let codes = values
        .iter()
        .map(|v| unique.binary_search(v).map(|i| i as u32))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| anyhow::anyhow!("Target value lookup failed"))?;

    Ok(TargetEncoding {
        codes,
        labels: unique.iter().map(|s| s.to_lowercase()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_target_sorted_codes() {
        let df = df! {
            "Credit_Score" => ["Standard", "Good", "Poor", "Good"],
        }
        .unwrap();

        let encoding = encode_target(&df, "Credit_Score").unwrap();
        assert_eq!(encoding.codes, vec![2, 0, 1, 0]);
        assert_eq!(encoding.labels, vec!["good", "poor", "standard"]);
        assert_eq!(encoding.class_counts(), vec![2, 1, 1]);
    }

    #[test]
    fn test_numeric_target_default_labels() {
        let df = df! { "y" => [0i64, 1, 2, 1] }.unwrap();

        let encoding = encode_target(&df, "y").unwrap();
        assert_eq!(encoding.codes, vec![0, 1, 2, 1]);
        assert_eq!(encoding.labels, vec!["good", "poor", "standard"]);
    }

    #[test]
    fn test_numeric_target_beyond_defaults() {
        let df = df! { "y" => [0.0f64, 4.0] }.unwrap();

        let encoding = encode_target(&df, "y").unwrap();
        assert_eq!(encoding.n_classes(), 5);
        assert_eq!(encoding.labels[4], "4");
    }

    #[test]
    fn test_rejects_fractional_and_null_targets() {
        let df = df! { "y" => [0.5f64, 1.0] }.unwrap();
        assert!(encode_target(&df, "y").is_err());

        let df = df! { "y" => [Some(0i64), None] }.unwrap();
        assert!(encode_target(&df, "y").is_err());

        assert!(encode_target(&df, "missing").is_err());
    }
}
