//! Dataset loading and saving for CSV, Parquet and JSON record files

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde_json::Value;
use tracing::debug;

use super::record::RawRecord;

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Load a dataset from a file (CSV or Parquet based on extension)
///
/// `infer_schema_length` only applies to CSV; `0` scans the whole file.
pub fn load_dataset(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    let extension = extension_of(path);

    let lf = match extension.as_str() {
        "csv" => {
            let infer = if infer_schema_length == 0 {
                None
            } else {
                Some(infer_schema_length)
            };
            LazyCsvReader::new(path)
                .with_infer_schema_length(infer)
                .finish()
                .with_context(|| format!("Failed to load CSV file: {}", path.display()))?
        }
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
        _ => anyhow::bail!(
            "Unsupported file format: {}. Supported formats: csv, parquet",
            extension
        ),
    };

    let df = lf
        .collect()
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
    debug!(path = %path.display(), rows = df.height(), columns = df.width(), "Dataset loaded");
    Ok(df)
}

/// Column names of a dataset, in order
pub fn get_column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Drop the named columns. Names absent from `df` are returned instead of
/// failing.
pub fn drop_columns(df: DataFrame, names: &[String]) -> Result<(DataFrame, Vec<String>)> {
    let mut df = df;
    let mut missing = Vec::new();
    for name in names {
        if df.get_column_index(name).is_some() {
            df = df.drop(name)?;
        } else {
            missing.push(name.clone());
        }
    }
    Ok((df, missing))
}

/// Save dataset to file (CSV or Parquet based on extension)
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let extension = extension_of(path);

    match extension.as_str() {
        "csv" => {
            let mut file = fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            CsvWriter::new(&mut file)
                .finish(df)
                .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        }
        "parquet" => {
            let file = fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            ParquetWriter::new(file)
                .finish(df)
                .with_context(|| format!("Failed to write Parquet file: {}", path.display()))?;
        }
        _ => anyhow::bail!(
            "Unsupported output format: {}. Supported formats: csv, parquet",
            extension
        ),
    }

    Ok(())
}

/// Load raw records from a `.json` file (one object or an array of objects)
/// or a `.jsonl` file (one object per line).
pub fn load_records(path: &Path) -> Result<Vec<RawRecord>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read records file: {}", path.display()))?;

    match extension_of(path).as_str() {
        "jsonl" | "ndjson" => text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                RawRecord::from_json_str(line)
                    .with_context(|| format!("Invalid record on line {} of {}", i + 1, path.display()))
            })
            .collect(),
        "json" => {
            let value: Value = serde_json::from_str(&text)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?;
            match value {
                Value::Array(items) => items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        RawRecord::from_json_value(item)
                            .with_context(|| format!("Invalid record at index {} of {}", i, path.display()))
                    })
                    .collect(),
                other => Ok(vec![RawRecord::from_json_value(&other)
                    .with_context(|| format!("Invalid record in {}", path.display()))?]),
            }
        }
        other => anyhow::bail!(
            "Unsupported records format: {}. Supported formats: json, jsonl",
            other
        ),
    }
}

/// Whether `path` holds JSON records rather than a tabular dataset
pub fn is_records_file(path: &Path) -> bool {
    matches!(extension_of(path).as_str(), "json" | "jsonl" | "ndjson")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_drop_columns_reports_missing() {
        let df = df! {
            "ID" => [1i64, 2],
            "Age" => [30i64, 40],
        }
        .unwrap();

        let (df, missing) = drop_columns(df, &["ID".to_string(), "Nope".to_string()]).unwrap();

        assert_eq!(get_column_names(&df), vec!["Age"]);
        assert_eq!(missing, vec!["Nope"]);
    }

    #[test]
    fn test_load_records_json_and_jsonl() {
        let dir = TempDir::new().unwrap();

        let json = dir.path().join("records.json");
        fs::write(&json, r#"[{"Age": 30}, {"Age": 40, "Occupation": "Lawyer"}]"#).unwrap();
        assert_eq!(load_records(&json).unwrap().len(), 2);

        let single = dir.path().join("one.json");
        fs::write(&single, r#"{"Age": 30}"#).unwrap();
        assert_eq!(load_records(&single).unwrap().len(), 1);

        let jsonl = dir.path().join("records.jsonl");
        fs::write(&jsonl, "{\"Age\": 30}\n\n{\"Age\": 41}\n").unwrap();
        let records = load_records(&jsonl).unwrap();
        assert_eq!(records.len(), 2);
        assert!(is_records_file(&jsonl));
    }

    #[test]
    fn test_unsupported_formats() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.txt");
        fs::write(&path, "a,b").unwrap();

        assert!(load_dataset(&path, 100).is_err());
        assert!(load_records(&path).is_err());
        assert!(!is_records_file(&path));
    }
}
