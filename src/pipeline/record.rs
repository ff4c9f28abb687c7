//! Raw input records and their conversion into DataFrames

use polars::prelude::*;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while building records
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Record must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Field '{field}' has unsupported value type: {kind}")]
    UnsupportedValue { field: String, kind: &'static str },

    #[error("Invalid assignment '{0}'. Expected FIELD=VALUE")]
    InvalidAssignment(String),

    #[error("No records to convert")]
    Empty,

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// A single raw field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Missing,
}

impl FieldValue {
    /// Parse a loosely-typed string: numbers become `Number`, empty becomes `Missing`.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            FieldValue::Missing
        } else if let Ok(n) = trimmed.parse::<f64>() {
            FieldValue::Number(n)
        } else {
            FieldValue::Text(raw.to_string())
        }
    }

    fn from_json(field: &str, value: &Value) -> Result<Self, RecordError> {
        match value {
            Value::Null => Ok(FieldValue::Missing),
            Value::Number(n) => n
                .as_f64()
                .map(FieldValue::Number)
                .ok_or_else(|| RecordError::UnsupportedValue {
                    field: field.to_string(),
                    kind: "number out of range",
                }),
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            Value::Bool(_) => Err(RecordError::UnsupportedValue {
                field: field.to_string(),
                kind: "boolean",
            }),
            Value::Array(_) => Err(RecordError::UnsupportedValue {
                field: field.to_string(),
                kind: "array",
            }),
            Value::Object(_) => Err(RecordError::UnsupportedValue {
                field: field.to_string(),
                kind: "object",
            }),
        }
    }

    /// Text rendering used when a field must be stored in a text column
    fn to_text(&self) -> Option<String> {
        match self {
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Missing => None,
        }
    }
}

/// An ordered mapping from field name to raw value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawRecord {
    fields: Vec<(String, FieldValue)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a field, replacing an existing value in place
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a record from a JSON object.
    pub fn from_json_value(value: &Value) -> Result<Self, RecordError> {
        let object = match value {
            Value::Object(map) => map,
            Value::Array(_) => return Err(RecordError::NotAnObject("array")),
            Value::Null => return Err(RecordError::NotAnObject("null")),
            _ => return Err(RecordError::NotAnObject("scalar")),
        };

        let mut record = RawRecord::new();
        for (name, value) in object {
            record.insert(name.clone(), FieldValue::from_json(name, value)?);
        }
        Ok(record)
    }

    pub fn from_json_str(json: &str) -> Result<Self, RecordError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json_value(&value)
    }
}

/// Split `FIELD=VALUE` into its parts. The value may itself contain `=`.
pub fn parse_assignment(raw: &str) -> Result<(String, String), RecordError> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| RecordError::InvalidAssignment(raw.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(RecordError::InvalidAssignment(raw.to_string()));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Convert records into a DataFrame.
///
/// Columns follow first-seen field order. A field whose values are all
/// numbers (or missing) becomes Float64; any text value makes it a String
/// column. Fields absent from a record are null in that row.
pub fn records_to_frame(records: &[RawRecord]) -> Result<DataFrame, RecordError> {
    if records.is_empty() {
        return Err(RecordError::Empty);
    }

    let mut order: Vec<&str> = Vec::new();
    for record in records {
        for name in record.names() {
            if !order.contains(&name) {
                order.push(name);
            }
        }
    }

    let mut columns: Vec<Column> = Vec::with_capacity(order.len());
    for name in order {
        let values: Vec<Option<&FieldValue>> = records.iter().map(|r| r.get(name)).collect();
        let numeric = values
            .iter()
            .all(|v| matches!(v, None | Some(FieldValue::Number(_)) | Some(FieldValue::Missing)));

        let column = if numeric {
            let data: Vec<Option<f64>> = values
                .iter()
                .map(|v| match v {
                    Some(FieldValue::Number(n)) => Some(*n),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), data)
        } else {
            let data: Vec<Option<String>> = values
                .iter()
                .map(|v| v.and_then(|fv| fv.to_text()))
                .collect();
            Column::new(name.into(), data)
        };
        columns.push(column);
    }

    Ok(DataFrame::new(columns)?)
}

/// Split a DataFrame into one record per row.
///
/// Numeric columns yield `Number`, everything else is rendered as text;
/// nulls become `Missing`.
pub fn frame_to_records(df: &DataFrame) -> Result<Vec<RawRecord>, RecordError> {
    let mut records = vec![RawRecord::new(); df.height()];

    for column in df.get_columns() {
        let name = column.name().as_str();
        if column.dtype().is_primitive_numeric() {
            let cast = column.cast(&DataType::Float64)?;
            for (record, value) in records.iter_mut().zip(cast.f64()?) {
                record.insert(name, value.map_or(FieldValue::Missing, FieldValue::Number));
            }
        } else {
            let cast = column.cast(&DataType::String)?;
            for (record, value) in records.iter_mut().zip(cast.str()?) {
                let value = value.map_or(FieldValue::Missing, |s| FieldValue::Text(s.to_string()));
                record.insert(name, value);
            }
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_field_value() {
        assert_eq!(FieldValue::infer("42"), FieldValue::Number(42.0));
        assert_eq!(FieldValue::infer(" 1.5 "), FieldValue::Number(1.5));
        assert_eq!(FieldValue::infer(""), FieldValue::Missing);
        assert_eq!(
            FieldValue::infer("auto loan"),
            FieldValue::Text("auto loan".to_string())
        );
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut record = RawRecord::new()
            .with("a", FieldValue::Number(1.0))
            .with("b", FieldValue::Number(2.0));
        record.insert("a", FieldValue::Number(3.0));

        assert_eq!(record.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(record.get("a"), Some(&FieldValue::Number(3.0)));
    }

    #[test]
    fn test_from_json_object() {
        let record = RawRecord::from_json_str(
            r#"{"Age": 35, "Type_of_Loan": "auto loan,payday loan", "Monthly_Balance": null}"#,
        )
        .unwrap();

        assert_eq!(record.len(), 3);
        assert_eq!(record.get("Age"), Some(&FieldValue::Number(35.0)));
        assert_eq!(record.get("Monthly_Balance"), Some(&FieldValue::Missing));
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        assert!(matches!(
            RawRecord::from_json_str("[1, 2]"),
            Err(RecordError::NotAnObject("array"))
        ));
        assert!(matches!(
            RawRecord::from_json_str(r#"{"flag": true}"#),
            Err(RecordError::UnsupportedValue { .. })
        ));
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("Type_of_Loan=auto loan,mortgage loan").unwrap(),
            ("Type_of_Loan".to_string(), "auto loan,mortgage loan".to_string())
        );
        assert_eq!(
            parse_assignment("expr=a=b").unwrap(),
            ("expr".to_string(), "a=b".to_string())
        );
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn test_records_to_frame_types() {
        let records = vec![
            RawRecord::new()
                .with("Age", FieldValue::Number(30.0))
                .with("Occupation", FieldValue::Text("Lawyer".to_string())),
            RawRecord::new()
                .with("Age", FieldValue::Missing)
                .with("Occupation", FieldValue::Number(7.0))
                .with("Extra", FieldValue::Number(1.0)),
        ];

        let df = records_to_frame(&records).unwrap();

        assert_eq!(df.shape(), (2, 3));
        assert_eq!(df.column("Age").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Occupation").unwrap().dtype(), &DataType::String);
        let occupations: Vec<Option<&str>> =
            df.column("Occupation").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(occupations, vec![Some("Lawyer"), Some("7")]);
        assert_eq!(df.column("Extra").unwrap().null_count(), 1);
    }

    #[test]
    fn test_records_to_frame_empty_errors() {
        assert!(matches!(records_to_frame(&[]), Err(RecordError::Empty)));
    }

    #[test]
    fn test_frame_to_records() {
        let df = df! {
            "Age" => [Some(30i64), None],
            "Occupation" => [Some("Lawyer"), None],
        }
        .unwrap();

        let records = frame_to_records(&df).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Age"), Some(&FieldValue::Number(30.0)));
        assert_eq!(
            records[0].get("Occupation"),
            Some(&FieldValue::Text("Lawyer".to_string()))
        );
        assert_eq!(records[1].get("Age"), Some(&FieldValue::Missing));
        assert_eq!(records[1].get("Occupation"), Some(&FieldValue::Missing));
    }
}
