//! Dense feature layout for the classifier
//!
//! The encoded frame still holds pass-through text columns (e.g.
//! `Occupation`). The layout freezes, at training time, how every encoded
//! column maps onto `f64` features: numeric columns pass through, text
//! columns are one-hot expanded over the categories seen during training.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::classifier::ModelError;
use super::encoder::text_values;
use super::fingerprint::schema_fingerprint;

/// How one encoded column becomes features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureSlot {
    Numeric { column: String },
    OneHot { column: String, categories: Vec<String> },
}

impl FeatureSlot {
    pub fn column(&self) -> &str {
        match self {
            FeatureSlot::Numeric { column } | FeatureSlot::OneHot { column, .. } => column,
        }
    }

    pub fn width(&self) -> usize {
        match self {
            FeatureSlot::Numeric { .. } => 1,
            FeatureSlot::OneHot { categories, .. } => categories.len(),
        }
    }
}

/// Frozen mapping from encoded columns to a dense feature row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureLayout {
    source_columns: Vec<String>,
    slots: Vec<FeatureSlot>,
}

impl FeatureLayout {
    /// Learn the layout from an encoded training frame.
    pub fn fit(encoded: &DataFrame) -> Result<Self, ModelError> {
        let mut source_columns = Vec::with_capacity(encoded.width());
        let mut slots = Vec::with_capacity(encoded.width());

        for column in encoded.get_columns() {
            let name = column.name().to_string();
            let dtype = column.dtype();

            let slot = if dtype == &DataType::String {
                let mut categories: Vec<String> = column
                    .str()?
                    .into_iter()
                    .flatten()
                    .map(str::to_string)
                    .collect();
                categories.sort();
                categories.dedup();
                FeatureSlot::OneHot {
                    column: name.clone(),
                    categories,
                }
            } else if dtype.is_primitive_numeric() || dtype == &DataType::Boolean {
                FeatureSlot::Numeric {
                    column: name.clone(),
                }
            } else {
                return Err(ModelError::UnsupportedDtype {
                    column: name,
                    dtype: dtype.to_string(),
                });
            };

            source_columns.push(name);
            slots.push(slot);
        }

        Ok(Self {
            source_columns,
            slots,
        })
    }

    /// Encoded columns this layout expects, in order
    pub fn source_columns(&self) -> &[String] {
        &self.source_columns
    }

    /// Fingerprint of [`FeatureLayout::source_columns`]
    pub fn source_fingerprint(&self) -> String {
        schema_fingerprint(&self.source_columns)
    }

    pub fn slots(&self) -> &[FeatureSlot] {
        &self.slots
    }

    /// Number of dense features
    pub fn width(&self) -> usize {
        self.slots.iter().map(FeatureSlot::width).sum()
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.slots
            .iter()
            .flat_map(|slot| match slot {
                FeatureSlot::Numeric { column } => vec![column.clone()],
                FeatureSlot::OneHot { column, categories } => categories
                    .iter()
                    .map(|c| format!("{}={}", column, c))
                    .collect(),
            })
            .collect()
    }

    /// Project an encoded frame onto dense rows.
    ///
    /// Missing or non-finite numeric values come back as `None`; text values
    /// unseen in training produce an all-zero one-hot block.
    pub fn rows(&self, encoded: &DataFrame) -> Result<Vec<Vec<Option<f64>>>, ModelError> {
        let found: Vec<String> = encoded
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        if found != self.source_columns {
            return Err(ModelError::SchemaMismatch {
                expected: self.source_fingerprint(),
                found: schema_fingerprint(&found),
            });
        }

        let width = self.width();
        let mut rows: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(width); encoded.height()];

        for slot in &self.slots {
            let column = encoded.column(slot.column())?;
            match slot {
                FeatureSlot::Numeric { .. } => {
                    let cast = column.cast(&DataType::Float64)?;
                    for (row, value) in rows.iter_mut().zip(cast.f64()?) {
                        row.push(value.filter(|v| v.is_finite()));
                    }
                }
                FeatureSlot::OneHot { categories, .. } => {
                    let text = text_values(column)?;
                    for (row, value) in rows.iter_mut().zip(&text) {
                        row.extend(
                            categories
                                .iter()
                                .map(|c| Some(if value == Some(c.as_str()) { 1.0 } else { 0.0 })),
                        );
                    }
                }
            }
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded_frame() -> DataFrame {
        df! {
            "Age" => [Some(30i64), None, Some(50)],
            "Occupation" => ["Lawyer", "Doctor", "Lawyer"],
            "ToL_auto loan" => [1i32, 0, 1],
        }
        .unwrap()
    }

    #[test]
    fn test_fit_layout() {
        let layout = FeatureLayout::fit(&encoded_frame()).unwrap();

        assert_eq!(layout.width(), 4);
        assert_eq!(
            layout.feature_names(),
            vec!["Age", "Occupation=Doctor", "Occupation=Lawyer", "ToL_auto loan"]
        );
    }

    #[test]
    fn test_rows_projection() {
        let df = encoded_frame();
        let layout = FeatureLayout::fit(&df).unwrap();
        let rows = layout.rows(&df).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec![Some(30.0), Some(0.0), Some(1.0), Some(1.0)]);
        assert_eq!(rows[1], vec![None, Some(1.0), Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_unseen_category_is_all_zero() {
        let layout = FeatureLayout::fit(&encoded_frame()).unwrap();
        let input = df! {
            "Age" => [40.0f64],
            "Occupation" => ["Musician"],
            "ToL_auto loan" => [0i32],
        }
        .unwrap();

        let rows = layout.rows(&input).unwrap();
        assert_eq!(rows[0], vec![Some(40.0), Some(0.0), Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_schema_mismatch() {
        let layout = FeatureLayout::fit(&encoded_frame()).unwrap();
        let input = df! { "Age" => [40.0f64] }.unwrap();
        assert!(matches!(
            layout.rows(&input),
            Err(ModelError::SchemaMismatch { .. })
        ));
    }
}
