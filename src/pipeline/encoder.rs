//! Multi-valued categorical encoding with a frozen output schema
//!
//! Text columns whose values carry several tokens joined by a separator
//! (e.g. `"auto loan,home equity loan"`) are expanded into one binary column
//! per distinct token observed at fit time. The ordered output column list is
//! frozen when the encoder is fitted, and every later transform is reconciled
//! onto it: unseen tokens are dropped, absent columns are zero-filled, and the
//! result is reordered to match.

use std::collections::{BTreeSet, HashMap, HashSet};

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::fingerprint::schema_fingerprint;

/// Default separator between tokens inside a multi-valued value
pub const DEFAULT_DATA_SEP: char = ',';

/// Default separator between words of a column name. Also joins prefix and token.
pub const DEFAULT_NAME_SEP: char = '_';

/// Errors raised while fitting or applying the encoder
#[derive(Error, Debug)]
pub enum EncoderError {
    /// The fit dataset has no columns at all
    #[error("Input has no columns - cannot fit encoder")]
    EmptyInput,

    /// A multi-valued column known to the fitted encoder is absent from the input
    #[error("Column '{0}' is required by the fitted encoder but missing from the input")]
    MissingColumn(String),

    /// Two multi-valued columns were assigned the same prefix
    #[error(
        "Prefix '{prefix}' for column '{column}' is already used by column '{existing}'. \
         Supply an explicit prefix for one of them"
    )]
    PrefixCollision {
        prefix: String,
        column: String,
        existing: String,
    },

    /// A generated dummy column has the same name as another output column
    #[error("Generated column '{name}' (from '{source_column}') collides with another output column")]
    ColumnNameCollision { name: String, source_column: String },

    /// A caller-supplied prefix is empty
    #[error("Prefix for column '{0}' must not be empty")]
    EmptyPrefix(String),

    /// A deserialized encoder is internally inconsistent
    #[error("Invalid encoder state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Encoder settings, supplied before fitting
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Separator between tokens inside a value
    pub data_sep: char,
    /// Separator between words in column names
    pub name_sep: char,
    /// Explicit prefixes keyed by source column, used instead of the derived ones
    pub prefixes: HashMap<String, String>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            data_sep: DEFAULT_DATA_SEP,
            name_sep: DEFAULT_NAME_SEP,
            prefixes: HashMap::new(),
        }
    }
}

impl EncoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_sep(mut self, sep: char) -> Self {
        self.data_sep = sep;
        self
    }

    pub fn with_name_sep(mut self, sep: char) -> Self {
        self.name_sep = sep;
        self
    }

    /// Pin the dummy-column prefix for one source column
    pub fn with_prefix(mut self, column: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.prefixes.insert(column.into(), prefix.into());
        self
    }
}

/// Unfitted encoder. Call [`MultiValueEncoder::fit`] to learn the schema.
#[derive(Debug, Clone, Default)]
pub struct MultiValueEncoder {
    config: EncoderConfig,
}

impl MultiValueEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Learn multi-valued columns, prefixes and the frozen output schema.
    pub fn fit(&self, df: &DataFrame) -> Result<FittedEncoder, EncoderError> {
        self.fit_transform(df).map(|(fitted, _)| fitted)
    }

    /// Fit on `df` and return the encoded fit dataset alongside the fitted state.
    pub fn fit_transform(&self, df: &DataFrame) -> Result<(FittedEncoder, DataFrame), EncoderError> {
        if df.width() == 0 {
            return Err(EncoderError::EmptyInput);
        }

        let data_sep = self.config.data_sep;
        let name_sep = self.config.name_sep;

        // Multi-valued: text columns with at least one separator-bearing value
        let mut dummy_cols: Vec<String> = Vec::new();
        for column in df.get_columns() {
            if column.dtype() != &DataType::String {
                continue;
            }
            let is_multi_valued = column
                .str()?
                .into_iter()
                .flatten()
                .any(|value| value.contains(data_sep));
            if is_multi_valued {
                dummy_cols.push(column.name().to_string());
            }
        }

        for column in self.config.prefixes.keys() {
            if !dummy_cols.contains(column) {
                warn!(column = %column, "Prefix supplied for a column that is not multi-valued; ignoring");
            }
        }

        let dummy_prefix = self.assign_prefixes(&dummy_cols)?;

        // Pass-through columns keep their order, dummy blocks are appended
        let dummy_set: HashSet<&str> = dummy_cols.iter().map(String::as_str).collect();
        let mut output: Vec<Column> = df
            .get_columns()
            .iter()
            .filter(|c| !dummy_set.contains(c.name().as_str()))
            .cloned()
            .collect();
        let mut taken: HashSet<String> = output.iter().map(|c| c.name().to_string()).collect();

        let mut dummy_names: Vec<Vec<String>> = Vec::with_capacity(dummy_cols.len());
        for (source, prefix) in dummy_cols.iter().zip(&dummy_prefix) {
            let values = text_values(df.column(source)?)?;
            let mut block_names = Vec::new();
            for (name, cells) in dummy_block(&values, prefix, data_sep, name_sep) {
                if !taken.insert(name.clone()) {
                    return Err(EncoderError::ColumnNameCollision {
                        name,
                        source_column: source.clone(),
                    });
                }
                block_names.push(name.clone());
                output.push(Column::new(name.into(), cells));
            }
            dummy_names.push(block_names);
        }

        let columns: Vec<String> = output.iter().map(|c| c.name().to_string()).collect();
        let encoded = DataFrame::new(output)?;

        let fitted = FittedEncoder {
            data_sep,
            name_sep,
            dummy_cols,
            dummy_prefix,
            dummy_names,
            columns,
        };

        info!(
            multi_valued = fitted.dummy_cols.len(),
            output_columns = fitted.columns.len(),
            fingerprint = %fitted.fingerprint(),
            "Encoder fitted"
        );

        Ok((fitted, encoded))
    }

    /// Resolve one prefix per multi-valued column and reject duplicates.
    fn assign_prefixes(&self, dummy_cols: &[String]) -> Result<Vec<String>, EncoderError> {
        let mut owners: HashMap<String, &str> = HashMap::new();
        let mut prefixes = Vec::with_capacity(dummy_cols.len());

        for column in dummy_cols {
            let prefix = match self.config.prefixes.get(column) {
                Some(p) if p.is_empty() => return Err(EncoderError::EmptyPrefix(column.clone())),
                Some(p) => p.clone(),
                None => derive_prefix(column, self.config.name_sep),
            };

            if let Some(existing) = owners.get(&prefix) {
                return Err(EncoderError::PrefixCollision {
                    prefix,
                    column: column.clone(),
                    existing: existing.to_string(),
                });
            }
            owners.insert(prefix.clone(), column);
            prefixes.push(prefix);
        }

        Ok(prefixes)
    }
}

/// Fitted encoder state. Immutable; safe to share across threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FittedEncoder {
    data_sep: char,
    name_sep: char,
    dummy_cols: Vec<String>,
    dummy_prefix: Vec<String>,
    /// Generated dummy columns per entry of `dummy_cols`, in schema order
    dummy_names: Vec<Vec<String>>,
    columns: Vec<String>,
}

impl FittedEncoder {
    /// Multi-valued source columns, in dataset order
    pub fn dummy_cols(&self) -> &[String] {
        &self.dummy_cols
    }

    /// Prefix for each entry of [`FittedEncoder::dummy_cols`]
    pub fn dummy_prefix(&self) -> &[String] {
        &self.dummy_prefix
    }

    /// The frozen output schema
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn data_sep(&self) -> char {
        self.data_sep
    }

    pub fn name_sep(&self) -> char {
        self.name_sep
    }

    /// True when no column was found to be multi-valued
    pub fn is_identity(&self) -> bool {
        self.dummy_cols.is_empty()
    }

    /// SHA-256 fingerprint of the frozen schema
    pub fn fingerprint(&self) -> String {
        schema_fingerprint(&self.columns)
    }

    /// Dummy columns generated for `source`, in schema order
    pub fn dummy_columns_for(&self, source: &str) -> Vec<&str> {
        let Some(idx) = self.dummy_cols.iter().position(|c| c == source) else {
            return Vec::new();
        };
        self.dummy_names
            .get(idx)
            .map(|names| names.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Output columns copied from the input as-is
    pub fn passthrough_columns(&self) -> Vec<&str> {
        let dummies = self.dummy_name_set();
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|name| !dummies.contains(name))
            .collect()
    }

    fn dummy_name_set(&self) -> HashSet<&str> {
        self.dummy_names.iter().flatten().map(String::as_str).collect()
    }

    /// Check internal consistency, e.g. after deserialization.
    pub fn validate(&self) -> Result<(), EncoderError> {
        if self.dummy_cols.len() != self.dummy_prefix.len() {
            return Err(EncoderError::InvalidState(format!(
                "{} multi-valued columns but {} prefixes",
                self.dummy_cols.len(),
                self.dummy_prefix.len()
            )));
        }
        if self.dummy_cols.len() != self.dummy_names.len() {
            return Err(EncoderError::InvalidState(format!(
                "{} multi-valued columns but {} dummy blocks",
                self.dummy_cols.len(),
                self.dummy_names.len()
            )));
        }

        let mut seen = HashSet::new();
        for name in &self.columns {
            if !seen.insert(name.as_str()) {
                return Err(EncoderError::InvalidState(format!(
                    "duplicate output column '{}'",
                    name
                )));
            }
        }

        let mut prefixes = HashSet::new();
        for prefix in &self.dummy_prefix {
            if !prefixes.insert(prefix.as_str()) {
                return Err(EncoderError::InvalidState(format!(
                    "duplicate prefix '{}'",
                    prefix
                )));
            }
        }

        if let Some(col) = self.dummy_cols.iter().find(|c| seen.contains(c.as_str())) {
            return Err(EncoderError::InvalidState(format!(
                "multi-valued column '{}' also appears in the output schema",
                col
            )));
        }

        let mut generated = HashSet::new();
        for name in self.dummy_names.iter().flatten() {
            if !seen.contains(name.as_str()) {
                return Err(EncoderError::InvalidState(format!(
                    "dummy column '{}' is not in the output schema",
                    name
                )));
            }
            if !generated.insert(name.as_str()) {
                return Err(EncoderError::InvalidState(format!(
                    "dummy column '{}' belongs to more than one block",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Encode `df` onto the frozen schema.
    ///
    /// The result always has exactly [`FittedEncoder::columns`], in order.
    /// Tokens unseen at fit time are dropped; tokens absent from the input
    /// produce zero-filled columns.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame, EncoderError> {
        let height = df.height();
        let dummies = self.dummy_name_set();

        // Only pass-through names are taken from the input. Dummy names are
        // produced from their source column or zero-filled, never copied.
        let mut available: HashMap<String, Column> = HashMap::new();
        for name in self.passthrough_columns() {
            if let Ok(column) = df.column(name) {
                available.insert(name.to_string(), column.clone());
            }
        }

        let mut unseen: Vec<String> = Vec::new();
        for ((source, prefix), block) in self
            .dummy_cols
            .iter()
            .zip(&self.dummy_prefix)
            .zip(&self.dummy_names)
        {
            let column = df
                .column(source)
                .map_err(|_| EncoderError::MissingColumn(source.clone()))?;
            let values = text_values(column)?;
            for (name, cells) in dummy_block(&values, prefix, self.data_sep, self.name_sep) {
                if block.contains(&name) {
                    available.insert(name.clone(), Column::new(name.into(), cells));
                } else {
                    unseen.push(name);
                }
            }
        }

        if !unseen.is_empty() {
            debug!(dropped = ?unseen, "Dropped dummy columns for tokens unseen at fit time");
        }

        // Reconcile onto the frozen schema
        let mut zero_filled: Vec<&str> = Vec::new();
        let mut output: Vec<Column> = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            match available.remove(name) {
                Some(column) => output.push(column),
                None => {
                    zero_filled.push(name);
                    output.push(Column::new(name.as_str().into(), vec![0i32; height]));
                }
            }
        }

        if !zero_filled.is_empty() {
            let (absent_dummies, passthrough): (Vec<&str>, Vec<&str>) =
                zero_filled.into_iter().partition(|name| dummies.contains(name));
            if !absent_dummies.is_empty() {
                debug!(columns = ?absent_dummies, "Zero-filled dummy columns for absent tokens");
            }
            if !passthrough.is_empty() {
                warn!(columns = ?passthrough, "Input is missing pass-through columns; zero-filled");
            }
        }

        Ok(DataFrame::new(output)?)
    }
}

/// Derive the namespace prefix for a multi-valued column.
///
/// Names containing the word separator take the first character of each
/// word (`Type_of_Loan` becomes `ToL`); other names take their first two
/// characters. Empty words are skipped.
pub fn derive_prefix(column: &str, name_sep: char) -> String {
    if column.contains(name_sep) {
        column
            .split(name_sep)
            .filter_map(|word| word.chars().next())
            .collect()
    } else {
        column.chars().take(2).collect()
    }
}

/// Name of the dummy column for `token` under `prefix`
pub fn dummy_name(prefix: &str, name_sep: char, token: &str) -> String {
    format!("{}{}{}", prefix, name_sep, token)
}

/// Split a value into its non-empty tokens
pub fn split_tokens(value: &str, sep: char) -> impl Iterator<Item = &str> {
    value.split(sep).filter(|token| !token.is_empty())
}

/// Read a column as text, casting non-text columns.
pub(crate) fn text_values(column: &Column) -> PolarsResult<StringChunked> {
    match column.dtype() {
        DataType::String => Ok(column.str()?.clone()),
        _ => Ok(column.cast(&DataType::String)?.str()?.clone()),
    }
}

/// One `(name, cells)` pair per distinct token, tokens in sorted order.
/// Null values contribute no tokens.
fn dummy_block(
    values: &StringChunked,
    prefix: &str,
    data_sep: char,
    name_sep: char,
) -> Vec<(String, Vec<i32>)> {
    let rows: Vec<HashSet<&str>> = values
        .into_iter()
        .map(|value| {
            value
                .map(|v| split_tokens(v, data_sep).collect())
                .unwrap_or_default()
        })
        .collect();

    let vocabulary: BTreeSet<&str> = rows.iter().flatten().copied().collect();

    vocabulary
        .into_iter()
        .map(|token| {
            let cells = rows.iter().map(|tokens| tokens.contains(token) as i32).collect();
            (dummy_name(prefix, name_sep, token), cells)
        })
        .collect()
}
