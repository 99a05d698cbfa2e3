//! Data preprocessing module
//!
//! Turns the raw survey table into a numeric feature matrix:
//! - Exact-duplicate row removal
//! - Label encoding of categorical columns (sklearn ordering)
//! - Table-wide YES/NO recoding
//! - Irrelevant-feature removal and the interaction feature
//! - Separation of the label column

mod config;
mod encoder;
mod cleaning;
mod features;
mod pipeline;

pub use config::{PreprocessingConfig, InteractionFeature};
pub use encoder::{LabelEncoder, EncodedClasses, encode_categoricals};
pub use cleaning::{drop_duplicates, replace_yes_no};
pub use features::{engineer_features, split_features_target, FeatureSet};
pub use pipeline::Preprocessor;

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::collections::BTreeMap;

/// Label column of the survey
pub const TARGET_COLUMN: &str = "LUNG_CANCER";

/// Columns recoded by the label encoder when present
pub const CATEGORICAL_COLUMNS: [&str; 2] = ["GENDER", "LUNG_CANCER"];

/// Columns dropped before training
pub const IRRELEVANT_FEATURES: [&str; 4] = ["GENDER", "AGE", "SMOKING", "SHORTNESS OF BREATH"];

/// Read a column as optional f64 values.
///
/// String columns are rejected rather than silently cast to nulls.
pub(crate) fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| PipelineError::FeatureNotFound(name.to_string()))?;
    let series = column.as_materialized_series();

    if series.dtype() == &DataType::String {
        return Err(PipelineError::PreprocessingError(format!(
            "column '{}' is not numeric",
            name
        )));
    }

    let as_f64 = series
        .cast(&DataType::Float64)
        .map_err(|e| PipelineError::DataError(e.to_string()))?;

    let values = as_f64
        .f64()
        .map_err(|e| PipelineError::DataError(e.to_string()))?
        .into_iter()
        .collect();

    Ok(values)
}

/// Count of each distinct value in a column, rendered as text.
/// Nulls are counted under `"null"`.
pub fn label_distribution(df: &DataFrame, name: &str) -> Result<BTreeMap<String, usize>> {
    let column = df
        .column(name)
        .map_err(|_| PipelineError::FeatureNotFound(name.to_string()))?;
    let rendered = column
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(|e| PipelineError::DataError(e.to_string()))?;

    let mut counts = BTreeMap::new();
    for value in rendered
        .str()
        .map_err(|e| PipelineError::DataError(e.to_string()))?
        .into_iter()
    {
        *counts.entry(value.unwrap_or("null").to_string()).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Column names in table order
pub(crate) fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}
