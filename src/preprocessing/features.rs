//! Feature selection, the interaction feature and label separation

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;

use super::config::InteractionFeature;
use super::{column_names, numeric_values};

/// Numeric feature matrix with its label vector
#[derive(Debug, Clone)]
pub struct FeatureSet {
    /// Row-major features
    pub x: Array2<f64>,
    /// Integer class labels
    pub y: Array1<i64>,
    /// Feature names in column order
    pub feature_names: Vec<String>,
    /// Name of the label column
    pub target_name: String,
}

impl FeatureSet {
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }
}

/// Drop the given columns and append the interaction feature.
///
/// Every column in `drop_columns` must exist.
pub fn engineer_features(
    df: &DataFrame,
    drop_columns: &[String],
    interaction: &InteractionFeature,
) -> Result<DataFrame> {
    let mut result = df.clone();
    for name in drop_columns {
        result = result
            .drop(name)
            .map_err(|_| PipelineError::FeatureNotFound(name.clone()))?;
    }

    let left = numeric_values(&result, &interaction.left)?;
    let right = numeric_values(&result, &interaction.right)?;

    let product: Vec<Option<f64>> = left
        .iter()
        .zip(right.iter())
        .map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => Some(a * b),
            _ => None,
        })
        .collect();

    result.with_column(Series::new(interaction.name.as_str().into(), product))?;
    Ok(result)
}

/// Separate the label column from the features.
///
/// Labels must be integral and every feature cell numeric and present.
pub fn split_features_target(df: &DataFrame, target: &str) -> Result<FeatureSet> {
    let labels = numeric_values(df, target)?;
    let y: Array1<i64> = labels
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(v) if v.fract() == 0.0 => Ok(v as i64),
            Some(v) => Err(PipelineError::PreprocessingError(format!(
                "label '{}' has non-integer value {} at row {}",
                target, v, row
            ))),
            None => Err(PipelineError::PreprocessingError(format!(
                "label '{}' is missing at row {}",
                target, row
            ))),
        })
        .collect::<Result<_>>()?;

    let feature_names: Vec<String> = column_names(df)
        .into_iter()
        .filter(|name| name != target)
        .collect();

    let col_data: Vec<Vec<f64>> = feature_names
        .iter()
        .map(|name| {
            numeric_values(df, name)?
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    value.filter(|v| !v.is_nan()).ok_or_else(|| {
                        PipelineError::PreprocessingError(format!(
                            "feature '{}' is missing at row {}",
                            name, row
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<_>>()?;

    let n_rows = df.height();
    let x = Array2::from_shape_fn((n_rows, feature_names.len()), |(r, c)| col_data[c][r]);

    Ok(FeatureSet {
        x,
        y,
        feature_names,
        target_name: target.to_string(),
    })
}
