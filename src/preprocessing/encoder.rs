//! Label encoding

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Classes learned by a [`LabelEncoder`], in code order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EncodedClasses {
    /// Sorted lexicographically
    Text(Vec<String>),
    /// Sorted numerically
    Numeric(Vec<f64>),
}

impl EncodedClasses {
    pub fn len(&self) -> usize {
        match self {
            EncodedClasses::Text(classes) => classes.len(),
            EncodedClasses::Numeric(classes) => classes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Maps the distinct values of one column to `0..n_classes`.
///
/// Codes follow the sorted order of the distinct values, so `["YES", "NO"]`
/// encodes as `NO -> 0`, `YES -> 1`. Nulls stay null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Option<EncodedClasses>,
}

impl LabelEncoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self { classes: None }
    }

    /// Learn the classes of a series
    pub fn fit(&mut self, series: &Series) -> Result<&mut Self> {
        let classes = if series.dtype() == &DataType::String {
            let ca = series
                .str()
                .map_err(|e| PipelineError::DataError(e.to_string()))?;
            let distinct: BTreeSet<&str> = ca.into_iter().flatten().collect();
            EncodedClasses::Text(distinct.into_iter().map(|s| s.to_string()).collect())
        } else {
            let as_f64 = series
                .cast(&DataType::Float64)
                .map_err(|e| PipelineError::DataError(e.to_string()))?;
            let mut values: Vec<f64> = as_f64
                .f64()
                .map_err(|e| PipelineError::DataError(e.to_string()))?
                .into_iter()
                .flatten()
                .filter(|v| !v.is_nan())
                .collect();
            values.sort_by(|a, b| a.total_cmp(b));
            values.dedup();
            EncodedClasses::Numeric(values)
        };

        self.classes = Some(classes);
        Ok(self)
    }

    /// Replace every value with its class code
    pub fn transform(&self, series: &Series) -> Result<Series> {
        let classes = self.classes.as_ref().ok_or(PipelineError::ModelNotFitted)?;
        let name = series.name().clone();

        let codes: Vec<Option<i64>> = match classes {
            EncodedClasses::Text(classes) => {
                let ca = series
                    .str()
                    .map_err(|e| PipelineError::DataError(e.to_string()))?;
                ca.into_iter()
                    .map(|value| match value {
                        None => Ok(None),
                        Some(v) => classes
                            .binary_search_by(|c| c.as_str().cmp(v))
                            .map(|idx| Some(idx as i64))
                            .map_err(|_| unseen_label(&name, v)),
                    })
                    .collect::<Result<_>>()?
            }
            EncodedClasses::Numeric(classes) => {
                let as_f64 = series
                    .cast(&DataType::Float64)
                    .map_err(|e| PipelineError::DataError(e.to_string()))?;
                as_f64
                    .f64()
                    .map_err(|e| PipelineError::DataError(e.to_string()))?
                    .into_iter()
                    .map(|value| match value {
                        None => Ok(None),
                        Some(v) if v.is_nan() => Ok(None),
                        Some(v) => classes
                            .binary_search_by(|c| c.total_cmp(&v))
                            .map(|idx| Some(idx as i64))
                            .map_err(|_| unseen_label(&name, &v.to_string())),
                    })
                    .collect::<Result<_>>()?
            }
        };

        Ok(Series::new(name, codes))
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, series: &Series) -> Result<Series> {
        self.fit(series)?;
        self.transform(series)
    }

    /// Learned classes, if fitted
    pub fn classes(&self) -> Option<&EncodedClasses> {
        self.classes.as_ref()
    }
}

fn unseen_label(column: &PlSmallStr, value: &str) -> PipelineError {
    PipelineError::PreprocessingError(format!(
        "column '{}' contains previously unseen label '{}'",
        column, value
    ))
}

/// Label-encode each listed column that exists in the table.
///
/// Absent columns are skipped without error. One encoder is refit per
/// column.
pub fn encode_categoricals(mut df: DataFrame, columns: &[String]) -> Result<DataFrame> {
    let mut encoder = LabelEncoder::new();

    for name in columns {
        let series = match df.column(name) {
            Ok(column) => column.as_materialized_series().clone(),
            Err(_) => {
                debug!(column = %name, "categorical column absent, skipping encoding");
                continue;
            }
        };

        let encoded = encoder.fit_transform(&series)?;
        debug!(column = %name, n_classes = encoder.classes().map_or(0, |c| c.len()), "label encoded");
        df.with_column(encoded)?;
    }

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_encoding_sorted_order() {
        let series = Series::new("LUNG_CANCER".into(), &["YES", "NO", "YES", "NO"]);
        let mut encoder = LabelEncoder::new();
        let encoded = encoder.fit_transform(&series).unwrap();

        let codes: Vec<Option<i64>> = encoded.i64().unwrap().into_iter().collect();
        assert_eq!(codes, vec![Some(1), Some(0), Some(1), Some(0)]);
        assert_eq!(
            encoder.classes(),
            Some(&EncodedClasses::Text(vec!["NO".to_string(), "YES".to_string()]))
        );
    }

    #[test]
    fn test_label_encoding_numeric_column() {
        let series = Series::new("GENDER".into(), &[10i64, 2, 10, 7]);
        let mut encoder = LabelEncoder::new();
        let encoded = encoder.fit_transform(&series).unwrap();

        let codes: Vec<Option<i64>> = encoded.i64().unwrap().into_iter().collect();
        assert_eq!(codes, vec![Some(2), Some(0), Some(2), Some(1)]);
    }

    #[test]
    fn test_transform_unseen_label() {
        let mut encoder = LabelEncoder::new();
        encoder.fit(&Series::new("G".into(), &["M", "F"])).unwrap();

        let result = encoder.transform(&Series::new("G".into(), &["X"]));
        assert!(matches!(result, Err(PipelineError::PreprocessingError(_))));
    }

    #[test]
    fn test_transform_before_fit() {
        let encoder = LabelEncoder::new();
        let result = encoder.transform(&Series::new("G".into(), &["M"]));
        assert!(matches!(result, Err(PipelineError::ModelNotFitted)));
    }

    #[test]
    fn test_encode_categoricals_skips_absent_columns() {
        let df = df!(
            "AGE" => &[60i64, 70],
            "ANXIETY" => &[1i64, 2]
        )
        .unwrap();

        let columns = vec!["GENDER".to_string(), "LUNG_CANCER".to_string()];
        let encoded = encode_categoricals(df.clone(), &columns).unwrap();
        assert!(encoded.equals(&df));
    }

    #[test]
    fn test_encode_categoricals_present_column() {
        let df = df!(
            "GENDER" => &["M", "F", "M"],
            "AGE" => &[60i64, 70, 65]
        )
        .unwrap();

        let columns = vec!["GENDER".to_string(), "LUNG_CANCER".to_string()];
        let encoded = encode_categoricals(df, &columns).unwrap();
        let gender: Vec<Option<i64>> = encoded
            .column("GENDER")
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(gender, vec![Some(1), Some(0), Some(1)]);
    }
}
