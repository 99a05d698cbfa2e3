//! Row-level and cell-level cleaning

use crate::error::{PipelineError, Result};
use polars::prelude::*;

use super::column_names;

/// Remove exact duplicate rows, keeping the first occurrence in order.
pub fn drop_duplicates(df: &DataFrame) -> Result<DataFrame> {
    if df.height() == 0 {
        return Ok(df.clone());
    }
    Ok(df.unique_stable(None, UniqueKeepStrategy::First, None)?)
}

/// Replace the literal strings `"YES"` and `"NO"` in every string column.
///
/// The substitution is not scoped to any particular column. A string column
/// whose cells all parse as numbers afterwards becomes numeric (`Int64`
/// when every value is integral, `Float64` otherwise).
pub fn replace_yes_no(mut df: DataFrame, yes_value: i64, no_value: i64) -> Result<DataFrame> {
    let yes = yes_value.to_string();
    let no = no_value.to_string();

    for name in column_names(&df) {
        let series = df.column(&name)?.as_materialized_series().clone();
        if series.dtype() != &DataType::String {
            continue;
        }

        let ca = series
            .str()
            .map_err(|e| PipelineError::DataError(e.to_string()))?;

        let replaced: Vec<Option<String>> = ca
            .into_iter()
            .map(|value| {
                value.map(|v| match v {
                    "YES" => yes.clone(),
                    "NO" => no.clone(),
                    other => other.to_string(),
                })
            })
            .collect();

        df.with_column(coerce_numeric(series.name().clone(), replaced))?;
    }

    Ok(df)
}

/// Build a numeric series when every present value parses, else keep text.
fn coerce_numeric(name: PlSmallStr, values: Vec<Option<String>>) -> Series {
    let parsed: Option<Vec<Option<f64>>> = values
        .iter()
        .map(|value| match value {
            None => Some(None),
            Some(v) => v.trim().parse::<f64>().ok().map(Some),
        })
        .collect();

    match parsed {
        Some(numbers) if numbers.iter().flatten().all(|v| v.fract() == 0.0) => {
            let ints: Vec<Option<i64>> = numbers.into_iter().map(|v| v.map(|x| x as i64)).collect();
            Series::new(name, ints)
        }
        Some(numbers) => Series::new(name, numbers),
        None => Series::new(name, values),
    }
}
