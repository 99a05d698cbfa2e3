//! Evaluation metrics

use crate::error::{PipelineError, Result};
use ndarray::Array1;

/// Fraction of predictions matching the true labels
pub fn accuracy_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::ShapeError {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    if y_true.is_empty() {
        return Err(PipelineError::ValidationError(
            "accuracy is undefined for an empty set".to_string(),
        ));
    }

    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t - *p).abs() < 0.5)
        .count();

    Ok(correct as f64 / y_true.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy() {
        let y_true = array![0.0, 1.0, 1.0, 0.0];
        let y_pred = array![0.0, 1.0, 0.0, 0.0];
        assert_eq!(accuracy_score(&y_true, &y_pred).unwrap(), 0.75);
    }

    #[test]
    fn test_accuracy_errors() {
        assert!(accuracy_score(&array![1.0], &array![1.0, 0.0]).is_err());
        assert!(accuracy_score(&Array1::zeros(0), &Array1::zeros(0)).is_err());
    }
}
