//! Hold-out accuracy metrics.

use crate::error::{AppError, Result};

/// Root mean squared error between `actual` and `predicted`.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64;
    Ok(mse.sqrt())
}

/// Coefficient of determination.
///
/// Returns `None` for fewer than two samples. A constant `actual` scores
/// `1.0` when predicted exactly and `0.0` otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> Result<Option<f64>> {
    check_lengths(actual, predicted)?;
    if actual.len() < 2 {
        return Ok(None);
    }

    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(Some(if ss_res == 0.0 { 1.0 } else { 0.0 }));
    }
    Ok(Some(1.0 - ss_res / ss_tot))
}

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.is_empty() {
        return Err(AppError::Model("cannot score an empty hold-out set".into()));
    }
    if actual.len() != predicted.len() {
        return Err(AppError::Model(format!(
            "expected {} predictions, got {}",
            actual.len(),
            predicted.len()
        )));
    }
    Ok(())
}
