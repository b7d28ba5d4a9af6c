//! Input validation and coercion.
//!
//! Every value that crosses into the forecaster passes through one of these
//! checks first; downstream code only enforces temporal rules.

use crate::error::{ForecastError, Result};
use crate::horizon::ForecastingHorizon;
use crate::series::Series;

/// Build a validated series from raw index and values.
pub fn check_series(index: &[i64], values: &[f64]) -> Result<Series> {
    if values.iter().any(|v| v.is_infinite()) {
        return Err(ForecastError::InvalidInput(
            "Series values must be finite or missing (NaN)".to_string(),
        ));
    }
    Series::new(index.to_vec(), values.to_vec())
}

/// Check that `y` is usable as training or test data.
pub fn check_y(y: &Series, allow_empty: bool) -> Result<&Series> {
    if !allow_empty && y.is_empty() {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }
    Ok(y)
}

/// Validate a forecasting horizon: non-empty, distinct integer offsets.
pub fn check_fh(steps: &[i64]) -> Result<ForecastingHorizon> {
    if steps.is_empty() {
        return Err(ForecastError::invalid_parameter(
            "fh",
            "[]",
            "forecasting horizon must contain at least one step",
        ));
    }

    for (i, step) in steps.iter().enumerate() {
        if steps[..i].contains(step) {
            return Err(ForecastError::invalid_parameter(
                "fh",
                format!("{:?}", steps),
                format!("steps must be unique, {} appears more than once", step),
            ));
        }
    }

    Ok(ForecastingHorizon::from_checked(steps.to_vec()))
}

/// Validate a window length.
pub fn check_window_length(window_length: usize) -> Result<usize> {
    if window_length == 0 {
        return Err(ForecastError::invalid_parameter(
            "window_length",
            window_length,
            "must be a positive integer",
        ));
    }
    Ok(window_length)
}

/// Validate a splitter step length.
pub fn check_step_length(step_length: usize) -> Result<usize> {
    if step_length == 0 {
        return Err(ForecastError::invalid_parameter(
            "step_length",
            step_length,
            "must be a positive integer",
        ));
    }
    Ok(step_length)
}

/// Validate a confidence level for prediction intervals.
pub fn check_confidence_level(level: f64) -> Result<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(ForecastError::invalid_parameter(
            "confidence_level",
            level,
            "must lie strictly between 0 and 1",
        ));
    }
    Ok(level)
}

/// Validate manual cutoff positions; returns them sorted and deduplicated.
pub fn check_cutoffs(cutoffs: &[i64]) -> Result<Vec<i64>> {
    if cutoffs.is_empty() {
        return Err(ForecastError::invalid_parameter(
            "cutoffs",
            "[]",
            "at least one cutoff is required",
        ));
    }
    if let Some(c) = cutoffs.iter().find(|&&c| c < 0) {
        return Err(ForecastError::invalid_parameter(
            "cutoffs",
            c,
            "cutoff positions must be non-negative",
        ));
    }

    let mut sorted = cutoffs.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    Ok(sorted)
}
