//! Shaping of walk-forward predictions.

use crate::error::{ForecastError, Result};
use crate::series::Series;

/// Output of a prediction call.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// One continuous series keyed by absolute time.
    Series(Series),
    /// One column per simulated cutoff.
    Table(PredictionTable),
}

impl Prediction {
    pub fn as_series(&self) -> Option<&Series> {
        match self {
            Prediction::Series(s) => Some(s),
            Prediction::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&PredictionTable> {
        match self {
            Prediction::Series(_) => None,
            Prediction::Table(t) => Some(t),
        }
    }

    /// Unwrap the series form, failing for tables.
    pub fn into_series(self) -> Result<Series> {
        match self {
            Prediction::Series(s) => Ok(s),
            Prediction::Table(t) => Err(ForecastError::Format(format!(
                "Expected a single series but got a table with {} columns",
                t.n_columns()
            ))),
        }
    }
}

/// Predictions from several cutoffs, one column each.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionTable {
    cutoffs: Vec<i64>,
    columns: Vec<Series>,
}

impl PredictionTable {
    pub fn cutoffs(&self) -> &[i64] {
        &self.cutoffs
    }

    pub fn columns(&self) -> &[Series] {
        &self.columns
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of predictions per cutoff.
    pub fn n_rows(&self) -> usize {
        self.columns.first().map(Series::len).unwrap_or(0)
    }

    /// Column produced at `cutoff`.
    pub fn column(&self, cutoff: i64) -> Option<&Series> {
        self.cutoffs
            .iter()
            .position(|&c| c == cutoff)
            .map(|i| &self.columns[i])
    }
}

/// Collapse per-step predictions into their final shape.
///
/// When every step produced a single value, the steps are joined into one
/// series. Otherwise each step becomes a column keyed by its cutoff, and a
/// table with a single column collapses back to a series.
pub fn format_moving_cutoff_predictions(
    predictions: Vec<Series>,
    cutoffs: Vec<i64>,
) -> Result<Prediction> {
    if predictions.is_empty() {
        return Err(ForecastError::Format(
            "No predictions were produced, the splitter yielded no windows".to_string(),
        ));
    }
    if predictions.len() != cutoffs.len() {
        return Err(ForecastError::Format(format!(
            "Got {} prediction sets for {} cutoffs",
            predictions.len(),
            cutoffs.len()
        )));
    }

    if predictions.iter().all(|p| p.len() == 1) {
        return Series::concat(&predictions).map(Prediction::Series);
    }

    let n_rows = predictions[0].len();
    if let Some(ragged) = predictions.iter().find(|p| p.len() != n_rows) {
        return Err(ForecastError::Format(format!(
            "Prediction sets have different lengths ({} and {})",
            n_rows,
            ragged.len()
        )));
    }

    let mut columns = predictions;
    if columns.len() == 1 {
        return Ok(Prediction::Series(columns.remove(0)));
    }

    Ok(Prediction::Table(PredictionTable { cutoffs, columns }))
}
