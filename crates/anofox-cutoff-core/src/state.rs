//! Observation horizon and cutoff bookkeeping.

use crate::error::{ForecastError, Result};
use crate::series::Series;

/// Time state owned by a single forecaster.
///
/// The observation horizon accumulates every series passed to `fit` or
/// `update`. The cutoff is the time point forecasts are made from; it tracks
/// the last observed time point except while a simulation has detached it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemporalState {
    observed: Series,
    cutoff: Option<i64>,
}

impl TemporalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// All observations seen so far.
    pub fn observation_horizon(&self) -> &Series {
        &self.observed
    }

    /// Merge new observations and move the cutoff to their last time point.
    ///
    /// Empty series are ignored.
    pub fn observe(&mut self, y: &Series) {
        if let Some(last) = y.last_index() {
            self.observed = y.combine_first(&self.observed);
            self.cutoff = Some(last);
        }
    }

    /// The current cutoff.
    pub fn cutoff(&self) -> Result<i64> {
        self.cutoff.ok_or_else(|| {
            ForecastError::NotFitted(
                "No cutoff has been set yet, call `fit` before reading the cutoff".to_string(),
            )
        })
    }

    /// Force the cutoff to a given time point.
    pub fn set_cutoff(&mut self, cutoff: i64) {
        self.cutoff = Some(cutoff);
    }

    pub(crate) fn raw_cutoff(&self) -> Option<i64> {
        self.cutoff
    }

    pub(crate) fn restore_cutoff(&mut self, cutoff: Option<i64>) {
        self.cutoff = cutoff;
    }

    /// Forget all observations and the cutoff.
    pub fn reset(&mut self) {
        self.observed = Series::empty();
        self.cutoff = None;
    }
}
