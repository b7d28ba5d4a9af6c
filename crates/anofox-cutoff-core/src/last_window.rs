//! Forecasters that predict from the trailing window of observations.
//!
//! A [`LastWindowForecaster`] slices the `window_length` observations ending
//! at the cutoff and hands them to a [`LastWindowModel`]. In-sample
//! predictions are produced by walking a one-step-ahead forecast over
//! synthetic cutoffs inside the observation horizon.

use crate::error::{ForecastError, Result};
use crate::forecaster::{Forecaster, ForecasterCore, PredictOptions};
use crate::formatting::Prediction;
use crate::horizon::{offset, ForecastingHorizon, HorizonPolicy};
use crate::series::{ExogenousData, Series};
use crate::splitter::{ManualWindowSplitter, SlidingWindowSplitter, Splitter};
use crate::validation::check_window_length;
use std::fmt;
use tracing::warn;

/// Numeric engine behind a [`LastWindowForecaster`].
pub trait LastWindowModel: fmt::Debug {
    fn name(&self) -> &str;

    /// How the engine accepts its forecasting horizon.
    fn horizon_policy(&self) -> HorizonPolicy {
        HorizonPolicy::Optional
    }

    /// Window length used when none is declared.
    fn default_window_length(&self) -> usize {
        1
    }

    /// Train on the full training series. `fh` is the horizon known at fit
    /// time, if any.
    fn fit(
        &mut self,
        _y: &Series,
        _window_length: usize,
        _fh: Option<&ForecastingHorizon>,
        _exog: Option<&ExogenousData>,
    ) -> Result<()> {
        Ok(())
    }

    /// Predict from a complete window.
    ///
    /// `steps` are zero-based (`0` is one step after the window) and sorted;
    /// one value must be returned per step.
    fn predict_from_window(
        &self,
        window: &[f64],
        steps: &[usize],
        exog: Option<&ExogenousData>,
    ) -> Result<Vec<f64>>;
}

impl<M: LastWindowModel + ?Sized> LastWindowModel for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn horizon_policy(&self) -> HorizonPolicy {
        (**self).horizon_policy()
    }

    fn default_window_length(&self) -> usize {
        (**self).default_window_length()
    }

    fn fit(
        &mut self,
        y: &Series,
        window_length: usize,
        fh: Option<&ForecastingHorizon>,
        exog: Option<&ExogenousData>,
    ) -> Result<()> {
        (**self).fit(y, window_length, fh, exog)
    }

    fn predict_from_window(
        &self,
        window: &[f64],
        steps: &[usize],
        exog: Option<&ExogenousData>,
    ) -> Result<Vec<f64>> {
        (**self).predict_from_window(window, steps, exog)
    }
}

/// Forecaster predicting from the last window of observations.
#[derive(Debug)]
pub struct LastWindowForecaster<M: LastWindowModel> {
    core: ForecasterCore,
    model: M,
    window_length: Option<usize>,
    resolved_window_length: Option<usize>,
}

impl<M: LastWindowModel> LastWindowForecaster<M> {
    /// Wrap `model`; `window_length` falls back to the model's default at
    /// fit time.
    pub fn new(model: M, window_length: Option<usize>) -> Result<Self> {
        let window_length = window_length.map(check_window_length).transpose()?;
        let core = ForecasterCore::new(model.name(), model.horizon_policy());
        Ok(Self {
            core,
            model,
            window_length,
            resolved_window_length: None,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Window length as declared at construction.
    pub fn window_length(&self) -> Option<usize> {
        self.window_length
    }

    /// Window length resolved at fit.
    pub fn fitted_window_length(&self) -> Result<usize> {
        self.resolved_window_length.ok_or_else(|| {
            ForecastError::NotFitted(format!(
                "The window length of {} is resolved by `fit`",
                self.core.name()
            ))
        })
    }

    /// Observations in `[cutoff - window_length + 1, cutoff]`.
    pub fn last_window(&self) -> Result<Series> {
        let window_length = self.fitted_window_length()?;
        let cutoff = self.core.state().cutoff()?;
        self.window_ending_at(cutoff, window_length)
    }

    fn window_ending_at(&self, cutoff: i64, window_length: usize) -> Result<Series> {
        let oh = self.core.state().observation_horizon();
        if oh.len() < window_length {
            return Err(ForecastError::InsufficientData {
                needed: window_length,
                got: oh.len(),
            });
        }
        let start = offset(cutoff, 1 - window_length as i64)?;
        Ok(oh.loc(start, cutoff))
    }

    /// Placeholder predictions for horizons that cannot be computed.
    pub fn predict_nan(&self, fh: &ForecastingHorizon) -> Result<Series> {
        nan_series(fh, self.core.state().cutoff()?)
    }

    /// Predict out-of-sample steps from the window ending at the cutoff.
    pub fn predict_fixed_cutoff(
        &self,
        fh: &ForecastingHorizon,
        exog: Option<&ExogenousData>,
    ) -> Result<Series> {
        let cutoff = self.core.state().cutoff()?;
        let window_length = self.fitted_window_length()?;
        let window = self.window_ending_at(cutoff, window_length)?;

        if window.len() < window_length || window.values().iter().any(|v| v.is_nan()) {
            warn!(
                forecaster = self.core.name(),
                cutoff,
                window = window.len(),
                window_length,
                "incomplete last window, predicting NaN"
            );
            return nan_series(fh, cutoff);
        }

        // Resolve the target index before the engine sees the steps
        let index = fh.to_absolute(cutoff)?;
        let fh = fh.sorted();
        let steps = fh
            .to_array_index()?
            .into_iter()
            .map(|i| {
                usize::try_from(i).map_err(|_| {
                    ForecastError::OutOfBounds(format!(
                        "Step {} is not after the cutoff",
                        i + 1
                    ))
                })
            })
            .collect::<Result<Vec<usize>>>()?;

        let values = self
            .model
            .predict_from_window(window.values(), &steps, exog)?;
        if values.len() != steps.len() {
            return Err(ForecastError::ComputationError(format!(
                "{} returned {} values for {} steps",
                self.model.name(),
                values.len(),
                steps.len()
            )));
        }

        Series::new(index, values)
    }

    /// Predict in-sample steps as one-step-ahead forecasts from the
    /// preceding observations.
    pub fn predict_in_sample(
        &mut self,
        fh: &ForecastingHorizon,
        exog: Option<&ExogenousData>,
    ) -> Result<Series> {
        let cutoff = self.core.state().cutoff()?;
        let oh = self.core.state().observation_horizon().clone();
        let position = oh.position(cutoff).ok_or_else(|| {
            ForecastError::OutOfBounds(format!(
                "Cutoff {} is not part of the observation horizon",
                cutoff
            ))
        })? as i64;

        // Each target is forecast one step ahead from the position before it
        let cutoffs = fh
            .iter()
            .map(|h| offset(position - 1, h))
            .collect::<Result<Vec<i64>>>()?;
        if let Some((h, _)) = fh.iter().zip(&cutoffs).find(|(_, c)| **c < 0) {
            return Err(ForecastError::OutOfBounds(format!(
                "In-sample step {} reaches before the first observation",
                h
            )));
        }

        let cv = ManualWindowSplitter::new(
            &cutoffs,
            ForecastingHorizon::single(1),
            Some(self.fitted_window_length()?),
        )?;
        self.predict_moving_cutoff(&oh, &cv, exog, false, &PredictOptions::default())?
            .into_series()
    }
}

fn nan_series(fh: &ForecastingHorizon, cutoff: i64) -> Result<Series> {
    let index = fh.to_absolute(cutoff)?;
    let values = vec![f64::NAN; index.len()];
    Series::new(index, values)
}

impl<M: LastWindowModel> Forecaster for LastWindowForecaster<M> {
    fn core(&self) -> &ForecasterCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ForecasterCore {
        &mut self.core
    }

    fn fit_engine(&mut self, y: &Series, exog: Option<&ExogenousData>) -> Result<()> {
        let window_length = check_window_length(
            self.window_length
                .unwrap_or_else(|| self.model.default_window_length()),
        )?;
        self.resolved_window_length = Some(window_length);
        self.model.fit(y, window_length, self.core.fh(), exog)
    }

    fn predict_horizon(
        &mut self,
        fh: &ForecastingHorizon,
        exog: Option<&ExogenousData>,
        options: &PredictOptions,
    ) -> Result<Prediction> {
        options.check()?;

        let series = match fh.partition() {
            (None, Some(oos)) => self.predict_fixed_cutoff(&oos, exog)?,
            (Some(ins), None) => self.predict_in_sample(&ins, exog)?,
            (Some(ins), Some(oos)) => {
                let in_sample = self.predict_in_sample(&ins, exog)?;
                let out_of_sample = self.predict_fixed_cutoff(&oos, exog)?;
                Series::concat(&[in_sample, out_of_sample])?
            }
            (None, None) => {
                return Err(ForecastError::InvalidInput(
                    "Forecasting horizon is empty".to_string(),
                ))
            }
        };
        Ok(Prediction::Series(series))
    }

    fn default_splitter(&self) -> Result<Box<dyn Splitter>> {
        let fh = self.core.stored_fh()?.clone();
        Ok(Box::new(SlidingWindowSplitter::new(
            fh,
            self.fitted_window_length()?,
        )?))
    }
}
