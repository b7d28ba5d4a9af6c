//! Numeric engines for last-window forecasting.

use crate::error::{ForecastError, Result};
use crate::horizon::{ForecastingHorizon, HorizonPolicy};
use crate::last_window::LastWindowModel;
use crate::series::{ExogenousData, Series};
use crate::splitter::DEFAULT_WINDOW_LENGTH;

use anofox_forecast::models::exponential::{ETSSpec, ETS as ETSModel};
use anofox_forecast::prelude::Forecaster as _;
use anofox_regression::prelude::*;

/// How a naive forecast summarises the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaiveStrategy {
    /// Repeat the last observation.
    Last,
    /// Repeat the window mean.
    Mean,
    /// Repeat the last full season of length `sp`.
    SeasonalLast { sp: usize },
}

/// Naive forecasts from the last window.
#[derive(Debug, Clone, PartialEq)]
pub struct NaiveModel {
    strategy: NaiveStrategy,
}

impl NaiveModel {
    pub fn new(strategy: NaiveStrategy) -> Result<Self> {
        if let NaiveStrategy::SeasonalLast { sp: 0 } = strategy {
            return Err(ForecastError::invalid_parameter(
                "seasonal_period",
                0,
                "must be a positive integer",
            ));
        }
        Ok(Self { strategy })
    }

    pub fn strategy(&self) -> NaiveStrategy {
        self.strategy
    }
}

impl LastWindowModel for NaiveModel {
    fn name(&self) -> &str {
        match self.strategy {
            NaiveStrategy::Last => "Naive",
            NaiveStrategy::Mean => "SMA",
            NaiveStrategy::SeasonalLast { .. } => "SeasonalNaive",
        }
    }

    fn default_window_length(&self) -> usize {
        match self.strategy {
            NaiveStrategy::Last => 1,
            NaiveStrategy::Mean => DEFAULT_WINDOW_LENGTH,
            NaiveStrategy::SeasonalLast { sp } => sp,
        }
    }

    fn fit(
        &mut self,
        _y: &Series,
        window_length: usize,
        _fh: Option<&ForecastingHorizon>,
        _exog: Option<&ExogenousData>,
    ) -> Result<()> {
        if let NaiveStrategy::SeasonalLast { sp } = self.strategy {
            if window_length < sp {
                return Err(ForecastError::invalid_parameter(
                    "window_length",
                    window_length,
                    format!("must cover at least one season of length {}", sp),
                ));
            }
        }
        Ok(())
    }

    fn predict_from_window(
        &self,
        window: &[f64],
        steps: &[usize],
        _exog: Option<&ExogenousData>,
    ) -> Result<Vec<f64>> {
        let n = window.len();
        if n == 0 {
            return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
        }

        let values = match self.strategy {
            NaiveStrategy::Last => vec![window[n - 1]; steps.len()],
            NaiveStrategy::Mean => {
                let mean = window.iter().sum::<f64>() / n as f64;
                vec![mean; steps.len()]
            }
            NaiveStrategy::SeasonalLast { sp } => {
                let p = sp.min(n);
                let last_season = &window[n - p..];
                steps.iter().map(|&s| last_season[s % p]).collect()
            }
        };
        Ok(values)
    }
}

/// Random walk with drift estimated over the window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriftModel;

impl LastWindowModel for DriftModel {
    fn name(&self) -> &str {
        "RandomWalkDrift"
    }

    fn default_window_length(&self) -> usize {
        DEFAULT_WINDOW_LENGTH
    }

    fn fit(
        &mut self,
        _y: &Series,
        window_length: usize,
        _fh: Option<&ForecastingHorizon>,
        _exog: Option<&ExogenousData>,
    ) -> Result<()> {
        if window_length < 2 {
            return Err(ForecastError::invalid_parameter(
                "window_length",
                window_length,
                "drift needs at least two observations",
            ));
        }
        Ok(())
    }

    fn predict_from_window(
        &self,
        window: &[f64],
        steps: &[usize],
        _exog: Option<&ExogenousData>,
    ) -> Result<Vec<f64>> {
        let n = window.len();
        if n < 2 {
            return Err(ForecastError::InsufficientData { needed: 2, got: n });
        }

        let last = window[n - 1];
        let drift = (last - window[0]) / (n - 1) as f64;
        Ok(steps
            .iter()
            .map(|&s| last + drift * (s + 1) as f64)
            .collect())
    }
}

/// Simple exponential smoothing over the window.
#[derive(Debug, Clone, PartialEq)]
pub struct SesModel {
    alpha: f64,
}

impl SesModel {
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ForecastError::invalid_parameter(
                "alpha",
                alpha,
                "smoothing parameter must lie in (0, 1]",
            ));
        }
        Ok(Self { alpha })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl LastWindowModel for SesModel {
    fn name(&self) -> &str {
        "SES"
    }

    fn default_window_length(&self) -> usize {
        DEFAULT_WINDOW_LENGTH
    }

    fn predict_from_window(
        &self,
        window: &[f64],
        steps: &[usize],
        _exog: Option<&ExogenousData>,
    ) -> Result<Vec<f64>> {
        let (&first, rest) = window
            .split_first()
            .ok_or(ForecastError::InsufficientData { needed: 1, got: 0 })?;

        let level = rest
            .iter()
            .fold(first, |level, &v| self.alpha * v + (1.0 - self.alpha) * level);
        Ok(vec![level; steps.len()])
    }
}

/// Validate ETS notation: `[E][T][S]` or `[E][T]d[S]`, e.g. `AAA`, `MNM`, `AAdA`.
fn is_valid_ets_notation(notation: &str) -> bool {
    let chars: Vec<char> = notation.chars().collect();
    let error_ok = |c: char| c == 'A' || c == 'M';
    let component_ok = |c: char| c == 'A' || c == 'M' || c == 'N';

    match chars.as_slice() {
        [e, t, s] => error_ok(*e) && component_ok(*t) && component_ok(*s),
        [e, t, 'd', s] => error_ok(*e) && error_ok(*t) && component_ok(*s),
        _ => false,
    }
}

/// ETS state-space model refitted on every window.
#[derive(Debug, Clone)]
pub struct EtsModel {
    spec: ETSSpec,
    period: usize,
}

impl EtsModel {
    /// Parse an ETS specification such as `"AAN"` or `"AAdA"`.
    pub fn new(notation: &str, period: usize) -> Result<Self> {
        if !is_valid_ets_notation(notation) {
            return Err(ForecastError::InvalidInput(format!(
                "Invalid ETS model specification '{}'. \
                 Expected format: ETS notation like 'AAA', 'MNM', 'AAdA' where \
                 E=Error (A/M), T=Trend (A/M/N, optionally with 'd' for damped), S=Seasonal (A/M/N).",
                notation
            )));
        }

        let spec = ETSSpec::from_notation(notation).map_err(|e| {
            ForecastError::InvalidInput(format!(
                "Invalid ETS model specification '{}': {}",
                notation, e
            ))
        })?;

        if !spec.is_valid() {
            return Err(ForecastError::InvalidInput(format!(
                "ETS model specification '{}' is unstable (per FPP3 taxonomy). \
                 MAA and MAdA combinations are not allowed.",
                notation
            )));
        }

        Ok(Self { spec, period })
    }

    fn seasonal_period(&self) -> usize {
        if self.spec.has_seasonal() && self.period > 1 {
            self.period
        } else {
            1
        }
    }
}

impl LastWindowModel for EtsModel {
    fn name(&self) -> &str {
        "ETS"
    }

    fn default_window_length(&self) -> usize {
        (2 * self.seasonal_period()).max(DEFAULT_WINDOW_LENGTH)
    }

    fn predict_from_window(
        &self,
        window: &[f64],
        steps: &[usize],
        _exog: Option<&ExogenousData>,
    ) -> Result<Vec<f64>> {
        use anofox_forecast::core::TimeSeriesBuilder;

        let horizon = steps.iter().max().map(|&s| s + 1).unwrap_or(0);
        if horizon == 0 {
            return Ok(Vec::new());
        }

        let time_series = TimeSeriesBuilder::new()
            .values(window.to_vec())
            .build()
            .map_err(|e| {
                ForecastError::ComputationError(format!("Failed to build TimeSeries: {}", e))
            })?;

        let mut model = ETSModel::new(self.spec, self.seasonal_period());
        model.fit(&time_series).map_err(|e| {
            ForecastError::ComputationError(format!("Failed to fit ETS model: {}", e))
        })?;

        let forecast = model.predict(horizon).map_err(|e| {
            ForecastError::ComputationError(format!("Failed to generate ETS forecasts: {}", e))
        })?;
        let point = forecast.point().first().cloned().unwrap_or_default();

        steps
            .iter()
            .map(|&s| {
                point.get(s).copied().ok_or_else(|| {
                    ForecastError::ComputationError(format!(
                        "{} returned {} points, step {} requested",
                        self.spec.short_name(),
                        point.len(),
                        s + 1
                    ))
                })
            })
            .collect()
    }
}

/// Linear model for one step of a direct forecast.
#[derive(Debug, Clone, PartialEq)]
struct StepRegression {
    step: usize,
    intercept: f64,
    coefficients: Vec<f64>,
}

impl StepRegression {
    fn predict(&self, window: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(window)
                .map(|(b, x)| b * x)
                .sum::<f64>()
    }
}

/// Direct multi-step reduction: one OLS regression of `y[t + h]` on the
/// window ending at `t`, per horizon step `h`.
///
/// Training depends on the horizon, so it must be given to `fit` and cannot
/// change afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectRegressionModel {
    steps: Vec<StepRegression>,
}

impl DirectRegressionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Horizon steps with a fitted regression.
    pub fn fitted_steps(&self) -> Vec<usize> {
        self.steps.iter().map(|r| r.step).collect()
    }
}

fn fit_step_regression(values: &[f64], window_length: usize, step: usize) -> Result<StepRegression> {
    let n = values.len();
    let (features, targets): (Vec<&[f64]>, Vec<f64>) = (window_length..=n.saturating_sub(step))
        .filter_map(|end| {
            let window = &values[end - window_length..end];
            let target = values[end + step - 1];
            if target.is_nan() || window.iter().any(|v| v.is_nan()) {
                None
            } else {
                Some((window, target))
            }
        })
        .unzip();

    let n_samples = targets.len();
    if n_samples <= window_length {
        return Err(ForecastError::InsufficientData {
            needed: 2 * window_length + step,
            got: n,
        });
    }

    let x_mat = faer::Mat::from_fn(n_samples, window_length, |i, j| features[i][j]);
    let y_col = faer::Col::from_fn(n_samples, |i| targets[i]);

    let fitted = OlsRegressor::builder()
        .with_intercept(true)
        .build()
        .fit(&x_mat, &y_col)
        .map_err(|e| {
            ForecastError::ComputationError(format!(
                "Failed to fit regression for step {}: {}",
                step, e
            ))
        })?;

    let coeffs_col = fitted.coefficients();
    let coefficients = (0..coeffs_col.nrows()).map(|i| coeffs_col[i]).collect();

    Ok(StepRegression {
        step,
        intercept: fitted.intercept().unwrap_or(0.0),
        coefficients,
    })
}

impl LastWindowModel for DirectRegressionModel {
    fn name(&self) -> &str {
        "DirectRegression"
    }

    fn horizon_policy(&self) -> HorizonPolicy {
        HorizonPolicy::Required
    }

    fn default_window_length(&self) -> usize {
        3
    }

    fn fit(
        &mut self,
        y: &Series,
        window_length: usize,
        fh: Option<&ForecastingHorizon>,
        _exog: Option<&ExogenousData>,
    ) -> Result<()> {
        let fh = fh.ok_or_else(|| {
            ForecastError::MissingHorizon(
                "DirectRegression trains one model per step and needs `fh` in `fit`".to_string(),
            )
        })?;
        if !fh.is_out_of_sample() {
            return Err(ForecastError::invalid_parameter(
                "fh",
                format!("{:?}", fh.as_slice()),
                "direct reduction only supports steps after the cutoff",
            ));
        }

        let mut steps: Vec<usize> = fh.iter().map(|h| h as usize).collect();
        steps.sort_unstable();

        self.steps = steps
            .into_iter()
            .map(|step| fit_step_regression(y.values(), window_length, step))
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    fn predict_from_window(
        &self,
        window: &[f64],
        steps: &[usize],
        _exog: Option<&ExogenousData>,
    ) -> Result<Vec<f64>> {
        steps
            .iter()
            .map(|&s| {
                self.steps
                    .iter()
                    .find(|r| r.step == s + 1)
                    .map(|r| r.predict(window))
                    .ok_or_else(|| {
                        ForecastError::HorizonConflict(format!(
                            "Step {} was not part of the horizon seen in `fit` {:?}",
                            s + 1,
                            self.fitted_steps()
                        ))
                    })
            })
            .collect()
    }
}
