//! The forecaster lifecycle: fit, predict, update and walk-forward simulation.
//!
//! Engines implement the required methods of [`Forecaster`]; the provided
//! methods own the temporal state, the horizon policy and the moving-cutoff
//! loop, so every engine gets the same cutoff semantics.

use crate::error::{ForecastError, Result};
use crate::formatting::{format_moving_cutoff_predictions, Prediction};
use crate::horizon::{offset, ForecastingHorizon, HorizonPolicy};
use crate::series::{ExogenousData, Series};
use crate::splitter::{SlidingWindowSplitter, Splitter, DEFAULT_WINDOW_LENGTH};
use crate::state::TemporalState;
use crate::validation::{check_confidence_level, check_y};
use std::ops::{Deref, DerefMut};
use tracing::{debug, trace};

/// Default confidence level for prediction intervals.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Options for prediction calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictOptions {
    /// Request prediction intervals in addition to point forecasts.
    pub return_pred_int: bool,
    /// Confidence level of the intervals, strictly between 0 and 1.
    pub confidence_level: f64,
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self {
            return_pred_int: false,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
        }
    }
}

impl PredictOptions {
    /// Reject interval requests and out-of-range confidence levels.
    pub fn check(&self) -> Result<()> {
        if self.return_pred_int {
            return Err(ForecastError::NotImplemented(
                "Prediction intervals are not supported".to_string(),
            ));
        }
        check_confidence_level(self.confidence_level)?;
        Ok(())
    }
}

/// State shared by every forecaster.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecasterCore {
    name: String,
    policy: HorizonPolicy,
    pub(crate) state: TemporalState,
    fh: Option<ForecastingHorizon>,
    is_fitted: bool,
}

impl ForecasterCore {
    pub fn new(name: impl Into<String>, policy: HorizonPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            state: TemporalState::new(),
            fh: None,
            is_fitted: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> HorizonPolicy {
        self.policy
    }

    pub fn state(&self) -> &TemporalState {
        &self.state
    }

    pub fn fh(&self) -> Option<&ForecastingHorizon> {
        self.fh.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Apply the horizon policy to a requested horizon.
    pub fn set_fh(&mut self, fh: Option<ForecastingHorizon>) -> Result<()> {
        self.policy
            .resolve(&mut self.fh, fh, self.is_fitted, &self.name)
    }

    /// The stored horizon, required for predicting.
    pub fn stored_fh(&self) -> Result<&ForecastingHorizon> {
        self.fh.as_ref().ok_or_else(|| {
            ForecastError::MissingHorizon(
                "No forecasting horizon has been set, pass `fh` to `fit` or `predict`"
                    .to_string(),
            )
        })
    }

    pub fn check_is_fitted(&self) -> Result<()> {
        if self.is_fitted {
            Ok(())
        } else {
            Err(ForecastError::NotFitted(format!(
                "This instance of {} has not been fitted yet, call `fit` first",
                self.name
            )))
        }
    }

    fn reset(&mut self) {
        self.state.reset();
        self.fh = None;
        self.is_fitted = false;
    }

    /// Replace all state with the observations of a new fit.
    ///
    /// The horizon is resolved first; if it is rejected the previous fit is
    /// left untouched.
    fn start_fit(&mut self, y: &Series, fh: Option<ForecastingHorizon>) -> Result<()> {
        let mut resolved = None;
        self.policy.resolve(&mut resolved, fh, false, &self.name)?;

        self.reset();
        self.fh = resolved;
        self.state.observe(y);
        Ok(())
    }
}

/// A forecaster with cutoff-aware fit, predict and update.
pub trait Forecaster {
    fn core(&self) -> &ForecasterCore;

    fn core_mut(&mut self) -> &mut ForecasterCore;

    /// Train the numeric engine on `y`. Called by [`Forecaster::fit`] after
    /// the state and horizon are set.
    fn fit_engine(&mut self, y: &Series, exog: Option<&ExogenousData>) -> Result<()>;

    /// Predict `fh` from the current cutoff without touching the horizon
    /// policy.
    fn predict_horizon(
        &mut self,
        fh: &ForecastingHorizon,
        exog: Option<&ExogenousData>,
        options: &PredictOptions,
    ) -> Result<Prediction>;

    /// Splitter used by `update_predict` when none is given.
    fn default_splitter(&self) -> Result<Box<dyn Splitter>> {
        let fh = self.core().stored_fh()?.clone();
        Ok(Box::new(SlidingWindowSplitter::new(fh, DEFAULT_WINDOW_LENGTH)?))
    }

    /// Fit to training data, replacing any earlier state.
    fn fit(
        &mut self,
        y: &Series,
        fh: Option<ForecastingHorizon>,
        exog: Option<&ExogenousData>,
    ) -> Result<()> {
        check_y(y, false)?;

        self.core_mut().start_fit(y, fh)?;

        if let Err(err) = self.fit_engine(y, exog) {
            self.core_mut().reset();
            return Err(err);
        }
        self.core_mut().is_fitted = true;

        debug!(
            forecaster = self.core().name(),
            n_obs = y.len(),
            cutoff = ?self.core().state.raw_cutoff(),
            "fitted forecaster"
        );
        Ok(())
    }

    /// Predict at the current cutoff.
    fn predict(
        &mut self,
        fh: Option<ForecastingHorizon>,
        exog: Option<&ExogenousData>,
        options: &PredictOptions,
    ) -> Result<Prediction> {
        self.core().check_is_fitted()?;
        self.core_mut().set_fh(fh)?;
        options.check()?;

        let fh = self.core().stored_fh()?.clone();
        self.predict_horizon(&fh, exog, options)
    }

    /// Reveal new observations and move the cutoff to the last of them.
    ///
    /// Re-fitting the engine on update is not supported.
    fn update(
        &mut self,
        y_new: &Series,
        _exog: Option<&ExogenousData>,
        update_params: bool,
    ) -> Result<()> {
        if update_params {
            return Err(ForecastError::NotImplemented(format!(
                "{} cannot re-fit its parameters on update, pass update_params = false",
                self.core().name()
            )));
        }
        self.core().check_is_fitted()?;
        check_y(y_new, true)?;

        self.core_mut().state.observe(y_new);
        Ok(())
    }

    /// Walk forward over `y_test`, predicting at every window of `cv`.
    ///
    /// Without a splitter, a sliding window over the stored horizon is used.
    /// The cutoff is restored afterwards, also when the walk fails.
    fn update_predict(
        &mut self,
        y_test: &Series,
        cv: Option<&dyn Splitter>,
        exog: Option<&ExogenousData>,
        update_params: bool,
        options: &PredictOptions,
    ) -> Result<Prediction> {
        self.core().check_is_fitted()?;
        check_y(y_test, false)?;
        options.check()?;

        match cv {
            Some(cv) => self.predict_moving_cutoff(y_test, cv, exog, update_params, options),
            None => {
                let cv = self.default_splitter()?;
                self.predict_moving_cutoff(y_test, cv.as_ref(), exog, update_params, options)
            }
        }
    }

    /// Simulate predictions from a series of moving cutoffs.
    fn predict_moving_cutoff(
        &mut self,
        y: &Series,
        cv: &dyn Splitter,
        exog: Option<&ExogenousData>,
        update_params: bool,
        options: &PredictOptions,
    ) -> Result<Prediction> {
        if options.return_pred_int {
            return Err(ForecastError::NotImplemented(
                "Prediction intervals are not supported for moving cutoffs".to_string(),
            ));
        }

        let first = y
            .first_index()
            .ok_or(ForecastError::InsufficientData { needed: 1, got: 0 })?;
        let start = offset(first, -1)?;
        let fh = cv.horizon().clone();
        let splits = cv.split(y)?;

        let mut predictions = Vec::new();
        let mut cutoffs = Vec::new();
        {
            let mut detached = self.detach_cutoff();
            detached.core_mut().state.set_cutoff(start);

            for (step, split) in splits.enumerate() {
                let window = y.iloc(split.train.clone());
                detached.update(&window, exog, update_params)?;

                let cutoff = detached.core().state.cutoff()?;
                let pred = detached
                    .predict_horizon(&fh, exog, &PredictOptions::default())?
                    .into_series()?;

                debug!(step, cutoff, n_pred = pred.len(), "moving cutoff step");
                predictions.push(pred);
                cutoffs.push(cutoff);
            }
        }

        format_moving_cutoff_predictions(predictions, cutoffs)
    }

    /// Detach the cutoff until the returned guard is dropped.
    fn detach_cutoff(&mut self) -> DetachedCutoff<'_, Self> {
        let saved = self.core().state.raw_cutoff();
        trace!(cutoff = ?saved, "detaching cutoff");
        DetachedCutoff {
            forecaster: self,
            saved,
        }
    }

    fn cutoff(&self) -> Result<i64> {
        self.core().check_is_fitted()?;
        self.core().state.cutoff()
    }

    fn fh(&self) -> Option<&ForecastingHorizon> {
        self.core().fh()
    }

    fn observation_horizon(&self) -> &Series {
        self.core().state.observation_horizon()
    }

    fn is_fitted(&self) -> bool {
        self.core().is_fitted()
    }
}

/// Scope in which a forecaster's cutoff may move freely.
///
/// The cutoff held when the guard was created is put back on drop, whether
/// the scope ends normally, through `?` or by unwinding.
pub struct DetachedCutoff<'a, F: Forecaster + ?Sized> {
    forecaster: &'a mut F,
    saved: Option<i64>,
}

impl<F: Forecaster + ?Sized> Deref for DetachedCutoff<'_, F> {
    type Target = F;

    fn deref(&self) -> &F {
        self.forecaster
    }
}

impl<F: Forecaster + ?Sized> DerefMut for DetachedCutoff<'_, F> {
    fn deref_mut(&mut self) -> &mut F {
        self.forecaster
    }
}

impl<F: Forecaster + ?Sized> Drop for DetachedCutoff<'_, F> {
    fn drop(&mut self) {
        self.forecaster.core_mut().state.restore_cutoff(self.saved);
        trace!(cutoff = ?self.saved, "restored cutoff");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::ManualWindowSplitter;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Fault {
        None,
        FitError,
        ErrorAfter(i64),
        PanicAfter(i64),
    }

    /// Repeats the last value observed at or before the cutoff.
    #[derive(Debug)]
    struct LastValue {
        core: ForecasterCore,
        fault: Fault,
        fit_calls: usize,
    }

    impl LastValue {
        fn new(policy: HorizonPolicy) -> Self {
            Self {
                core: ForecasterCore::new("LastValue", policy),
                fault: Fault::None,
                fit_calls: 0,
            }
        }
    }

    impl Forecaster for LastValue {
        fn core(&self) -> &ForecasterCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ForecasterCore {
            &mut self.core
        }

        fn fit_engine(&mut self, _y: &Series, _exog: Option<&ExogenousData>) -> Result<()> {
            self.fit_calls += 1;
            if self.fault == Fault::FitError {
                return Err(ForecastError::ComputationError("engine failed".to_string()));
            }
            Ok(())
        }

        fn predict_horizon(
            &mut self,
            fh: &ForecastingHorizon,
            _exog: Option<&ExogenousData>,
            _options: &PredictOptions,
        ) -> Result<Prediction> {
            let cutoff = self.core.state.cutoff()?;
            match self.fault {
                Fault::ErrorAfter(limit) if cutoff > limit => {
                    return Err(ForecastError::ComputationError("engine failed".to_string()))
                }
                Fault::PanicAfter(limit) if cutoff > limit => panic!("engine panicked"),
                _ => {}
            }

            let last = self
                .observation_horizon()
                .loc(i64::MIN, cutoff)
                .values()
                .last()
                .copied()
                .unwrap_or(f64::NAN);
            let index = fh.to_absolute(cutoff)?;
            let values = vec![last; index.len()];
            Ok(Prediction::Series(Series::new(index, values)?))
        }
    }

    fn fitted(policy: HorizonPolicy, fh: Option<ForecastingHorizon>) -> LastValue {
        let mut f = LastValue::new(policy);
        let y = Series::from_values(0, (0..=10).map(|i| i as f64).collect());
        f.fit(&y, fh, None).unwrap();
        f
    }

    fn y_test() -> Series {
        Series::from_values(11, vec![11.0, 12.0, 13.0, 14.0, 15.0])
    }

    fn sliding(window_length: usize) -> SlidingWindowSplitter {
        SlidingWindowSplitter::new(ForecastingHorizon::single(1), window_length).unwrap()
    }

    #[test]
    fn test_unfitted_forecaster() {
        let mut f = LastValue::new(HorizonPolicy::Optional);
        assert!(!f.is_fitted());
        assert!(matches!(f.cutoff(), Err(ForecastError::NotFitted(_))));
        assert!(matches!(
            f.predict(Some(ForecastingHorizon::single(1)), None, &PredictOptions::default()),
            Err(ForecastError::NotFitted(_))
        ));
        assert!(f.update(&y_test(), None, false).is_err());
    }

    #[test]
    fn test_fit_sets_state() {
        let f = fitted(HorizonPolicy::Optional, None);
        assert!(f.is_fitted());
        assert_eq!(f.cutoff().unwrap(), 10);
        assert_eq!(f.observation_horizon().len(), 11);
        assert!(f.fh().is_none());
        assert_eq!(f.fit_calls, 1);
    }

    #[test]
    fn test_fit_rejects_empty_series() {
        let mut f = LastValue::new(HorizonPolicy::Optional);
        let err = f.fit(&Series::empty(), None, None).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { .. }));
        assert!(!f.is_fitted());
    }

    #[test]
    fn test_rejected_horizon_leaves_forecaster_unfitted() {
        let mut f = LastValue::new(HorizonPolicy::Required);
        let y = Series::from_values(0, vec![1.0, 2.0, 3.0]);
        let err = f.fit(&y, None, None).unwrap_err();
        assert!(matches!(err, ForecastError::MissingHorizon(_)));

        assert!(!f.is_fitted());
        assert!(matches!(f.cutoff(), Err(ForecastError::NotFitted(_))));
        assert!(f.observation_horizon().is_empty());
        assert!(f.fh().is_none());
        assert_eq!(f.fit_calls, 0);
    }

    #[test]
    fn test_rejected_horizon_keeps_previous_fit() {
        let mut f = fitted(HorizonPolicy::Required, Some(ForecastingHorizon::single(1)));
        let y = Series::from_values(100, vec![1.0, 2.0]);
        assert!(f.fit(&y, None, None).is_err());

        assert!(f.is_fitted());
        assert_eq!(f.cutoff().unwrap(), 10);
        assert_eq!(f.observation_horizon().len(), 11);
        assert_eq!(f.fh(), Some(&ForecastingHorizon::single(1)));
    }

    #[test]
    fn test_failed_engine_fit_clears_state() {
        let mut f = fitted(HorizonPolicy::Optional, Some(ForecastingHorizon::single(1)));
        f.fault = Fault::FitError;
        let y = Series::from_values(100, vec![1.0, 2.0]);
        let err = f.fit(&y, None, None).unwrap_err();
        assert!(matches!(err, ForecastError::ComputationError(_)));

        assert!(!f.is_fitted());
        assert!(matches!(f.cutoff(), Err(ForecastError::NotFitted(_))));
        assert!(f.observation_horizon().is_empty());
        assert!(f.fh().is_none());
    }

    #[test]
    fn test_refit_replaces_state() {
        let mut f = fitted(HorizonPolicy::Required, Some(ForecastingHorizon::single(1)));
        let y = Series::from_values(100, vec![1.0, 2.0]);
        f.fit(&y, Some(ForecastingHorizon::single(2)), None).unwrap();

        assert_eq!(f.cutoff().unwrap(), 101);
        assert_eq!(f.observation_horizon().index(), &[100, 101]);
        assert_eq!(f.fh(), Some(&ForecastingHorizon::single(2)));
    }

    #[test]
    fn test_optional_policy_through_predict() {
        let mut f = fitted(HorizonPolicy::Optional, None);
        let opts = PredictOptions::default();

        assert!(matches!(
            f.predict(None, None, &opts),
            Err(ForecastError::MissingHorizon(_))
        ));

        let p = f.predict(Some(ForecastingHorizon::single(2)), None, &opts).unwrap();
        assert_eq!(p.as_series().unwrap().index(), &[12]);
        assert_eq!(f.fh(), Some(&ForecastingHorizon::single(2)));

        f.predict(Some(ForecastingHorizon::single(5)), None, &opts).unwrap();
        assert_eq!(f.fh(), Some(&ForecastingHorizon::single(5)));

        let p = f.predict(None, None, &opts).unwrap();
        assert_eq!(p.as_series().unwrap().index(), &[15]);
    }

    #[test]
    fn test_required_policy_through_fit_and_predict() {
        let mut f = LastValue::new(HorizonPolicy::Required);
        let y = Series::from_values(0, vec![1.0, 2.0]);
        assert!(matches!(
            f.fit(&y, None, None),
            Err(ForecastError::MissingHorizon(_))
        ));

        let fh = ForecastingHorizon::new(vec![1, 2, 3]).unwrap();
        f.fit(&y, Some(fh.clone()), None).unwrap();

        let opts = PredictOptions::default();
        f.predict(Some(fh.clone()), None, &opts).unwrap();
        assert!(matches!(
            f.predict(Some(ForecastingHorizon::new(vec![1, 2]).unwrap()), None, &opts),
            Err(ForecastError::HorizonConflict(_))
        ));
        let p = f.predict(None, None, &opts).unwrap();
        assert_eq!(p.as_series().unwrap().index(), &[2, 3, 4]);
        assert_eq!(f.fh(), Some(&fh));
    }

    #[test]
    fn test_interval_requests_fail() {
        let mut f = fitted(HorizonPolicy::Optional, Some(ForecastingHorizon::single(1)));
        let opts = PredictOptions {
            return_pred_int: true,
            ..Default::default()
        };
        assert!(matches!(
            f.predict(None, None, &opts),
            Err(ForecastError::NotImplemented(_))
        ));
        assert!(matches!(
            f.update_predict(&y_test(), Some(&sliding(3)), None, false, &opts),
            Err(ForecastError::NotImplemented(_))
        ));
        assert_eq!(f.cutoff().unwrap(), 10);
    }

    #[test]
    fn test_invalid_confidence_level() {
        let mut f = fitted(HorizonPolicy::Optional, Some(ForecastingHorizon::single(1)));
        let opts = PredictOptions {
            confidence_level: 1.5,
            ..Default::default()
        };
        let err = f.predict(None, None, &opts).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_update_moves_cutoff() {
        let mut f = fitted(HorizonPolicy::Optional, None);
        f.update(&Series::from_values(11, vec![11.0, 12.0]), None, false)
            .unwrap();
        assert_eq!(f.cutoff().unwrap(), 12);
        assert_eq!(f.observation_horizon().len(), 13);

        f.update(&Series::empty(), None, false).unwrap();
        assert_eq!(f.cutoff().unwrap(), 12);

        let err = f
            .update(&Series::from_values(13, vec![1.0]), None, true)
            .unwrap_err();
        assert!(matches!(err, ForecastError::NotImplemented(_)));
        assert_eq!(f.cutoff().unwrap(), 12);
    }

    #[test]
    fn test_update_predict_restores_cutoff() {
        let mut f = fitted(HorizonPolicy::Optional, None);
        let p = f
            .update_predict(&y_test(), Some(&sliding(3)), None, false, &PredictOptions::default())
            .unwrap();

        let s = p.into_series().unwrap();
        assert_eq!(s.index(), &[11, 12, 13, 14, 15]);
        assert_eq!(s.values(), &[10.0, 11.0, 12.0, 13.0, 14.0]);

        assert_eq!(f.cutoff().unwrap(), 10);
        assert_eq!(f.observation_horizon().last_index(), Some(14));
    }

    #[test]
    fn test_update_predict_restores_cutoff_on_error() {
        let mut f = fitted(HorizonPolicy::Optional, None);
        f.fault = Fault::ErrorAfter(12);

        let err = f
            .update_predict(&y_test(), Some(&sliding(3)), None, false, &PredictOptions::default())
            .unwrap_err();
        assert!(matches!(err, ForecastError::ComputationError(_)));
        assert_eq!(f.cutoff().unwrap(), 10);
    }

    #[test]
    fn test_update_predict_restores_cutoff_on_refit_request() {
        let mut f = fitted(HorizonPolicy::Optional, None);
        let err = f
            .update_predict(&y_test(), Some(&sliding(3)), None, true, &PredictOptions::default())
            .unwrap_err();
        assert!(matches!(err, ForecastError::NotImplemented(_)));
        assert_eq!(f.cutoff().unwrap(), 10);
    }

    #[test]
    fn test_update_predict_restores_cutoff_on_panic() {
        let mut f = fitted(HorizonPolicy::Optional, None);
        f.fault = Fault::PanicAfter(12);

        let result = catch_unwind(AssertUnwindSafe(|| {
            f.update_predict(&y_test(), Some(&sliding(3)), None, false, &PredictOptions::default())
        }));
        assert!(result.is_err());
        assert_eq!(f.cutoff().unwrap(), 10);
    }

    #[test]
    fn test_update_predict_at_index_minimum() {
        let mut f = fitted(HorizonPolicy::Optional, None);
        let y = Series::new(vec![i64::MIN, i64::MIN + 1], vec![1.0, 2.0]).unwrap();
        let err = f
            .update_predict(&y, Some(&sliding(3)), None, false, &PredictOptions::default())
            .unwrap_err();
        assert!(matches!(err, ForecastError::OutOfBounds(_)));
        assert_eq!(f.cutoff().unwrap(), 10);
    }

    #[test]
    fn test_update_predict_default_splitter_needs_horizon() {
        let mut f = fitted(HorizonPolicy::Optional, None);
        let err = f
            .update_predict(&y_test(), None, None, false, &PredictOptions::default())
            .unwrap_err();
        assert!(matches!(err, ForecastError::MissingHorizon(_)));

        let mut f = fitted(HorizonPolicy::Optional, Some(ForecastingHorizon::single(1)));
        let p = f
            .update_predict(&y_test(), None, None, false, &PredictOptions::default())
            .unwrap();
        assert_eq!(p.as_series().unwrap().len(), 5);
        assert_eq!(f.cutoff().unwrap(), 10);
    }

    #[test]
    fn test_update_predict_multi_step_table() {
        let mut f = fitted(HorizonPolicy::Optional, None);
        let cv = ManualWindowSplitter::new(
            &[0, 2],
            ForecastingHorizon::new(vec![1, 2]).unwrap(),
            None,
        )
        .unwrap();

        let p = f
            .update_predict(&y_test(), Some(&cv), None, false, &PredictOptions::default())
            .unwrap();
        let table = p.as_table().unwrap();
        assert_eq!(table.cutoffs(), &[11, 13]);
        assert_eq!(table.column(11).unwrap().index(), &[12, 13]);
        assert_eq!(table.column(13).unwrap().values(), &[13.0, 13.0]);
        assert_eq!(f.cutoff().unwrap(), 10);
    }

    #[test]
    fn test_detach_cutoff_guard() {
        let mut f = fitted(HorizonPolicy::Optional, None);
        {
            let mut detached = f.detach_cutoff();
            detached.core_mut().state.set_cutoff(3);
            assert_eq!(detached.cutoff().unwrap(), 3);
        }
        assert_eq!(f.cutoff().unwrap(), 10);
    }
}
