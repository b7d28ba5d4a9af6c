//! Forecasting horizons and the policies that govern them.
//!
//! A [`ForecastingHorizon`] holds integer steps relative to the cutoff:
//! positive steps lie in the future (out-of-sample), non-positive steps in
//! the observed past (in-sample).
//!
//! Which horizon a forecaster predicts for is decided by its
//! [`HorizonPolicy`]. Engines whose training does not depend on the horizon
//! accept it at fit or at predict time and let the latest one win. Engines
//! that train one model per step (direct multi-step reduction) lock the
//! horizon at fit time.

use crate::error::{ForecastError, Result};
use crate::validation::check_fh;

/// Relative forecasting horizon, validated on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForecastingHorizon(Vec<i64>);

impl ForecastingHorizon {
    /// Validate and wrap the given steps.
    pub fn new(steps: Vec<i64>) -> Result<Self> {
        check_fh(&steps)
    }

    /// The horizon `1..=n`.
    pub fn steps_ahead(n: usize) -> Result<Self> {
        let steps: Vec<i64> = (1..=n as i64).collect();
        check_fh(&steps)
    }

    /// A single step.
    pub fn single(step: i64) -> Self {
        ForecastingHorizon(vec![step])
    }

    pub(crate) fn from_checked(steps: Vec<i64>) -> Self {
        ForecastingHorizon(steps)
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }

    /// Largest step in the horizon.
    pub fn max_step(&self) -> i64 {
        self.0.iter().copied().max().unwrap_or(0)
    }

    /// Smallest step in the horizon.
    pub fn min_step(&self) -> i64 {
        self.0.iter().copied().min().unwrap_or(0)
    }

    /// All steps lie strictly after the cutoff.
    pub fn is_out_of_sample(&self) -> bool {
        self.0.iter().all(|&h| h > 0)
    }

    /// All steps lie at or before the cutoff.
    pub fn is_in_sample(&self) -> bool {
        self.0.iter().all(|&h| h <= 0)
    }

    /// Split into `(in_sample, out_of_sample)` parts, preserving order.
    pub fn partition(&self) -> (Option<ForecastingHorizon>, Option<ForecastingHorizon>) {
        let (oos, ins): (Vec<i64>, Vec<i64>) = self.0.iter().copied().partition(|&h| h > 0);
        let wrap = |steps: Vec<i64>| {
            if steps.is_empty() {
                None
            } else {
                Some(ForecastingHorizon(steps))
            }
        };
        (wrap(ins), wrap(oos))
    }

    /// Copy of the horizon with steps in ascending order.
    pub fn sorted(&self) -> ForecastingHorizon {
        let mut steps = self.0.clone();
        steps.sort_unstable();
        ForecastingHorizon(steps)
    }

    /// Absolute time points `cutoff + step`, sorted ascending.
    ///
    /// Fails if any point would fall before time zero or outside the `i64`
    /// range.
    pub fn to_absolute(&self, cutoff: i64) -> Result<Vec<i64>> {
        let mut absolute = self
            .0
            .iter()
            .map(|&h| offset(cutoff, h))
            .collect::<Result<Vec<i64>>>()?;

        if let Some(t) = absolute.iter().find(|&&t| t < 0) {
            return Err(ForecastError::OutOfBounds(format!(
                "Forecasting horizon includes time point {} before the observation horizon \
                 (cutoff {})",
                t, cutoff
            )));
        }

        absolute.sort_unstable();
        Ok(absolute)
    }

    /// Zero-based positions `step - 1`, in horizon order.
    pub fn to_array_index(&self) -> Result<Vec<i64>> {
        self.0.iter().map(|&h| offset(h, -1)).collect()
    }
}

/// `base + step`, failing with `OutOfBounds` instead of overflowing.
pub(crate) fn offset(base: i64, step: i64) -> Result<i64> {
    base.checked_add(step).ok_or_else(|| {
        ForecastError::OutOfBounds(format!(
            "Time point {} {:+} lies outside the representable index range",
            base, step
        ))
    })
}

impl From<i64> for ForecastingHorizon {
    fn from(step: i64) -> Self {
        ForecastingHorizon::single(step)
    }
}

impl TryFrom<Vec<i64>> for ForecastingHorizon {
    type Error = ForecastError;

    fn try_from(steps: Vec<i64>) -> Result<Self> {
        ForecastingHorizon::new(steps)
    }
}

impl TryFrom<&[i64]> for ForecastingHorizon {
    type Error = ForecastError;

    fn try_from(steps: &[i64]) -> Result<Self> {
        check_fh(steps)
    }
}

/// How a forecaster accepts its forecasting horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizonPolicy {
    /// The horizon may be given to `fit` or `predict`; the last one given wins.
    #[default]
    Optional,
    /// The horizon must be given to `fit` and cannot change until refitting.
    Required,
}

impl HorizonPolicy {
    /// Resolve the requested horizon against the stored one.
    ///
    /// `owner` names the forecaster in error messages.
    pub fn resolve(
        self,
        stored: &mut Option<ForecastingHorizon>,
        requested: Option<ForecastingHorizon>,
        is_fitted: bool,
        owner: &str,
    ) -> Result<()> {
        match self {
            HorizonPolicy::Optional => match requested {
                None if is_fitted && stored.is_none() => Err(ForecastError::MissingHorizon(
                    "The forecasting horizon `fh` must be passed either to `fit` or `predict`, \
                     but was found in neither"
                        .to_string(),
                )),
                None => Ok(()),
                Some(fh) => {
                    *stored = Some(fh);
                    Ok(())
                }
            },
            HorizonPolicy::Required => match requested {
                None if is_fitted => Ok(()),
                None => Err(ForecastError::MissingHorizon(format!(
                    "The forecasting horizon `fh` must be passed to `fit`, but none was found. \
                     Fitting `{}` depends on `fh`",
                    owner
                ))),
                Some(fh) if is_fitted => {
                    if stored.as_ref() == Some(&fh) {
                        Ok(())
                    } else {
                        Err(ForecastError::HorizonConflict(format!(
                            "`fh` {:?} differs from the one seen in `fit` {:?}. \
                             Re-fit `{}` to change the forecasting horizon, its fitting \
                             depends on `fh`",
                            fh.as_slice(),
                            stored.as_ref().map(|s| s.as_slice()).unwrap_or(&[]),
                            owner
                        )))
                    }
                }
                Some(fh) => {
                    *stored = Some(fh);
                    Ok(())
                }
            },
        }
    }
}
