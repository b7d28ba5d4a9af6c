//! Window splitters for walk-forward evaluation.
//!
//! A splitter walks over a series and yields, for every simulated cutoff, the
//! positions of the observations that become visible (`train`) and the
//! positions the forecast is evaluated against (`test`).

use crate::error::{ForecastError, Result};
use crate::horizon::{offset, ForecastingHorizon};
use crate::series::Series;
use crate::validation::{check_cutoffs, check_step_length, check_window_length};
use std::ops::Range;

/// Default length of the training window of a sliding splitter.
pub const DEFAULT_WINDOW_LENGTH: usize = 10;

/// Default distance between consecutive cutoffs of a sliding splitter.
pub const DEFAULT_STEP_LENGTH: usize = 1;

/// One split produced by a [`Splitter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    /// Positions of the observations revealed at this step.
    pub train: Range<usize>,
    /// Positions targeted by the horizon (may lie outside the series).
    pub test: Vec<i64>,
}

impl Split {
    /// Position of the last revealed observation, `-1` if none.
    pub fn cutoff_position(&self) -> i64 {
        self.train.end as i64 - 1
    }
}

/// Produces the windows a walk-forward simulation iterates over.
pub trait Splitter {
    /// Horizon predicted at every step.
    fn horizon(&self) -> &ForecastingHorizon;

    /// Lazily generate the splits over `y`, in index order.
    fn split<'a>(&'a self, y: &Series) -> Result<Box<dyn Iterator<Item = Split> + 'a>>;

    /// Number of splits over `y`.
    fn n_splits(&self, y: &Series) -> Result<usize> {
        Ok(self.split(y)?.count())
    }

    /// Cutoff positions of all splits over `y`.
    fn cutoffs(&self, y: &Series) -> Result<Vec<i64>> {
        Ok(self.split(y)?.map(|s| s.cutoff_position()).collect())
    }
}

/// Fixed-length window sliding forward by `step_length` positions.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingWindowSplitter {
    fh: ForecastingHorizon,
    window_length: usize,
    step_length: usize,
    start_with_window: bool,
}

impl SlidingWindowSplitter {
    pub fn new(fh: ForecastingHorizon, window_length: usize) -> Result<Self> {
        Ok(Self {
            fh,
            window_length: check_window_length(window_length)?,
            step_length: DEFAULT_STEP_LENGTH,
            start_with_window: false,
        })
    }

    pub fn with_step_length(mut self, step_length: usize) -> Result<Self> {
        self.step_length = check_step_length(step_length)?;
        Ok(self)
    }

    /// Start with a full window instead of an empty one.
    pub fn with_start_with_window(mut self, start_with_window: bool) -> Self {
        self.start_with_window = start_with_window;
        self
    }

    pub fn window_length(&self) -> usize {
        self.window_length
    }

    pub fn step_length(&self) -> usize {
        self.step_length
    }
}

impl Splitter for SlidingWindowSplitter {
    fn horizon(&self) -> &ForecastingHorizon {
        &self.fh
    }

    fn split<'a>(&'a self, y: &Series) -> Result<Box<dyn Iterator<Item = Split> + 'a>> {
        let n = y.len() as i64;
        let window = self.window_length as i64;
        let start = if self.start_with_window { window } else { 0 };
        let max_step = self.fh.max_step();

        // Last split point leaves room for the furthest step ahead
        let end = if self.fh.is_in_sample() {
            n + 1
        } else {
            n - max_step + 1
        };

        if end <= start {
            return Err(ForecastError::InsufficientData {
                needed: start.saturating_add(max_step.max(0)) as usize,
                got: y.len(),
            });
        }

        // Test positions grow with the split point; check the extremes
        let last = start + (end - 1 - start) / self.step_length as i64 * self.step_length as i64;
        offset(start - 1, self.fh.min_step())?;
        offset(last - 1, max_step)?;

        let fh = &self.fh;
        Ok(Box::new((start..end).step_by(self.step_length).map(
            move |split_point| Split {
                train: ((split_point - window).max(0) as usize)..(split_point as usize),
                test: fh.iter().map(|h| split_point - 1 + h).collect(),
            },
        )))
    }
}

/// Splits at explicitly given cutoff positions.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualWindowSplitter {
    cutoffs: Vec<i64>,
    fh: ForecastingHorizon,
    window_length: Option<usize>,
}

impl ManualWindowSplitter {
    /// `cutoffs` are zero-based positions; `None` window length means the
    /// window expands back to the first observation.
    pub fn new(
        cutoffs: &[i64],
        fh: ForecastingHorizon,
        window_length: Option<usize>,
    ) -> Result<Self> {
        let window_length = window_length.map(check_window_length).transpose()?;
        Ok(Self {
            cutoffs: check_cutoffs(cutoffs)?,
            fh,
            window_length,
        })
    }

    pub fn window_length(&self) -> Option<usize> {
        self.window_length
    }
}

impl Splitter for ManualWindowSplitter {
    fn horizon(&self) -> &ForecastingHorizon {
        &self.fh
    }

    fn split<'a>(&'a self, y: &Series) -> Result<Box<dyn Iterator<Item = Split> + 'a>> {
        let n = y.len() as i64;
        if let Some(&c) = self.cutoffs.iter().find(|&&c| c >= n) {
            return Err(ForecastError::OutOfBounds(format!(
                "Cutoff position {} lies beyond a series of length {}",
                c, n
            )));
        }

        if let (Some(&first), Some(&last)) = (self.cutoffs.first(), self.cutoffs.last()) {
            offset(first, self.fh.min_step())?;
            offset(last, self.fh.max_step())?;
        }

        let fh = &self.fh;
        let window_length = self.window_length;
        Ok(Box::new(self.cutoffs.iter().map(move |&cutoff| {
            let start = window_length
                .map(|w| (cutoff + 1 - w as i64).max(0))
                .unwrap_or(0);
            Split {
                train: (start as usize)..((cutoff + 1) as usize),
                test: fh.iter().map(|h| cutoff + h).collect(),
            }
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: usize) -> Series {
        Series::from_values(0, (0..n).map(|i| i as f64).collect())
    }

    #[test]
    fn test_sliding_windows_start_empty() {
        let cv = SlidingWindowSplitter::new(ForecastingHorizon::single(1), 3).unwrap();
        let splits: Vec<Split> = cv.split(&series(4)).unwrap().collect();

        assert_eq!(splits.len(), 4);
        assert_eq!(splits[0].train, 0..0);
        assert_eq!(splits[0].test, vec![0]);
        assert_eq!(splits[1].train, 0..1);
        assert_eq!(splits[3].train, 0..3);
        assert_eq!(splits[3].test, vec![3]);
    }

    #[test]
    fn test_sliding_windows_respect_horizon_and_step() {
        let fh = ForecastingHorizon::steps_ahead(2).unwrap();
        let cv = SlidingWindowSplitter::new(fh, 2)
            .unwrap()
            .with_step_length(2)
            .unwrap()
            .with_start_with_window(true);

        let splits: Vec<Split> = cv.split(&series(7)).unwrap().collect();
        assert_eq!(splits.len(), 2);
        assert_eq!(splits[0].train, 0..2);
        assert_eq!(splits[0].test, vec![2, 3]);
        assert_eq!(splits[1].train, 2..4);
        assert_eq!(splits[1].test, vec![4, 5]);

        assert_eq!(cv.n_splits(&series(7)).unwrap(), 2);
        assert_eq!(cv.cutoffs(&series(7)).unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_sliding_too_short_for_horizon() {
        let fh = ForecastingHorizon::steps_ahead(5).unwrap();
        let cv = SlidingWindowSplitter::new(fh, 2).unwrap();
        let err = cv.split(&series(3)).err().unwrap();
        assert!(matches!(
            err,
            ForecastError::InsufficientData { needed: 5, got: 3 }
        ));
    }

    #[test]
    fn test_sliding_rejects_bad_parameters() {
        assert!(SlidingWindowSplitter::new(ForecastingHorizon::single(1), 0).is_err());
        let cv = SlidingWindowSplitter::new(ForecastingHorizon::single(1), 2).unwrap();
        assert!(cv.with_step_length(0).is_err());
    }

    #[test]
    fn test_extreme_steps_are_out_of_bounds() {
        let fh = ForecastingHorizon::new(vec![i64::MIN, 1]).unwrap();
        let cv = SlidingWindowSplitter::new(fh.clone(), 2).unwrap();
        assert!(matches!(
            cv.split(&series(4)).err().unwrap(),
            ForecastError::OutOfBounds(_)
        ));

        let fh = ForecastingHorizon::new(vec![1, i64::MAX]).unwrap();
        let cv = ManualWindowSplitter::new(&[1], fh, None).unwrap();
        assert!(matches!(
            cv.split(&series(4)).err().unwrap(),
            ForecastError::OutOfBounds(_)
        ));

        let cv = SlidingWindowSplitter::new(ForecastingHorizon::single(i64::MAX), 2).unwrap();
        assert!(matches!(
            cv.split(&series(4)).err().unwrap(),
            ForecastError::InsufficientData { .. }
        ));
    }

    #[test]
    fn test_manual_windows() {
        let cv =
            ManualWindowSplitter::new(&[3, 1], ForecastingHorizon::single(1), Some(2)).unwrap();
        let splits: Vec<Split> = cv.split(&series(5)).unwrap().collect();

        assert_eq!(splits.len(), 2);
        assert_eq!(splits[0].train, 0..2);
        assert_eq!(splits[0].test, vec![2]);
        assert_eq!(splits[1].train, 2..4);
        assert_eq!(splits[1].test, vec![4]);
        assert_eq!(cv.cutoffs(&series(5)).unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_manual_expanding_window() {
        let cv = ManualWindowSplitter::new(&[2], ForecastingHorizon::single(1), None).unwrap();
        let split = cv.split(&series(5)).unwrap().next().unwrap();
        assert_eq!(split.train, 0..3);
    }

    #[test]
    fn test_manual_cutoff_beyond_series() {
        let cv = ManualWindowSplitter::new(&[5], ForecastingHorizon::single(1), None).unwrap();
        let err = cv.split(&series(5)).err().unwrap();
        assert!(matches!(err, ForecastError::OutOfBounds(_)));
    }
}
