//! Integer-indexed series and exogenous feature tables.
//!
//! A [`Series`] is the unit of data exchanged with a forecaster: scalar
//! observations keyed by a strictly increasing `i64` time index. Missing
//! observations are represented as `NaN`.

use crate::error::{ForecastError, Result};
use std::cmp::Ordering;
use std::ops::Range;

/// Time-indexed sequence of scalar observations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    index: Vec<i64>,
    values: Vec<f64>,
}

impl Series {
    /// Create a series from an index and matching values.
    ///
    /// The index must be strictly increasing (ordered, no duplicate time points).
    pub fn new(index: Vec<i64>, values: Vec<f64>) -> Result<Self> {
        if index.len() != values.len() {
            return Err(ForecastError::InvalidInput(format!(
                "Index has {} entries but values has {}",
                index.len(),
                values.len()
            )));
        }

        if let Some(pos) = index.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ForecastError::InvalidInput(format!(
                "Index must be strictly increasing, found {} followed by {} at position {}",
                index[pos],
                index[pos + 1],
                pos + 1
            )));
        }

        Ok(Self { index, values })
    }

    /// Create a series with a contiguous index starting at `start`.
    pub fn from_values(start: i64, values: Vec<f64>) -> Self {
        let index = (start..).take(values.len()).collect();
        Self { index, values }
    }

    /// An empty series.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[i64] {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn first_index(&self) -> Option<i64> {
        self.index.first().copied()
    }

    pub fn last_index(&self) -> Option<i64> {
        self.index.last().copied()
    }

    /// Value observed at time point `t`, if any.
    pub fn get(&self, t: i64) -> Option<f64> {
        self.position(t).map(|i| self.values[i])
    }

    /// Zero-based position of time point `t`, if present.
    pub fn position(&self, t: i64) -> Option<usize> {
        self.index.binary_search(&t).ok()
    }

    /// Iterate over `(time, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.index.iter().copied().zip(self.values.iter().copied())
    }

    /// Positional slice. Out-of-range bounds are clamped.
    pub fn iloc(&self, range: Range<usize>) -> Series {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        Series {
            index: self.index[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        }
    }

    /// Label slice over the closed interval `[start, end]`.
    pub fn loc(&self, start: i64, end: i64) -> Series {
        let lo = self.index.partition_point(|&t| t < start);
        let hi = self.index.partition_point(|&t| t <= end);
        if lo >= hi {
            return Series::empty();
        }
        Series {
            index: self.index[lo..hi].to_vec(),
            values: self.values[lo..hi].to_vec(),
        }
    }

    /// Union of both indexes, preferring values from `self`.
    ///
    /// Where `self` holds a missing value (`NaN`) and `other` an observation
    /// at the same time point, the observation from `other` is kept.
    pub fn combine_first(&self, other: &Series) -> Series {
        let mut index = Vec::with_capacity(self.len() + other.len());
        let mut values = Vec::with_capacity(self.len() + other.len());
        let (mut i, mut j) = (0, 0);

        while i < self.len() && j < other.len() {
            match self.index[i].cmp(&other.index[j]) {
                Ordering::Less => {
                    index.push(self.index[i]);
                    values.push(self.values[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    index.push(other.index[j]);
                    values.push(other.values[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    let v = self.values[i];
                    index.push(self.index[i]);
                    values.push(if v.is_nan() { other.values[j] } else { v });
                    i += 1;
                    j += 1;
                }
            }
        }

        index.extend_from_slice(&self.index[i..]);
        values.extend_from_slice(&self.values[i..]);
        index.extend_from_slice(&other.index[j..]);
        values.extend_from_slice(&other.values[j..]);

        Series { index, values }
    }

    /// Concatenate series in the given order.
    ///
    /// The result must itself be a valid series, so each part has to start
    /// after the previous one ended.
    pub fn concat(parts: &[Series]) -> Result<Series> {
        let total = parts.iter().map(Series::len).sum();
        let mut index: Vec<i64> = Vec::with_capacity(total);
        let mut values = Vec::with_capacity(total);

        for part in parts {
            if let (Some(&prev), Some(next)) = (index.last(), part.first_index()) {
                if next <= prev {
                    return Err(ForecastError::Format(format!(
                        "Cannot concatenate predictions: time point {} does not follow {}",
                        next, prev
                    )));
                }
            }
            index.extend_from_slice(&part.index);
            values.extend_from_slice(&part.values);
        }

        Ok(Series { index, values })
    }
}

/// Exogenous feature table aligned to an integer time index.
///
/// The forecaster core never interprets these values; it validates the shape
/// once and hands the table to the numeric engine unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExogenousData {
    index: Vec<i64>,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl ExogenousData {
    /// Create a feature table; every column must match the index length.
    pub fn new(index: Vec<i64>, names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self> {
        if names.len() != columns.len() {
            return Err(ForecastError::InvalidInput(format!(
                "Exogenous data has {} names but {} columns",
                names.len(),
                columns.len()
            )));
        }

        for (name, column) in names.iter().zip(columns.iter()) {
            if column.len() != index.len() {
                return Err(ForecastError::InvalidInput(format!(
                    "Regressor '{}' has {} values but the index has {}",
                    name,
                    column.len(),
                    index.len()
                )));
            }
        }

        if index.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ForecastError::InvalidInput(
                "Exogenous index must be strictly increasing".to_string(),
            ));
        }

        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(ForecastError::InvalidInput(format!(
                    "Duplicate regressor name '{}'",
                    name
                )));
            }
        }

        Ok(Self {
            index,
            names,
            columns,
        })
    }

    pub fn index(&self) -> &[i64] {
        &self.index
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Get the number of regressors.
    pub fn n_regressors(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Values of the regressor called `name`.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_unordered_index() {
        let err = Series::new(vec![0, 2, 1], vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput(_)));

        let err = Series::new(vec![0, 1, 1], vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput(_)));

        let err = Series::new(vec![0, 1], vec![1.0]).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput(_)));
    }

    #[test]
    fn test_from_values() {
        let s = Series::from_values(5, vec![1.0, 2.0, 3.0]);
        assert_eq!(s.index(), &[5, 6, 7]);
        assert_eq!(s.first_index(), Some(5));
        assert_eq!(s.last_index(), Some(7));
        assert_eq!(s.get(6), Some(2.0));
        assert_eq!(s.get(8), None);
    }

    #[test]
    fn test_iloc_clamps() {
        let s = Series::from_values(0, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(s.iloc(1..3).values(), &[2.0, 3.0]);
        assert_eq!(s.iloc(2..10).index(), &[2, 3]);
        assert!(s.iloc(7..9).is_empty());
    }

    #[test]
    fn test_loc_is_inclusive() {
        let s = Series::new(vec![0, 2, 4, 6], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(s.loc(2, 4).index(), &[2, 4]);
        assert_eq!(s.loc(1, 5).index(), &[2, 4]);
        assert_eq!(s.loc(-3, 0).values(), &[1.0]);
        assert!(s.loc(7, 9).is_empty());
    }

    #[test]
    fn test_combine_first_prefers_new_values() {
        let old = Series::from_values(0, vec![1.0, 2.0, 3.0]);
        let new = Series::from_values(2, vec![30.0, 40.0]);
        let merged = new.combine_first(&old);
        assert_eq!(merged.index(), &[0, 1, 2, 3]);
        assert_eq!(merged.values(), &[1.0, 2.0, 30.0, 40.0]);
    }

    #[test]
    fn test_combine_first_keeps_observed_over_missing() {
        let old = Series::from_values(0, vec![1.0, 2.0]);
        let new = Series::from_values(1, vec![f64::NAN, 5.0]);
        let merged = new.combine_first(&old);
        assert_eq!(merged.values(), &[1.0, 2.0, 5.0]);
    }

    #[test]
    fn test_concat_requires_increasing_index() {
        let a = Series::from_values(0, vec![1.0]);
        let b = Series::from_values(1, vec![2.0]);
        let joined = Series::concat(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(joined.index(), &[0, 1]);

        let err = Series::concat(&[b, a]).unwrap_err();
        assert!(matches!(err, ForecastError::Format(_)));
    }

    #[test]
    fn test_exogenous_validation() {
        let exog = ExogenousData::new(
            vec![0, 1, 2],
            vec!["price".into(), "promo".into()],
            vec![vec![1.0, 2.0, 3.0], vec![0.0, 1.0, 0.0]],
        )
        .unwrap();
        assert_eq!(exog.n_regressors(), 2);
        assert_eq!(exog.column("promo"), Some(&[0.0, 1.0, 0.0][..]));
        assert!(exog.column("weather").is_none());

        let err = ExogenousData::new(vec![0, 1], vec!["a".into()], vec![vec![1.0]]).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput(_)));

        let err = ExogenousData::new(
            vec![0],
            vec!["a".into(), "a".into()],
            vec![vec![1.0], vec![2.0]],
        )
        .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput(_)));
    }
}
