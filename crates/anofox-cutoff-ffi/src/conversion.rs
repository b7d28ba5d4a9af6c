//! Parameter conversion utilities for FFI functions.
//!
//! Helpers for turning raw C inputs (pointer + length pairs, validity
//! bitmasks, fixed-size string buffers, "0 or negative means None" integers)
//! into core types.

use crate::types;
use anofox_cutoff_core::{
    check_fh, check_series, ForecastError, ForecastingHorizon, ManualWindowSplitter, ModelType,
    Result, Series, SlidingWindowSplitter, Splitter, DEFAULT_STEP_LENGTH, DEFAULT_WINDOW_LENGTH,
};
use core::ffi::{c_char, c_double, c_int};
use libc::size_t;
use std::ffi::CStr;

/// Convert a `c_int` to `Option<usize>`, where values <= 0 become None.
#[inline]
pub fn to_option_usize(value: c_int) -> Option<usize> {
    if value > 0 {
        Some(value as usize)
    } else {
        None
    }
}

/// Convert a C string pointer to a Rust `&str` with a default value.
///
/// # Safety
/// The pointer must be null or point to a valid null-terminated string.
#[inline]
pub unsafe fn c_str_to_str(ptr: *const c_char, default: &str) -> &str {
    if ptr.is_null() {
        default
    } else {
        CStr::from_ptr(ptr).to_str().unwrap_or(default)
    }
}

/// Read a fixed-size, null-terminated char buffer.
///
/// A buffer without a terminator is read up to its full length. Returns
/// `None` for an empty string.
pub fn c_buffer_to_str(buffer: &[c_char]) -> Result<Option<String>> {
    let bytes: Vec<u8> = buffer
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();

    if bytes.is_empty() {
        return Ok(None);
    }

    String::from_utf8(bytes)
        .map(Some)
        .map_err(|_| ForecastError::InvalidInput("String buffer is not valid UTF-8".to_string()))
}

/// Copy a string to a fixed-size char buffer.
pub fn copy_string_to_buffer(s: &str, buffer: &mut [c_char]) {
    if buffer.is_empty() {
        return;
    }
    let bytes = s.as_bytes();
    let len = bytes.len().min(buffer.len() - 1);
    for (i, &b) in bytes[..len].iter().enumerate() {
        buffer[i] = b as c_char;
    }
    buffer[len] = 0;
}

/// Borrow a raw array as a slice, treating a zero length as empty.
///
/// # Safety
/// If `length > 0`, `ptr` must point to at least `length` readable elements.
unsafe fn raw_slice<'a, T>(ptr: *const T, length: size_t, what: &str) -> Result<&'a [T]> {
    if length == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(ForecastError::NullPointer(format!(
            "{} is null but length is {}",
            what, length
        )));
    }
    Ok(std::slice::from_raw_parts(ptr, length))
}

/// Build a validated series from raw pointers.
///
/// Entries whose validity bit is cleared become `NaN`. A null validity
/// pointer marks every entry valid.
///
/// # Safety
/// `index` and `values` must hold `length` elements; `validity` must be
/// null or hold `ceil(length / 64)` words.
pub unsafe fn build_series(
    index: *const i64,
    values: *const c_double,
    validity: *const u64,
    length: size_t,
) -> Result<Series> {
    let index = raw_slice(index, length, "index")?;
    let data = raw_slice(values, length, "values")?;

    if validity.is_null() || length == 0 {
        return check_series(index, data);
    }

    let validity_slice = std::slice::from_raw_parts(validity, length.div_ceil(64));
    let values: Vec<f64> = data
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let is_valid = (validity_slice[i / 64] >> (i % 64)) & 1 == 1;
            if is_valid {
                v
            } else {
                f64::NAN
            }
        })
        .collect();

    check_series(index, &values)
}

/// Build an optional forecasting horizon; a null pointer or zero length is `None`.
///
/// # Safety
/// If non-null, `fh` must hold `fh_len` elements.
pub unsafe fn build_horizon(
    fh: *const i64,
    fh_len: size_t,
) -> Result<Option<ForecastingHorizon>> {
    if fh.is_null() || fh_len == 0 {
        return Ok(None);
    }
    let steps = std::slice::from_raw_parts(fh, fh_len);
    check_fh(steps).map(Some)
}

/// Build a window splitter from C options.
///
/// Returns `None` for [`types::SplitterKind::Default`], leaving the choice to
/// the forecaster.
///
/// # Safety
/// Pointer fields of `opts` must satisfy their documented lengths.
pub unsafe fn build_splitter(
    opts: &types::SplitterOptions,
) -> Result<Option<Box<dyn Splitter>>> {
    let fh = || {
        build_horizon(opts.fh, opts.fh_len)?.ok_or_else(|| {
            ForecastError::MissingHorizon("Splitter requires a forecasting horizon".to_string())
        })
    };

    match opts.kind {
        types::SplitterKind::Default => Ok(None),
        types::SplitterKind::Sliding => {
            let window_length =
                to_option_usize(opts.window_length).unwrap_or(DEFAULT_WINDOW_LENGTH);
            let step_length = to_option_usize(opts.step_length).unwrap_or(DEFAULT_STEP_LENGTH);
            let splitter = SlidingWindowSplitter::new(fh()?, window_length)?
                .with_step_length(step_length)?
                .with_start_with_window(opts.start_with_window);
            Ok(Some(Box::new(splitter)))
        }
        types::SplitterKind::Manual => {
            let cutoffs = raw_slice(opts.cutoffs, opts.n_cutoffs, "cutoffs")?;
            let splitter =
                ManualWindowSplitter::new(cutoffs, fh()?, to_option_usize(opts.window_length))?;
            Ok(Some(Box::new(splitter)))
        }
    }
}

/// Convert C forecaster options to core options.
pub fn to_core_options(
    opts: &types::ForecasterOptions,
) -> Result<anofox_cutoff_core::ForecasterOptions> {
    let model: ModelType = c_buffer_to_str(&opts.model)?
        .ok_or_else(|| ForecastError::InvalidModel("Model name is empty".to_string()))?
        .parse()?;

    let seasonal_period = usize::try_from(opts.seasonal_period).map_err(|_| {
        ForecastError::invalid_parameter(
            "seasonal_period",
            opts.seasonal_period,
            "must be non-negative",
        )
    })?;

    Ok(anofox_cutoff_core::ForecasterOptions {
        model,
        window_length: to_option_usize(opts.window_length),
        seasonal_period,
        alpha: opts.alpha,
        ets_spec: c_buffer_to_str(&opts.ets_spec)?,
    })
}

/// Convert C prediction options; a null pointer uses the defaults.
///
/// # Safety
/// `opts` must be null or point to a valid [`types::PredictOptions`].
pub unsafe fn to_core_predict_options(
    opts: *const types::PredictOptions,
) -> anofox_cutoff_core::PredictOptions {
    if opts.is_null() {
        return anofox_cutoff_core::PredictOptions::default();
    }
    anofox_cutoff_core::PredictOptions {
        return_pred_int: (*opts).return_pred_int,
        confidence_level: (*opts).confidence_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_option_usize() {
        assert_eq!(to_option_usize(5), Some(5));
        assert_eq!(to_option_usize(0), None);
        assert_eq!(to_option_usize(-1), None);
    }

    #[test]
    fn test_c_str_to_str() {
        use std::ffi::CString;

        let c_string = CString::new("hello").unwrap();
        unsafe {
            assert_eq!(c_str_to_str(c_string.as_ptr(), "default"), "hello");
            assert_eq!(c_str_to_str(std::ptr::null(), "default"), "default");
        }
    }

    #[test]
    fn test_buffer_round_trip() {
        let mut buffer = [0 as c_char; 8];
        copy_string_to_buffer("AAdA", &mut buffer);
        assert_eq!(c_buffer_to_str(&buffer).unwrap().as_deref(), Some("AAdA"));

        copy_string_to_buffer("much too long", &mut buffer);
        assert_eq!(buffer[7], 0);
        assert_eq!(c_buffer_to_str(&buffer).unwrap().as_deref(), Some("much to"));

        assert_eq!(c_buffer_to_str(&[0; 4]).unwrap(), None);
    }

    #[test]
    fn test_build_series_masks_invalid_entries() {
        let index = [10i64, 11, 12, 13];
        let values = [1.0, 2.0, 3.0, 4.0];
        let validity = [0b1011u64];

        let series =
            unsafe { build_series(index.as_ptr(), values.as_ptr(), validity.as_ptr(), 4) }.unwrap();
        assert_eq!(series.index(), &[10, 11, 12, 13]);
        assert_eq!(series.values()[0], 1.0);
        assert_eq!(series.values()[1], 2.0);
        assert!(series.values()[2].is_nan());
        assert_eq!(series.values()[3], 4.0);
    }

    #[test]
    fn test_build_series_rejects_null_with_length() {
        let values = [1.0, 2.0];
        let result = unsafe { build_series(std::ptr::null(), values.as_ptr(), std::ptr::null(), 2) };
        assert!(matches!(result, Err(ForecastError::NullPointer(_))));
    }

    #[test]
    fn test_build_series_rejects_unordered_index() {
        let index = [3i64, 2];
        let values = [1.0, 2.0];
        let result =
            unsafe { build_series(index.as_ptr(), values.as_ptr(), std::ptr::null(), 2) };
        assert!(matches!(result, Err(ForecastError::InvalidInput(_))));
    }

    #[test]
    fn test_build_horizon() {
        assert!(unsafe { build_horizon(std::ptr::null(), 3) }.unwrap().is_none());

        let steps = [1i64, 2, 3];
        let fh = unsafe { build_horizon(steps.as_ptr(), 3) }.unwrap().unwrap();
        assert_eq!(fh.as_slice(), &[1, 2, 3]);

        let dup = [1i64, 1];
        assert!(unsafe { build_horizon(dup.as_ptr(), 2) }.is_err());
    }

    #[test]
    fn test_build_splitter_kinds() {
        let steps = [1i64];
        let cutoffs = [4i64, 2];

        let default = types::SplitterOptions::default();
        assert!(unsafe { build_splitter(&default) }.unwrap().is_none());

        let missing_fh = types::SplitterOptions {
            kind: types::SplitterKind::Sliding,
            ..Default::default()
        };
        assert!(matches!(
            unsafe { build_splitter(&missing_fh) },
            Err(ForecastError::MissingHorizon(_))
        ));

        let manual = types::SplitterOptions {
            kind: types::SplitterKind::Manual,
            fh: steps.as_ptr(),
            fh_len: 1,
            window_length: 2,
            cutoffs: cutoffs.as_ptr(),
            n_cutoffs: 2,
            ..Default::default()
        };
        let splitter = unsafe { build_splitter(&manual) }.unwrap().unwrap();
        let y = Series::from_values(0, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(splitter.cutoffs(&y).unwrap(), vec![2, 4]);
    }

    #[test]
    fn test_to_core_options() {
        let mut opts = types::ForecasterOptions::default();
        let core = to_core_options(&opts).unwrap();
        assert_eq!(core.model, ModelType::Naive);
        assert_eq!(core.window_length, None);
        assert_eq!(core.ets_spec, None);

        copy_string_to_buffer("ets", &mut opts.model);
        copy_string_to_buffer("AAN", &mut opts.ets_spec);
        opts.window_length = 12;
        let core = to_core_options(&opts).unwrap();
        assert_eq!(core.model, ModelType::ETS);
        assert_eq!(core.window_length, Some(12));
        assert_eq!(core.ets_spec.as_deref(), Some("AAN"));

        copy_string_to_buffer("unknown", &mut opts.model);
        assert!(matches!(
            to_core_options(&opts),
            Err(ForecastError::InvalidModel(_))
        ));
    }
}
