//! FFI boundary layer for the anofox-cutoff forecaster core.
//!
//! This crate exposes stateful forecasters to C/C++ through an opaque
//! handle. Every function reports failures through an [`AnofoxError`] out
//! parameter and never unwinds across the boundary.

pub mod allocation;
pub mod conversion;
pub mod error_handling;
pub mod telemetry;
pub mod types;

use anofox_cutoff_core::{build_forecaster, list_models, Forecaster, Prediction};
use libc::{c_char, c_double, size_t};
use std::ptr;

use crate::allocation::{alloc_and_copy_array, alloc_string_array, free_string_array};
use crate::conversion::{
    build_horizon, build_series, build_splitter, to_core_options, to_core_predict_options,
};
use crate::error_handling::{ffi_try, init_error, set_error};

pub use types::*;

// ============================================================================
// Helper Functions
// ============================================================================

/// Copy a prediction into a C result struct.
///
/// Runs outside `catch_unwind`; on allocation failure the partially filled
/// result is released and `false` is returned.
unsafe fn write_prediction(
    prediction: &Prediction,
    out_result: *mut PredictionResult,
    out_error: *mut AnofoxError,
) -> bool {
    let result = &mut *out_result;
    *result = PredictionResult::default();

    let ok = match prediction {
        Prediction::Series(series) => {
            result.n_rows = series.len();
            result.n_columns = 1;
            alloc_and_copy_array(series.index(), &mut result.index, out_error)
                && alloc_and_copy_array(series.values(), &mut result.values, out_error)
        }
        Prediction::Table(table) => {
            result.n_rows = table.n_rows();
            result.n_columns = table.n_columns();
            let index: Vec<i64> = table
                .columns()
                .iter()
                .flat_map(|c| c.index().iter().copied())
                .collect();
            let values: Vec<f64> = table
                .columns()
                .iter()
                .flat_map(|c| c.values().iter().copied())
                .collect();
            alloc_and_copy_array(&index, &mut result.index, out_error)
                && alloc_and_copy_array(&values, &mut result.values, out_error)
                && alloc_and_copy_array(table.cutoffs(), &mut result.cutoffs, out_error)
        }
    };

    if !ok {
        anofox_cutoff_free_prediction_result(out_result);
    }
    ok
}

// ============================================================================
// Forecaster Lifecycle
// ============================================================================

/// Create a forecaster.
///
/// Returns null on failure; the handle must be released with
/// [`anofox_cutoff_forecaster_free`].
///
/// # Safety
/// `options` must be null (defaults) or valid; `out_error` must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn anofox_cutoff_forecaster_new(
    options: *const ForecasterOptions,
    out_error: *mut AnofoxError,
) -> *mut ForecasterHandle {
    init_error(out_error);

    let handle = ffi_try(out_error, || {
        let opts = if options.is_null() {
            ForecasterOptions::default()
        } else {
            *options
        };
        let core_opts = to_core_options(&opts)?;
        let inner = build_forecaster(&core_opts)?;
        telemetry::capture_forecaster_created(core_opts.model.name());
        Ok(ForecasterHandle { inner })
    });

    match handle {
        Some(handle) => Box::into_raw(Box::new(handle)),
        None => ptr::null_mut(),
    }
}

/// Release a forecaster.
///
/// # Safety
/// The handle must be null or obtained from [`anofox_cutoff_forecaster_new`]
/// and not freed before.
#[no_mangle]
pub unsafe extern "C" fn anofox_cutoff_forecaster_free(handle: *mut ForecasterHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

// ============================================================================
// Fit, Update and Predict
// ============================================================================

/// Fit a forecaster to training data, replacing earlier state.
///
/// `fh` may be null (`fh_len` ignored) when the model does not require a
/// horizon at fit time. Entries whose validity bit is cleared are missing.
///
/// # Safety
/// `index` and `values` must hold `length` elements; `validity` must be null
/// or hold `ceil(length / 64)` words; `fh` must be null or hold `fh_len` elements.
#[no_mangle]
pub unsafe extern "C" fn anofox_cutoff_fit(
    handle: *mut ForecasterHandle,
    index: *const i64,
    values: *const c_double,
    validity: *const u64,
    length: size_t,
    fh: *const i64,
    fh_len: size_t,
    out_error: *mut AnofoxError,
) -> bool {
    ffi_execute!(out_error, [handle], {
        let y = build_series(index, values, validity, length)?;
        let fh = build_horizon(fh, fh_len)?;
        (*handle).inner.fit(&y, fh, None)
    });
    true
}

/// Predict at the current cutoff.
///
/// A null `fh` reuses the horizon stored by an earlier call. `options` may be
/// null for defaults.
///
/// # Safety
/// Pointers must be valid or null as documented; `out_result` must be freed
/// with [`anofox_cutoff_free_prediction_result`].
#[no_mangle]
pub unsafe extern "C" fn anofox_cutoff_predict(
    handle: *mut ForecasterHandle,
    fh: *const i64,
    fh_len: size_t,
    options: *const PredictOptions,
    out_result: *mut PredictionResult,
    out_error: *mut AnofoxError,
) -> bool {
    let prediction = ffi_execute!(out_error, [handle, out_result], {
        let fh = build_horizon(fh, fh_len)?;
        let opts = to_core_predict_options(options);
        (*handle).inner.predict(fh, None, &opts)
    });
    write_prediction(&prediction, out_result, out_error)
}

/// Reveal new observations and move the cutoff to the last of them.
///
/// An empty update (`length == 0`) leaves the forecaster unchanged.
///
/// # Safety
/// Same layout requirements as [`anofox_cutoff_fit`].
#[no_mangle]
pub unsafe extern "C" fn anofox_cutoff_update(
    handle: *mut ForecasterHandle,
    index: *const i64,
    values: *const c_double,
    validity: *const u64,
    length: size_t,
    update_params: bool,
    out_error: *mut AnofoxError,
) -> bool {
    ffi_execute!(out_error, [handle], {
        let y_new = build_series(index, values, validity, length)?;
        (*handle).inner.update(&y_new, None, update_params)
    });
    true
}

/// Walk forward over test data, predicting from a series of moving cutoffs.
///
/// `splitter` may be null to use the forecaster's default sliding window.
/// The forecaster's cutoff is unchanged afterwards, also on failure.
///
/// # Safety
/// Same layout requirements as [`anofox_cutoff_fit`]; `splitter` and
/// `options` must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn anofox_cutoff_update_predict(
    handle: *mut ForecasterHandle,
    index: *const i64,
    values: *const c_double,
    validity: *const u64,
    length: size_t,
    splitter: *const SplitterOptions,
    update_params: bool,
    options: *const PredictOptions,
    out_result: *mut PredictionResult,
    out_error: *mut AnofoxError,
) -> bool {
    let prediction = ffi_execute!(out_error, [handle, out_result], {
        let y_test = build_series(index, values, validity, length)?;
        let cv = if splitter.is_null() {
            None
        } else {
            build_splitter(&*splitter)?
        };
        let opts = to_core_predict_options(options);
        (*handle)
            .inner
            .update_predict(&y_test, cv.as_deref(), None, update_params, &opts)
    });
    write_prediction(&prediction, out_result, out_error)
}

/// Read the current cutoff.
///
/// # Safety
/// `handle` and `out_cutoff` must be valid.
#[no_mangle]
pub unsafe extern "C" fn anofox_cutoff_get_cutoff(
    handle: *const ForecasterHandle,
    out_cutoff: *mut i64,
    out_error: *mut AnofoxError,
) -> bool {
    let cutoff = ffi_execute!(out_error, [handle, out_cutoff], {
        (*handle).inner.cutoff()
    });
    *out_cutoff = cutoff;
    true
}

// ============================================================================
// Model Discovery
// ============================================================================

/// List the available model names.
///
/// # Safety
/// Output pointers must be valid; release the list with
/// [`anofox_cutoff_free_model_list`].
#[no_mangle]
pub unsafe extern "C" fn anofox_cutoff_list_models(
    out_models: *mut *mut *mut c_char,
    out_count: *mut size_t,
    out_error: *mut AnofoxError,
) -> bool {
    let models = ffi_execute!(out_error, [out_models, out_count], { Ok(list_models()) });

    let names: Vec<&str> = models.iter().map(String::as_str).collect();
    if !alloc_string_array(&names, out_models) {
        set_error(
            out_error,
            ErrorCode::AllocationError,
            "Memory allocation failed",
        );
        return false;
    }
    *out_count = names.len();
    true
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a PredictionResult.
///
/// # Safety
/// The result pointer must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn anofox_cutoff_free_prediction_result(result: *mut PredictionResult) {
    if result.is_null() {
        return;
    }
    let r = &mut *result;
    free_fields!(r, index, values, cutoffs);
    r.n_rows = 0;
    r.n_columns = 0;
}

/// Free a model name list.
///
/// # Safety
/// `models` must be null or obtained from [`anofox_cutoff_list_models`]
/// together with `count`.
#[no_mangle]
pub unsafe extern "C" fn anofox_cutoff_free_model_list(models: *mut *mut c_char, count: size_t) {
    free_string_array(models, count);
}

// ============================================================================
// Version
// ============================================================================

#[no_mangle]
pub extern "C" fn anofox_cutoff_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}
