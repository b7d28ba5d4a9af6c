//! Standardized error handling utilities for FFI functions.

use crate::types::{AnofoxError, ErrorCode};
use anofox_cutoff_core::ForecastError;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Initialize error output to success state.
///
/// # Safety
/// The error pointer must be valid if non-null.
#[inline]
pub unsafe fn init_error(out_error: *mut AnofoxError) {
    if !out_error.is_null() {
        *out_error = AnofoxError::success();
    }
}

/// Set an error on the output error pointer.
///
/// # Safety
/// The error pointer must be valid if non-null.
#[inline]
pub unsafe fn set_error(out_error: *mut AnofoxError, code: ErrorCode, message: &str) {
    if !out_error.is_null() {
        (*out_error).set_error(code, message);
    }
}

/// Report a core error with its stable error code.
///
/// # Safety
/// The error pointer must be valid if non-null.
#[inline]
pub unsafe fn set_forecast_error(out_error: *mut AnofoxError, err: &ForecastError) {
    set_error(out_error, ErrorCode::from(err), &err.to_string());
}

/// Check if any of the given pointers are null, and set an error if so.
///
/// # Safety
/// The error pointer must be valid if non-null.
#[inline]
pub unsafe fn check_null_pointers(
    out_error: *mut AnofoxError,
    ptrs: &[*const core::ffi::c_void],
) -> bool {
    for ptr in ptrs {
        if ptr.is_null() {
            set_error(out_error, ErrorCode::NullPointer, "Null pointer argument");
            return true;
        }
    }
    false
}

/// Run `f`, catching panics and converting errors to FFI errors.
///
/// The error output must already be initialised.
///
/// # Safety
/// The error pointer must be valid if non-null.
///
/// # Returns
/// `Some(value)` on success, `None` on error
pub unsafe fn ffi_try<F, T>(out_error: *mut AnofoxError, f: F) -> Option<T>
where
    F: FnOnce() -> Result<T, ForecastError>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            set_forecast_error(out_error, &e);
            None
        }
        Err(_) => {
            set_error(out_error, ErrorCode::PanicCaught, "Panic in Rust code");
            None
        }
    }
}

/// Macro for the common bool-returning FFI pattern with null checks.
///
/// Initialises the error, rejects null pointers and runs the body under
/// [`ffi_try`]. Evaluates to the body's value, or returns `false` from the
/// enclosing function on failure.
///
/// Usage:
/// ```ignore
/// ffi_execute!(out_error, [handle, out_result], {
///     // Your code here, returning Result<T, ForecastError>
/// })
/// ```
#[macro_export]
macro_rules! ffi_execute {
    ($out_error:expr, [$($ptr:expr),+ $(,)?], $body:block) => {{
        use $crate::error_handling::{check_null_pointers, ffi_try, init_error};

        init_error($out_error);

        let ptrs: &[*const core::ffi::c_void] = &[
            $($ptr as *const core::ffi::c_void),+
        ];

        if check_null_pointers($out_error, ptrs) {
            return false;
        }

        match ffi_try($out_error, || $body) {
            Some(value) => value,
            None => return false,
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_error() {
        let mut error = AnofoxError::default();
        unsafe {
            set_error(&mut error, ErrorCode::NullPointer, "stale");
            init_error(&mut error);
        }
        assert_eq!(error.code, ErrorCode::Success);
        assert_eq!(error.message[0], 0);
    }

    #[test]
    fn test_ffi_try_success() {
        let mut error = AnofoxError::default();
        let result = unsafe { ffi_try(&mut error, || Ok::<_, ForecastError>(42)) };
        assert_eq!(result, Some(42));
        assert_eq!(error.code, ErrorCode::Success);
    }

    #[test]
    fn test_ffi_try_maps_error_code() {
        let mut error = AnofoxError::default();
        let result = unsafe {
            ffi_try(&mut error, || {
                Err::<i32, _>(ForecastError::HorizonConflict("test".to_string()))
            })
        };
        assert_eq!(result, None);
        assert_eq!(error.code, ErrorCode::HorizonConflict);
    }

    #[test]
    fn test_ffi_try_catches_panic() {
        let mut error = AnofoxError::default();
        let result: Option<i32> = unsafe { ffi_try(&mut error, || panic!("boom")) };
        assert_eq!(result, None);
        assert_eq!(error.code, ErrorCode::PanicCaught);
    }

    #[test]
    fn test_check_null_pointers() {
        let mut error = AnofoxError::default();
        let value = 1.0f64;
        let ptrs = [&value as *const f64 as *const core::ffi::c_void];
        assert!(!unsafe { check_null_pointers(&mut error, &ptrs) });

        let ptrs = [std::ptr::null::<core::ffi::c_void>()];
        assert!(unsafe { check_null_pointers(&mut error, &ptrs) });
        assert_eq!(error.code, ErrorCode::NullPointer);
    }
}
