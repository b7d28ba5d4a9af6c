//! C-compatible type definitions for FFI boundary.

use anofox_cutoff_core::{ForecastError, LastWindowForecaster, LastWindowModel};
use libc::{c_char, c_double, c_int, size_t};

/// Error codes for FFI boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    NullPointer = 1,
    InvalidInput = 2,
    InvalidParameter = 3,
    InvalidModel = 4,
    NotFitted = 5,
    MissingHorizon = 6,
    HorizonConflict = 7,
    OutOfBounds = 8,
    InsufficientData = 9,
    NotImplemented = 10,
    FormatError = 11,
    ComputationError = 12,
    InternalError = 13,
    AllocationError = 14,
    PanicCaught = 15,
}

impl From<&ForecastError> for ErrorCode {
    fn from(err: &ForecastError) -> Self {
        match err {
            ForecastError::NullPointer(_) => ErrorCode::NullPointer,
            ForecastError::InvalidInput(_) => ErrorCode::InvalidInput,
            ForecastError::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            ForecastError::InvalidModel(_) => ErrorCode::InvalidModel,
            ForecastError::NotFitted(_) => ErrorCode::NotFitted,
            ForecastError::MissingHorizon(_) => ErrorCode::MissingHorizon,
            ForecastError::HorizonConflict(_) => ErrorCode::HorizonConflict,
            ForecastError::OutOfBounds(_) => ErrorCode::OutOfBounds,
            ForecastError::InsufficientData { .. } => ErrorCode::InsufficientData,
            ForecastError::NotImplemented(_) => ErrorCode::NotImplemented,
            ForecastError::Format(_) => ErrorCode::FormatError,
            ForecastError::ComputationError(_) => ErrorCode::ComputationError,
            ForecastError::InternalError(_) => ErrorCode::InternalError,
        }
    }
}

/// Error structure with message buffer for FFI.
#[repr(C)]
pub struct AnofoxError {
    pub code: ErrorCode,
    pub message: [c_char; 256],
}

impl AnofoxError {
    /// Create a success error (no error).
    pub fn success() -> Self {
        Self {
            code: ErrorCode::Success,
            message: [0; 256],
        }
    }

    /// Set an error with code and message.
    pub fn set_error(&mut self, code: ErrorCode, msg: &str) {
        self.code = code;
        let bytes = msg.as_bytes();
        let len = bytes.len().min(255);
        for (i, &b) in bytes[..len].iter().enumerate() {
            self.message[i] = b as c_char;
        }
        self.message[len] = 0; // Null terminator
    }
}

impl Default for AnofoxError {
    fn default() -> Self {
        Self::success()
    }
}

/// Forecaster construction options.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ForecasterOptions {
    /// Model name (null-terminated string)
    pub model: [c_char; 32],
    /// Window length (<= 0 = model default)
    pub window_length: c_int,
    /// Seasonal period for SeasonalNaive and seasonal ETS
    pub seasonal_period: c_int,
    /// Smoothing parameter for SES
    pub alpha: c_double,
    /// ETS specification (null-terminated, empty = "ANN")
    pub ets_spec: [c_char; 8],
}

impl Default for ForecasterOptions {
    fn default() -> Self {
        let mut model = [0 as c_char; 32];
        b"Naive"
            .iter()
            .enumerate()
            .for_each(|(i, &b)| model[i] = b as c_char);
        Self {
            model,
            window_length: 0,
            seasonal_period: 1,
            alpha: 0.3,
            ets_spec: [0; 8],
        }
    }
}

/// Prediction options.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PredictOptions {
    /// Request prediction intervals (not supported, always fails)
    pub return_pred_int: bool,
    /// Confidence level (0-1)
    pub confidence_level: c_double,
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self {
            return_pred_int: false,
            confidence_level: 0.95,
        }
    }
}

/// Window splitter selection for walk-forward prediction.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitterKind {
    /// Sliding window over the fitted horizon and window length
    Default = 0,
    /// Sliding window with explicit parameters
    Sliding = 1,
    /// Explicit cutoff positions
    Manual = 2,
}

/// Window splitter options.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SplitterOptions {
    pub kind: SplitterKind,
    /// Forecasting horizon steps
    pub fh: *const i64,
    /// Number of horizon steps
    pub fh_len: size_t,
    /// Window length (<= 0 = expanding window for Manual)
    pub window_length: c_int,
    /// Distance between cutoffs (Sliding only)
    pub step_length: c_int,
    /// Start with a full window (Sliding only)
    pub start_with_window: bool,
    /// Zero-based cutoff positions (Manual only)
    pub cutoffs: *const i64,
    /// Number of cutoff positions
    pub n_cutoffs: size_t,
}

impl Default for SplitterOptions {
    fn default() -> Self {
        Self {
            kind: SplitterKind::Default,
            fh: std::ptr::null(),
            fh_len: 0,
            window_length: 0,
            step_length: 1,
            start_with_window: false,
            cutoffs: std::ptr::null(),
            n_cutoffs: 0,
        }
    }
}

/// Prediction result.
///
/// A series is returned as one column; walk-forward tables hold one column
/// per cutoff. Arrays are column-major with `n_rows * n_columns` entries.
#[repr(C)]
pub struct PredictionResult {
    /// Absolute time index of each prediction
    pub index: *mut i64,
    /// Predicted values
    pub values: *mut c_double,
    /// Cutoff of each column (null for a single series)
    pub cutoffs: *mut i64,
    /// Number of predictions per column
    pub n_rows: size_t,
    /// Number of columns
    pub n_columns: size_t,
}

impl Default for PredictionResult {
    fn default() -> Self {
        Self {
            index: std::ptr::null_mut(),
            values: std::ptr::null_mut(),
            cutoffs: std::ptr::null_mut(),
            n_rows: 0,
            n_columns: 0,
        }
    }
}

/// Opaque forecaster handle.
pub struct ForecasterHandle {
    pub(crate) inner: LastWindowForecaster<Box<dyn LastWindowModel>>,
}
