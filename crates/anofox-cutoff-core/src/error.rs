//! Error types for the cutoff control core.

use thiserror::Error;

/// Result type for forecaster operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Error types for forecaster operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Null pointer argument: {0}")]
    NullPointer(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid parameter '{param}' = '{value}': {reason}")]
    InvalidParameter {
        param: String,
        value: String,
        reason: String,
    },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Not fitted: {0}")]
    NotFitted(String),

    #[error("Missing forecasting horizon: {0}")]
    MissingHorizon(String),

    #[error("Forecasting horizon conflict: {0}")]
    HorizonConflict(String),

    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ForecastError {
    /// Convert to an error code for FFI.
    pub fn to_code(&self) -> i32 {
        match self {
            ForecastError::NullPointer(_) => 1,
            ForecastError::InvalidInput(_) => 2,
            ForecastError::InvalidParameter { .. } => 3,
            ForecastError::InvalidModel(_) => 4,
            ForecastError::NotFitted(_) => 5,
            ForecastError::MissingHorizon(_) => 6,
            ForecastError::HorizonConflict(_) => 7,
            ForecastError::OutOfBounds(_) => 8,
            ForecastError::InsufficientData { .. } => 9,
            ForecastError::NotImplemented(_) => 10,
            ForecastError::Format(_) => 11,
            ForecastError::ComputationError(_) => 12,
            ForecastError::InternalError(_) => 13,
        }
    }

    /// Whether the error stems from malformed caller input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ForecastError::InvalidInput(_)
                | ForecastError::InvalidParameter { .. }
                | ForecastError::InvalidModel(_)
        )
    }

    pub(crate) fn invalid_parameter(
        param: &str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        ForecastError::InvalidParameter {
            param: param.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
