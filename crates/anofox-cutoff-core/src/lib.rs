//! Cutoff and forecasting-horizon control for anofox forecasters.
//!
//! This crate owns the temporal bookkeeping shared by every forecaster: the
//! observation horizon, the cutoff forecasts are made from, the policy that
//! governs the forecasting horizon, and the walk-forward loop that simulates
//! predictions from a series of moving cutoffs.

pub mod error;
pub mod forecaster;
pub mod formatting;
pub mod horizon;
pub mod last_window;
pub mod models;
pub mod options;
pub mod series;
pub mod splitter;
pub mod state;
pub mod validation;

// Re-exports for convenience
pub use error::{ForecastError, Result};
pub use forecaster::{
    DetachedCutoff, Forecaster, ForecasterCore, PredictOptions, DEFAULT_CONFIDENCE_LEVEL,
};
pub use formatting::{format_moving_cutoff_predictions, Prediction, PredictionTable};
pub use horizon::{ForecastingHorizon, HorizonPolicy};
pub use last_window::{LastWindowForecaster, LastWindowModel};
pub use models::{
    DirectRegressionModel, DriftModel, EtsModel, NaiveModel, NaiveStrategy, SesModel,
};
pub use options::{build_forecaster, list_models, ForecasterOptions, ModelType};
pub use series::{ExogenousData, Series};
pub use splitter::{
    ManualWindowSplitter, SlidingWindowSplitter, Split, Splitter, DEFAULT_STEP_LENGTH,
    DEFAULT_WINDOW_LENGTH,
};
pub use state::TemporalState;
pub use validation::{
    check_confidence_level, check_cutoffs, check_fh, check_series, check_step_length, check_y,
    check_window_length,
};
