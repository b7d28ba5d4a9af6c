//! Model selection and forecaster construction.

use crate::error::{ForecastError, Result};
use crate::last_window::{LastWindowForecaster, LastWindowModel};
use crate::models::{
    DirectRegressionModel, DriftModel, EtsModel, NaiveModel, NaiveStrategy, SesModel,
};

/// Available last-window models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    Naive,
    SMA,
    SeasonalNaive,
    RandomWalkDrift,
    SES,
    ETS,
    DirectRegression,
}

impl std::str::FromStr for ModelType {
    type Err = ForecastError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // Exact names first
        match s {
            "Naive" => return Ok(ModelType::Naive),
            "SMA" => return Ok(ModelType::SMA),
            "SeasonalNaive" => return Ok(ModelType::SeasonalNaive),
            "RandomWalkDrift" | "RandomWalkWithDrift" => return Ok(ModelType::RandomWalkDrift),
            "SES" => return Ok(ModelType::SES),
            "ETS" => return Ok(ModelType::ETS),
            "DirectRegression" => return Ok(ModelType::DirectRegression),
            _ => {}
        }

        // Fallback: case-insensitive aliases
        match s.to_lowercase().as_str() {
            "naive" | "last" => Ok(ModelType::Naive),
            "sma" | "mean" | "window_average" => Ok(ModelType::SMA),
            "seasonalnaive" | "seasonal_naive" | "snaive" => Ok(ModelType::SeasonalNaive),
            "randomwalkdrift"
            | "random_walk_drift"
            | "rwd"
            | "drift"
            | "randomwalkwithdrift"
            | "random_walk_with_drift" => Ok(ModelType::RandomWalkDrift),
            "ses" => Ok(ModelType::SES),
            "ets" => Ok(ModelType::ETS),
            "directregression" | "direct_regression" | "direct" => {
                Ok(ModelType::DirectRegression)
            }
            _ => Err(ForecastError::InvalidModel(format!("Unknown model: {}", s))),
        }
    }
}

impl ModelType {
    pub fn name(&self) -> &'static str {
        match self {
            ModelType::Naive => "Naive",
            ModelType::SMA => "SMA",
            ModelType::SeasonalNaive => "SeasonalNaive",
            ModelType::RandomWalkDrift => "RandomWalkDrift",
            ModelType::SES => "SES",
            ModelType::ETS => "ETS",
            ModelType::DirectRegression => "DirectRegression",
        }
    }
}

/// List all available model names.
pub fn list_models() -> Vec<String> {
    [
        ModelType::Naive,
        ModelType::SMA,
        ModelType::SeasonalNaive,
        ModelType::RandomWalkDrift,
        ModelType::SES,
        ModelType::ETS,
        ModelType::DirectRegression,
    ]
    .iter()
    .map(|m| m.name().to_string())
    .collect()
}

/// Forecaster options.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecasterOptions {
    /// Model to use
    pub model: ModelType,
    /// Window length; `None` uses the model default
    pub window_length: Option<usize>,
    /// Seasonal period for SeasonalNaive and seasonal ETS
    pub seasonal_period: usize,
    /// Smoothing parameter for SES
    pub alpha: f64,
    /// ETS model specification (e.g., "AAN", "AAdA"). None means "ANN".
    pub ets_spec: Option<String>,
}

impl Default for ForecasterOptions {
    fn default() -> Self {
        Self {
            model: ModelType::Naive,
            window_length: None,
            seasonal_period: 1,
            alpha: 0.3,
            ets_spec: None,
        }
    }
}

/// Build a last-window forecaster from options.
pub fn build_forecaster(
    options: &ForecasterOptions,
) -> Result<LastWindowForecaster<Box<dyn LastWindowModel>>> {
    let model: Box<dyn LastWindowModel> = match options.model {
        ModelType::Naive => Box::new(NaiveModel::new(NaiveStrategy::Last)?),
        ModelType::SMA => Box::new(NaiveModel::new(NaiveStrategy::Mean)?),
        ModelType::SeasonalNaive => Box::new(NaiveModel::new(NaiveStrategy::SeasonalLast {
            sp: options.seasonal_period,
        })?),
        ModelType::RandomWalkDrift => Box::new(DriftModel),
        ModelType::SES => Box::new(SesModel::new(options.alpha)?),
        ModelType::ETS => Box::new(EtsModel::new(
            options.ets_spec.as_deref().unwrap_or("ANN"),
            options.seasonal_period,
        )?),
        ModelType::DirectRegression => Box::new(DirectRegressionModel::new()),
    };

    LastWindowForecaster::new(model, options.window_length)
}
