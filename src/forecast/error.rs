use crate::types::pollutant::Pollutant;
use crate::weather::error::WeatherError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("No forecast model exists for {0}")]
    UnsupportedPollutant(Pollutant),

    #[error("No forecast model is registered for {0}")]
    ModelNotRegistered(Pollutant),

    #[error("Forecast feature '{0}' is unavailable")]
    MissingFeature(String),

    #[error("Regression model failed: {0}")]
    Model(String),

    #[error(transparent)]
    Weather(#[from] WeatherError),
}
