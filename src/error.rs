use crate::advice::error::AdviceError;
use crate::aqi::error::AqiError;
use crate::cache::error::CacheError;
use crate::forecast::error::ForecastError;
use crate::history::error::HistoryError;
use crate::stations::error::StationFeedError;
use crate::weather::error::WeatherError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuralAqiError {
    #[error(transparent)]
    StationFeed(#[from] StationFeedError),

    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error(transparent)]
    Aqi(#[from] AqiError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Advice(#[from] AdviceError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("No {0} is configured for this client")]
    NotConfigured(&'static str),
}

impl RuralAqiError {
    /// Whether the station feed or the weather service could not be reached,
    /// answered with a failure status, or sent an unreadable document.
    pub fn is_upstream_unavailable(&self) -> bool {
        matches!(
            self,
            RuralAqiError::StationFeed(_) | RuralAqiError::Weather(_)
        )
    }
}
