mod advice;
mod aqi;
mod cache;
mod error;
mod forecast;
mod history;
mod interpolation;
mod rural_aqi;
mod settings;
mod stations;
mod types;
mod utils;
mod weather;

#[cfg(test)]
mod test_support;

pub use error::RuralAqiError;
pub use rural_aqi::*;
pub use settings::Settings;

pub use advice::chat::ChatCompletionsClient;
pub use advice::error::AdviceError;
pub use advice::{AdviceGenerator, HealthAdvisor};

pub use aqi::breakpoints::{Breakpoint, BreakpointTable, NATIONAL_AQI};
pub use aqi::category::{AqiCategory, Severity};
pub use aqi::converter::{AqiConverter, AqiSummary};
pub use aqi::error::AqiError;

pub use cache::error::CacheError;
pub use cache::proximity_cache::{cache_key, parse_cache_key, CacheEntry, ProximityCache};
pub use cache::store::{CacheStore, MemoryStore};

pub use forecast::error::ForecastError;
pub use forecast::features::{feature_vector, weather_layout, WeatherFeature};
pub use forecast::{Forecaster, RegressionModel};

pub use history::error::HistoryError;
pub use history::{daily_aqi, daily_averages, AirQualityHistory, DailyAqi, HourlySeries};

pub use interpolation::interpolator::{Interpolator, WeatherContext};
pub use interpolation::weights::{
    normalize, weather_divergence, weighted_average, DirectionMetric, ExactMatch,
    SpatialWeightEngine, WeightKernel, WeightedCandidate,
};

pub use stations::error::StationFeedError;
pub use stations::feed::{parse_feed, CpcbFeed, StationFeed};
pub use stations::repository::{StationReadingsRepository, StationSet};

pub use types::estimation::{DataItem, EstimationResult, RuralAqiResponse};
pub use types::pollutant::{Pollutant, UnknownPollutant};
pub use types::station::{Location, Station};
pub use types::weather::WeatherSnapshot;

pub use utils::haversine_km;

pub use weather::error::WeatherError;
pub use weather::open_meteo::OpenMeteoWeather;
pub use weather::WeatherSource;
