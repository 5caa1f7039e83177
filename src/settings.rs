//! Tunables for the estimation pipeline and its upstream clients.

use crate::advice::chat::{DEFAULT_CHAT_MODEL, DEFAULT_CHAT_URL};
use crate::cache::proximity_cache::{DEFAULT_CACHE_RADIUS_KM, DEFAULT_CACHE_TTL};
use crate::history::DEFAULT_AIR_QUALITY_URL;
use crate::interpolation::weights::{DirectionMetric, SpatialWeightEngine};
use crate::stations::feed::DEFAULT_FEED_URL;
use crate::stations::repository::DEFAULT_NEIGHBOURS;
use crate::weather::open_meteo::DEFAULT_FORECAST_URL;
use bon::Builder;
use std::time::Duration;

/// Configuration for [`crate::RuralAqi`]. Every field has a default, so
/// `Settings::builder().build()` equals `Settings::default()`.
///
/// ```
/// use rural_aqi::Settings;
/// use std::time::Duration;
///
/// let settings = Settings::builder()
///     .neighbours(8)
///     .cache_ttl(Duration::from_secs(600))
///     .build();
/// assert_eq!(settings.neighbours, 8);
/// assert_eq!(settings.cache_radius_km, 10.0);
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct Settings {
    /// Stations consulted per pollutant estimate.
    #[builder(default = DEFAULT_NEIGHBOURS)]
    pub neighbours: usize,
    /// Distance within which a station's own reading is used as the estimate.
    #[builder(default = 10.0)]
    pub exact_match_km: f64,
    /// Weight of the distance term.
    #[builder(default = 1.0)]
    pub alpha: f64,
    /// Weight of the weather divergence term.
    #[builder(default = 1.0)]
    pub beta: f64,
    #[builder(default)]
    pub direction_metric: DirectionMetric,
    /// Fetch weather for the query point and candidate stations and use it in weighting.
    #[builder(default = true)]
    pub weather_aware: bool,
    #[builder(default = DEFAULT_CACHE_RADIUS_KM)]
    pub cache_radius_km: f64,
    #[builder(default = DEFAULT_CACHE_TTL)]
    pub cache_ttl: Duration,
    #[builder(default = DEFAULT_FEED_URL.to_string(), into)]
    pub feed_url: String,
    #[builder(default = Duration::from_secs(30))]
    pub feed_timeout: Duration,
    #[builder(default = DEFAULT_FORECAST_URL.to_string(), into)]
    pub weather_url: String,
    #[builder(default = Duration::from_secs(20))]
    pub weather_timeout: Duration,
    #[builder(default = DEFAULT_AIR_QUALITY_URL.to_string(), into)]
    pub air_quality_url: String,
    #[builder(default = DEFAULT_CHAT_URL.to_string(), into)]
    pub chat_url: String,
    #[builder(default = DEFAULT_CHAT_MODEL.to_string(), into)]
    pub chat_model: String,
    #[builder(default = Duration::from_secs(60))]
    pub chat_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Settings {
    /// The per-pollutant weight engine these settings describe.
    pub fn weight_engine(&self) -> SpatialWeightEngine {
        SpatialWeightEngine::distance_weather(
            self.alpha,
            self.beta,
            self.direction_metric,
            self.exact_match_km,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::weights::{ExactMatch, WeightKernel};

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.neighbours, 5);
        assert_eq!(settings.exact_match_km, 10.0);
        assert_eq!(settings.direction_metric, DirectionMetric::Linear);
        assert!(settings.weather_aware);
        assert_eq!(settings.cache_ttl, Duration::from_secs(1800));
        assert_eq!(settings.feed_timeout, Duration::from_secs(30));
        assert_eq!(settings.weather_timeout, Duration::from_secs(20));
        assert_eq!(settings.chat_timeout, Duration::from_secs(60));
        assert_eq!(settings.feed_url, DEFAULT_FEED_URL);
    }

    #[test]
    fn weight_engine_follows_settings() {
        let settings = Settings::builder()
            .alpha(2.0)
            .direction_metric(DirectionMetric::Circular)
            .exact_match_km(3.0)
            .build();
        let engine = settings.weight_engine();
        assert_eq!(engine.exact_match(), ExactMatch::WithinKm(3.0));
        assert_eq!(
            engine.kernel(),
            WeightKernel::DistanceWeather {
                alpha: 2.0,
                beta: 1.0,
                direction: DirectionMetric::Circular
            }
        );
    }
}
