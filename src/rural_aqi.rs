//! The main entry point: air quality estimates for points between monitoring stations.

use crate::advice::chat::ChatCompletionsClient;
use crate::advice::{AdviceGenerator, HealthAdvisor};
use crate::aqi::converter::AqiConverter;
use crate::cache::proximity_cache::ProximityCache;
use crate::cache::store::{CacheStore, MemoryStore};
use crate::error::RuralAqiError;
use crate::forecast::error::ForecastError;
use crate::forecast::Forecaster;
use crate::history::{AirQualityHistory, DailyAqi};
use crate::interpolation::interpolator::{Interpolator, WeatherContext};
use crate::settings::Settings;
use crate::stations::feed::{CpcbFeed, StationFeed};
use crate::stations::repository::{StationReadingsRepository, StationSet};
use crate::types::estimation::EstimationResult;
use crate::types::pollutant::Pollutant;
use crate::types::station::Station;
use crate::weather::open_meteo::OpenMeteoWeather;
use crate::weather::error::WeatherError;
use crate::weather::WeatherSource;
use bon::bon;
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// ```
/// use rural_aqi::LatLon;
///
/// let vadodara = LatLon(22.3072, 73.1812);
/// assert_eq!(vadodara.0, 22.3072); // Latitude
/// assert_eq!(vadodara.1, 73.1812); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

/// Estimates air quality at arbitrary points from the monitoring network.
///
/// All collaborators are passed in at construction. [`RuralAqi::with_defaults`]
/// wires the production clients; [`RuralAqi::builder`] accepts any
/// implementation of the collaborator traits.
///
/// ```no_run
/// # use rural_aqi::{LatLon, RuralAqi, RuralAqiError, Settings};
/// # #[tokio::main]
/// # async fn main() -> Result<(), RuralAqiError> {
/// let client = RuralAqi::with_defaults(Settings::default())?;
/// let estimate = client
///     .estimate()
///     .location(LatLon(22.45, 73.35))
///     .call()
///     .await?;
/// println!("{} ({})", estimate.overall_index, estimate.dominant_pollutant);
/// # Ok(())
/// # }
/// ```
pub struct RuralAqi {
    repository: StationReadingsRepository,
    weather: Arc<dyn WeatherSource>,
    interpolator: Interpolator,
    converter: AqiConverter,
    cache: ProximityCache,
    settings: Settings,
    advisor: Option<HealthAdvisor>,
    forecaster: Option<Forecaster>,
    history: Option<AirQualityHistory>,
}

#[bon]
impl RuralAqi {
    /// Creates a client from explicit collaborators.
    ///
    /// * `.feed(..)` / `.weather(..)`: **Required.**
    /// * `.cache_store(..)`: Defaults to a fresh [`MemoryStore`].
    /// * `.settings(..)`: Defaults to [`Settings::default`].
    /// * `.advice_generator(..)`, `.forecaster(..)`, `.history(..)`: Optional
    ///   features; the matching methods fail with [`RuralAqiError::NotConfigured`]
    ///   when left out.
    #[builder]
    pub fn new(
        feed: Arc<dyn StationFeed>,
        weather: Arc<dyn WeatherSource>,
        cache_store: Option<Arc<dyn CacheStore>>,
        settings: Option<Settings>,
        advice_generator: Option<Arc<dyn AdviceGenerator>>,
        forecaster: Option<Forecaster>,
        history: Option<AirQualityHistory>,
    ) -> Self {
        let settings = settings.unwrap_or_default();
        let cache_store = cache_store.unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let converter = AqiConverter::default();
        Self {
            repository: StationReadingsRepository::new(feed),
            weather,
            interpolator: Interpolator::new(settings.weight_engine(), settings.neighbours),
            converter,
            cache: ProximityCache::new(cache_store, settings.cache_radius_km, settings.cache_ttl),
            advisor: advice_generator.map(|generator| HealthAdvisor::new(generator, converter)),
            forecaster,
            history,
            settings,
        }
    }

    /// Creates a client backed by the live station feed, Open-Meteo weather and
    /// air quality APIs, the configured chat endpoint and an in-memory cache.
    ///
    /// The forecaster starts without models; register them with
    /// [`Forecaster::with_model`] and pass it to [`RuralAqi::builder`] instead.
    pub fn with_defaults(settings: Settings) -> Result<Self, RuralAqiError> {
        let feed = Arc::new(CpcbFeed::new(settings.feed_url.clone(), settings.feed_timeout)?);
        let weather: Arc<dyn WeatherSource> = Arc::new(OpenMeteoWeather::new(
            settings.weather_url.clone(),
            settings.weather_timeout,
        )?);
        let chat = Arc::new(ChatCompletionsClient::new(
            settings.chat_url.clone(),
            settings.chat_model.clone(),
            settings.chat_timeout,
        )?);
        let history = AirQualityHistory::new(
            settings.air_quality_url.clone(),
            settings.weather_timeout,
            AqiConverter::default(),
        )?;

        Ok(Self::builder()
            .feed(feed)
            .weather(weather.clone())
            .settings(settings)
            .advice_generator(chat)
            .forecaster(Forecaster::new(weather))
            .history(history)
            .build())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn converter(&self) -> AqiConverter {
        self.converter
    }

    /// Estimates air quality at a location.
    ///
    /// * `.location(LatLon)`: **Required.**
    /// * `.bypass_cache(bool)`: Optional. Skip the proximity cache entirely,
    ///   neither reading nor writing it. Defaults to `false`.
    ///
    /// A cached result computed within the cache radius is returned unchanged.
    ///
    /// # Errors
    ///
    /// [`RuralAqiError::StationFeed`] when the station feed is unavailable,
    /// [`RuralAqiError::Weather`] when weather-aware weighting is on and the
    /// weather service fails, and [`RuralAqiError::Aqi`] when no pollutant could
    /// be estimated. Failed queries are not cached.
    #[builder]
    pub async fn estimate(
        &self,
        location: LatLon,
        bypass_cache: Option<bool>,
    ) -> Result<EstimationResult, RuralAqiError> {
        if bypass_cache.unwrap_or(false) {
            return self.compute(location).await;
        }
        self.cache
            .get_or_compute(location, || self.compute(location))
            .await
    }

    /// Runs the full pipeline for `location` without consulting the cache.
    pub async fn compute(&self, location: LatLon) -> Result<EstimationResult, RuralAqiError> {
        let stations = self.repository.fetch().await?;
        let weather = self.weather_context(&stations, location).await?;
        let concentrations = self.interpolator.estimate_all(&stations, location, &weather);
        let summary = self.converter.summarize(&concentrations)?;
        info!(
            "Estimated index {} ({}) at {:?} from {} pollutants",
            summary.overall_index,
            summary.dominant_pollutant,
            location,
            concentrations.len()
        );

        Ok(EstimationResult {
            location,
            concentrations,
            sub_indices: summary.sub_indices,
            overall_index: summary.overall_index,
            dominant_pollutant: summary.dominant_pollutant,
            weather: weather.query,
            computed_at: Utc::now(),
        })
    }

    /// Weather at the query point and at every station an estimate may consult.
    /// Empty when weather-aware weighting is switched off.
    async fn weather_context(
        &self,
        stations: &StationSet,
        location: LatLon,
    ) -> Result<WeatherContext, WeatherError> {
        if !self.settings.weather_aware {
            return Ok(WeatherContext::default());
        }
        let candidates = self.interpolator.candidate_stations(stations, location);
        let mut points = Vec::with_capacity(candidates.len() + 1);
        points.push(location);
        points.extend(candidates.iter().map(Station::lat_lon));

        let mut snapshots = self.weather.current_many(&points).await?.into_iter();
        let query = snapshots.next();
        let by_station = candidates
            .into_iter()
            .map(|station| station.id)
            .zip(snapshots)
            .collect();
        Ok(WeatherContext::new(query, by_station))
    }

    /// Inverse-distance estimate of the network's own reported index at `location`.
    pub async fn index_estimate(&self, location: LatLon) -> Result<Option<f64>, RuralAqiError> {
        let stations = self.repository.fetch().await?;
        Ok(self.interpolator.overall_index_estimate(&stations, location))
    }

    /// Finds monitoring stations near a location, nearest first, with their distance in km.
    ///
    /// * `.location(LatLon)`: **Required.**
    /// * `.pollutant(Pollutant)`: Optional. Only stations reporting this pollutant.
    /// * `.station_limit(usize)`: Optional. Defaults to the configured neighbour count.
    #[builder]
    pub async fn find_stations(
        &self,
        location: LatLon,
        pollutant: Option<Pollutant>,
        station_limit: Option<usize>,
    ) -> Result<Vec<(Station, f64)>, RuralAqiError> {
        let limit = station_limit.unwrap_or(self.settings.neighbours);
        let stations = self.repository.fetch().await?;
        Ok(match pollutant {
            Some(pollutant) => stations.nearest_for_pollutant(location, pollutant, limit),
            None => stations.nearest(location, limit),
        })
    }

    /// Reindexes the cache store and returns how many live entries it holds.
    /// Entries written by other clients sharing the store are included.
    pub async fn warm_cache(&self) -> Result<usize, RuralAqiError> {
        Ok(self.cache.warm_index().await?)
    }

    /// Health advice for an estimate, phrased by the configured generator.
    pub async fn advise(&self, estimate: &EstimationResult) -> Result<String, RuralAqiError> {
        let advisor = self
            .advisor
            .as_ref()
            .ok_or(RuralAqiError::NotConfigured("advice generator"))?;
        Ok(advisor.advise(estimate).await?)
    }

    /// Tomorrow's value of `pollutant` at a location.
    ///
    /// * `.location(LatLon)` / `.pollutant(Pollutant)`: **Required.**
    /// * `.current_value(f64)`: Optional. Today's value; estimated (through the
    ///   cache) when left out.
    #[builder]
    pub async fn forecast(
        &self,
        location: LatLon,
        pollutant: Pollutant,
        current_value: Option<f64>,
    ) -> Result<f64, RuralAqiError> {
        let forecaster = self
            .forecaster
            .as_ref()
            .ok_or(RuralAqiError::NotConfigured("forecaster"))?;
        let current_value = match current_value {
            Some(value) => value,
            None => self
                .estimate()
                .location(location)
                .call()
                .await?
                .concentration(pollutant)
                .ok_or_else(|| ForecastError::MissingFeature(pollutant.to_string()))?,
        };
        Ok(forecaster.forecast(location, pollutant, current_value).await?)
    }

    /// Daily indices for the past week at a location, oldest first.
    pub async fn history(&self, location: LatLon) -> Result<Vec<DailyAqi>, RuralAqiError> {
        let history = self
            .history
            .as_ref()
            .ok_or(RuralAqiError::NotConfigured("air quality history"))?;
        Ok(history.last_week(location).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mild_weather, FakeFeed, FakeWeather};

    fn client(feed: Arc<FakeFeed>, weather: Arc<FakeWeather>) -> RuralAqi {
        RuralAqi::builder().feed(feed).weather(weather).build()
    }

    #[tokio::test]
    async fn estimate_at_a_station() -> Result<(), RuralAqiError> {
        let feed = Arc::new(FakeFeed::from_fixture());
        let weather = Arc::new(FakeWeather::uniform(mild_weather()));
        let client = client(feed, weather);

        // GIDC Makarpura.
        let result = client.compute(LatLon(22.28, 73.19)).await?;
        assert_eq!(result.concentration(Pollutant::Pm25), Some(44.0));
        assert_eq!(result.sub_index(Pollutant::Pm25), Some(73));
        assert_eq!(result.sub_index(Pollutant::Pm10), Some(80));
        assert_eq!(result.sub_index(Pollutant::No2), Some(25));
        // Only Maninagar reports SO2.
        assert_eq!(result.concentration(Pollutant::So2), Some(15.0));
        assert_eq!(result.concentration(Pollutant::Nh3), None);
        assert_eq!(result.overall_index, 80);
        assert_eq!(result.dominant_pollutant, Pollutant::Pm10);
        assert_eq!(result.weather, Some(mild_weather()));

        let response = result.to_response();
        assert_eq!(response.rural_aqi, 80.0);
        assert!(response.data.iter().any(|item| item.key == "temperature"));
        Ok(())
    }

    #[tokio::test]
    async fn nearby_queries_share_one_fetch() -> Result<(), RuralAqiError> {
        let feed = Arc::new(FakeFeed::from_fixture());
        let client = client(feed.clone(), Arc::new(FakeWeather::uniform(mild_weather())));

        let a = client.estimate().location(LatLon(22.30, 73.20)).call().await?;
        let b = client.estimate().location(LatLon(22.32, 73.22)).call().await?;
        assert_eq!(a, b);
        assert_eq!(feed.fetch_count(), 1);

        client
            .estimate()
            .location(LatLon(22.32, 73.22))
            .bypass_cache(true)
            .call()
            .await?;
        assert_eq!(feed.fetch_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn unavailable_feed_is_reported() {
        let client = client(
            Arc::new(FakeFeed::unavailable()),
            Arc::new(FakeWeather::uniform(mild_weather())),
        );
        let err = client
            .estimate()
            .location(LatLon(22.3, 73.2))
            .call()
            .await
            .unwrap_err();
        assert!(err.is_upstream_unavailable());
    }

    #[tokio::test]
    async fn weather_outage_fails_the_query() {
        let store = Arc::new(MemoryStore::new());
        let client = RuralAqi::builder()
            .feed(Arc::new(FakeFeed::from_fixture()))
            .weather(Arc::new(FakeWeather::unavailable()))
            .cache_store(store.clone())
            .build();
        let err = client
            .estimate()
            .location(LatLon(22.3, 73.2))
            .call()
            .await
            .unwrap_err();
        assert!(matches!(err, RuralAqiError::Weather(_)));
        assert!(err.is_upstream_unavailable());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn empty_network_has_no_valid_data() {
        let client = client(
            Arc::new(FakeFeed::new(vec![])),
            Arc::new(FakeWeather::uniform(mild_weather())),
        );
        let err = client.compute(LatLon(22.3, 73.2)).await.unwrap_err();
        assert!(matches!(
            err,
            RuralAqiError::Aqi(crate::aqi::error::AqiError::NoValidPollutantData)
        ));
        assert!(!err.is_upstream_unavailable());
    }

    #[tokio::test]
    async fn weather_is_skipped_when_disabled() -> Result<(), RuralAqiError> {
        let weather = Arc::new(FakeWeather::uniform(mild_weather()));
        let client = RuralAqi::builder()
            .feed(Arc::new(FakeFeed::from_fixture()))
            .weather(weather.clone())
            .settings(Settings::builder().weather_aware(false).build())
            .build();
        let result = client.compute(LatLon(22.5, 73.0)).await?;
        assert_eq!(result.weather, None);
        assert_eq!(weather.request_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn index_estimate_and_station_search() -> Result<(), RuralAqiError> {
        let client = client(
            Arc::new(FakeFeed::from_fixture()),
            Arc::new(FakeWeather::uniform(mild_weather())),
        );
        assert_eq!(client.index_estimate(LatLon(22.34, 73.18)).await?, Some(100.0));

        let so2 = client
            .find_stations()
            .location(LatLon(22.3, 73.2))
            .pollutant(Pollutant::So2)
            .call()
            .await?;
        assert_eq!(so2.len(), 1);
        assert_eq!(so2[0].0.id, "Maninagar - GPCB");

        let nearest = client
            .find_stations()
            .location(LatLon(22.3, 73.2))
            .station_limit(2)
            .call()
            .await?;
        assert_eq!(nearest.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn optional_features_report_missing_configuration() {
        let client = client(
            Arc::new(FakeFeed::from_fixture()),
            Arc::new(FakeWeather::uniform(mild_weather())),
        );
        let result = client.history(LatLon(22.3, 73.2)).await;
        assert!(matches!(result, Err(RuralAqiError::NotConfigured(_))));

        let forecast = client
            .forecast()
            .location(LatLon(22.3, 73.2))
            .pollutant(Pollutant::Pm25)
            .current_value(40.0)
            .call()
            .await;
        assert!(matches!(forecast, Err(RuralAqiError::NotConfigured(_))));
    }
}
