use crate::types::weather::WeatherSnapshot;
use crate::weather::error::WeatherError;
use crate::weather::WeatherSource;
use crate::LatLon;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const CURRENT_VARIABLES: &str = "temperature_2m,wind_speed_10m,wind_direction_10m,relative_humidity_2m,surface_pressure,cloud_cover,precipitation_probability";
const TODAY_VARIABLES: &str = "precipitation_sum,shortwave_radiation_sum";
const DAILY_MEAN_VARIABLES: &str = "temperature_2m_mean,relative_humidity_2m_mean,wind_speed_10m_mean,winddirection_10m_dominant,precipitation_sum,shortwave_radiation_sum,surface_pressure_mean";

/// [`WeatherSource`] backed by the Open-Meteo forecast API.
#[derive(Debug, Clone)]
pub struct OpenMeteoWeather {
    base_url: String,
    client: Client,
}

#[derive(Debug, Default, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    current: Option<CurrentBlock>,
    #[serde(default)]
    daily: Option<DailyBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct CurrentBlock {
    temperature_2m: Option<f64>,
    wind_speed_10m: Option<f64>,
    wind_direction_10m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    surface_pressure: Option<f64>,
    cloud_cover: Option<f64>,
    precipitation_probability: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct DailyBlock {
    #[serde(default)]
    temperature_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m_mean: Vec<Option<f64>>,
    #[serde(default)]
    winddirection_10m_dominant: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    shortwave_radiation_sum: Vec<Option<f64>>,
    #[serde(default)]
    surface_pressure_mean: Vec<Option<f64>>,
}

fn day_value(series: &[Option<f64>], day: usize) -> Option<f64> {
    series.get(day).copied().flatten()
}

impl ForecastResponse {
    fn current_snapshot(&self) -> WeatherSnapshot {
        let current = self.current.as_ref();
        let daily = self.daily.as_ref();
        WeatherSnapshot {
            temperature: current.and_then(|c| c.temperature_2m),
            wind_speed: current.and_then(|c| c.wind_speed_10m),
            wind_direction: current.and_then(|c| c.wind_direction_10m),
            relative_humidity: current.and_then(|c| c.relative_humidity_2m),
            surface_pressure: current.and_then(|c| c.surface_pressure),
            cloud_cover: current.and_then(|c| c.cloud_cover),
            precipitation_probability: current.and_then(|c| c.precipitation_probability),
            precipitation: daily.and_then(|d| day_value(&d.precipitation_sum, 0)),
            shortwave_radiation: daily.and_then(|d| day_value(&d.shortwave_radiation_sum, 0)),
        }
    }

    fn daily_snapshot(&self, day: usize) -> WeatherSnapshot {
        let Some(daily) = self.daily.as_ref() else {
            return WeatherSnapshot::default();
        };
        WeatherSnapshot {
            temperature: day_value(&daily.temperature_2m_mean, day),
            wind_speed: day_value(&daily.wind_speed_10m_mean, day),
            wind_direction: day_value(&daily.winddirection_10m_dominant, day),
            relative_humidity: day_value(&daily.relative_humidity_2m_mean, day),
            surface_pressure: day_value(&daily.surface_pressure_mean, day),
            precipitation: day_value(&daily.precipitation_sum, day),
            shortwave_radiation: day_value(&daily.shortwave_radiation_sum, day),
            ..Default::default()
        }
    }
}

impl OpenMeteoWeather {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(WeatherError::ClientBuild)?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    async fn request(
        &self,
        point: LatLon,
        params: &[(&str, &str)],
    ) -> Result<ForecastResponse, WeatherError> {
        let url = &self.base_url;
        debug!("Requesting weather at {:?} from {}", point, url);
        let response = self
            .client
            .get(url)
            .query(&[
                ("latitude", point.0.to_string()),
                ("longitude", point.1.to_string()),
            ])
            .query(params)
            .send()
            .await
            .map_err(|e| WeatherError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    WeatherError::HttpStatus {
                        url: url.clone(),
                        status,
                        source: e,
                    }
                } else {
                    WeatherError::NetworkRequest(url.clone(), e)
                });
            }
        };

        let body = response
            .text()
            .await
            .map_err(|e| WeatherError::NetworkRequest(url.clone(), e))?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoWeather {
    async fn current(&self, point: LatLon) -> Result<WeatherSnapshot, WeatherError> {
        let response = self
            .request(
                point,
                &[
                    ("current", CURRENT_VARIABLES),
                    ("daily", TODAY_VARIABLES),
                    ("forecast_days", "1"),
                ],
            )
            .await?;
        Ok(response.current_snapshot())
    }

    async fn next_day(&self, point: LatLon) -> Result<WeatherSnapshot, WeatherError> {
        let response = self
            .request(
                point,
                &[("daily", DAILY_MEAN_VARIABLES), ("forecast_days", "3")],
            )
            .await?;
        Ok(response.daily_snapshot(1))
    }
}
