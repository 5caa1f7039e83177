//! Daily index history from modelled hourly concentrations.

pub mod error;

use crate::aqi::converter::AqiConverter;
use crate::types::pollutant::Pollutant;
use crate::LatLon;
use chrono::{Days, NaiveDate, Utc};
use error::HistoryError;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_AIR_QUALITY_URL: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";
pub const HISTORY_DAYS: u64 = 7;

const HOURLY_VARIABLES: &str =
    "pm10,pm2_5,carbon_monoxide,nitrogen_dioxide,sulphur_dioxide,ozone,ammonia";

#[derive(Debug, Default, Deserialize)]
struct AirQualityResponse {
    #[serde(default)]
    hourly: Option<HourlyBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct HourlyBlock {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    pm2_5: Vec<Option<f64>>,
    #[serde(default)]
    pm10: Vec<Option<f64>>,
    #[serde(default)]
    nitrogen_dioxide: Vec<Option<f64>>,
    #[serde(default)]
    sulphur_dioxide: Vec<Option<f64>>,
    #[serde(default)]
    carbon_monoxide: Vec<Option<f64>>,
    #[serde(default)]
    ozone: Vec<Option<f64>>,
    #[serde(default)]
    ammonia: Vec<Option<f64>>,
}

/// Hourly modelled concentrations, all in µg/m³. Each series is aligned with `times`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlySeries {
    pub times: Vec<String>,
    pub values: BTreeMap<Pollutant, Vec<Option<f64>>>,
}

impl From<HourlyBlock> for HourlySeries {
    fn from(block: HourlyBlock) -> Self {
        let values = [
            (Pollutant::Pm25, block.pm2_5),
            (Pollutant::Pm10, block.pm10),
            (Pollutant::No2, block.nitrogen_dioxide),
            (Pollutant::So2, block.sulphur_dioxide),
            (Pollutant::Co, block.carbon_monoxide),
            (Pollutant::Ozone, block.ozone),
            (Pollutant::Nh3, block.ammonia),
        ]
        .into_iter()
        .filter(|(_, series)| !series.is_empty())
        .collect();
        Self {
            times: block.time,
            values,
        }
    }
}

/// One day of the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAqi {
    pub date: NaiveDate,
    /// Daily mean per pollutant, in the units of the breakpoint table.
    pub concentrations: BTreeMap<Pollutant, f64>,
    pub sub_indices: BTreeMap<Pollutant, u16>,
    pub overall_index: u16,
    pub dominant_pollutant: Pollutant,
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Mean of each pollutant per calendar day, rounded to one decimal, skipping
/// null hours. CO is converted to mg/m³ after rounding.
pub fn daily_averages(series: &HourlySeries) -> BTreeMap<NaiveDate, BTreeMap<Pollutant, f64>> {
    let dates: Vec<Option<NaiveDate>> = series
        .times
        .iter()
        .map(|time| {
            let day = time.split('T').next().unwrap_or(time);
            let parsed = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok();
            if parsed.is_none() {
                debug!("Skipping hour with unparseable time '{}'", time);
            }
            parsed
        })
        .collect();

    let mut averages: BTreeMap<NaiveDate, BTreeMap<Pollutant, f64>> = BTreeMap::new();
    for (&pollutant, values) in &series.values {
        let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for (date, value) in dates.iter().zip(values) {
            if let (Some(date), Some(value)) = (date, value) {
                let entry = sums.entry(*date).or_default();
                entry.0 += value;
                entry.1 += 1;
            }
        }
        for (date, (sum, count)) in sums {
            let mut mean = round_to_tenth(sum / count as f64);
            if pollutant == Pollutant::Co {
                mean /= 1000.0;
            }
            averages.entry(date).or_default().insert(pollutant, mean);
        }
    }
    averages
}

/// Sub-indices and overall index per day. Days without any valid sub-index are omitted.
pub fn daily_aqi(
    averages: BTreeMap<NaiveDate, BTreeMap<Pollutant, f64>>,
    converter: &AqiConverter,
) -> Vec<DailyAqi> {
    averages
        .into_iter()
        .filter_map(|(date, concentrations)| match converter.summarize(&concentrations) {
            Ok(summary) => Some(DailyAqi {
                date,
                concentrations,
                sub_indices: summary.sub_indices,
                overall_index: summary.overall_index,
                dominant_pollutant: summary.dominant_pollutant,
            }),
            Err(e) => {
                debug!("Omitting {} from history: {}", date, e);
                None
            }
        })
        .collect()
}

/// Fetches modelled hourly concentrations from the Open-Meteo air quality API.
#[derive(Debug, Clone)]
pub struct AirQualityHistory {
    base_url: String,
    client: Client,
    converter: AqiConverter,
}

impl AirQualityHistory {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        converter: AqiConverter,
    ) -> Result<Self, HistoryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(HistoryError::ClientBuild)?;
        Ok(Self {
            base_url: base_url.into(),
            client,
            converter,
        })
    }

    /// Hourly concentrations at `point` for `start..=end`.
    pub async fn fetch_hourly(
        &self,
        point: LatLon,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HourlySeries, HistoryError> {
        let url = &self.base_url;
        let response = self
            .client
            .get(url)
            .query(&[
                ("latitude", point.0.to_string()),
                ("longitude", point.1.to_string()),
                ("hourly", HOURLY_VARIABLES.to_string()),
                ("start_date", start.to_string()),
                ("end_date", end.to_string()),
            ])
            .send()
            .await
            .map_err(|e| HistoryError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    HistoryError::HttpStatus {
                        url: url.clone(),
                        status,
                        source: e,
                    }
                } else {
                    HistoryError::NetworkRequest(url.clone(), e)
                });
            }
        };

        let body = response
            .text()
            .await
            .map_err(|e| HistoryError::NetworkRequest(url.clone(), e))?;
        let parsed: AirQualityResponse = serde_json::from_str(&body)?;
        Ok(parsed.hourly.map(HourlySeries::from).unwrap_or_default())
    }

    /// Daily indices for the seven days before today (UTC), oldest first.
    pub async fn last_week(&self, point: LatLon) -> Result<Vec<DailyAqi>, HistoryError> {
        let today = Utc::now().date_naive();
        let start = today.checked_sub_days(Days::new(HISTORY_DAYS)).unwrap_or(today);
        let end = today.checked_sub_days(Days::new(1)).unwrap_or(today);
        let series = self.fetch_hourly(point, start, end).await?;
        Ok(daily_aqi(daily_averages(&series), &self.converter))
    }
}
