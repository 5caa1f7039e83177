//! The result of estimating air quality at a query point, and its wire shape.

use crate::types::pollutant::Pollutant;
use crate::types::weather::WeatherSnapshot;
use crate::LatLon;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Estimated air quality at one location.
///
/// Created once per computed query and then either returned directly or stored
/// in the proximity cache. A cache hit returns the stored value unchanged,
/// including [`EstimationResult::location`] and [`EstimationResult::computed_at`]
/// of the query that originally produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    /// The query point the estimate was computed for.
    pub location: LatLon,
    /// Estimated concentration per pollutant. Pollutants without an estimate are absent.
    pub concentrations: BTreeMap<Pollutant, f64>,
    /// Sub-index per pollutant. Out-of-range concentrations have no entry.
    pub sub_indices: BTreeMap<Pollutant, u16>,
    /// The maximum sub-index.
    pub overall_index: u16,
    /// The pollutant achieving [`EstimationResult::overall_index`].
    pub dominant_pollutant: Pollutant,
    /// Ambient weather at the query point, if it was available.
    pub weather: Option<WeatherSnapshot>,
    pub computed_at: DateTime<Utc>,
}

/// A single `{key, value}` entry of a [`RuralAqiResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    pub key: String,
    pub value: f64,
}

/// The response shape served for an inbound `(latitude, longitude)` query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuralAqiResponse {
    pub rural_aqi: f64,
    pub dominant_pollutant: Pollutant,
    pub data: Vec<DataItem>,
}

impl EstimationResult {
    pub fn concentration(&self, pollutant: Pollutant) -> Option<f64> {
        self.concentrations.get(&pollutant).copied()
    }

    pub fn sub_index(&self, pollutant: Pollutant) -> Option<u16> {
        self.sub_indices.get(&pollutant).copied()
    }

    /// Flattens the result into the served response: one data item per
    /// estimated pollutant concentration, followed by the ambient weather fields.
    pub fn to_response(&self) -> RuralAqiResponse {
        let mut data: Vec<DataItem> = self
            .concentrations
            .iter()
            .map(|(pollutant, value)| DataItem {
                key: pollutant.to_string(),
                value: *value,
            })
            .collect();

        if let Some(weather) = &self.weather {
            data.extend(weather.ambient_fields().into_iter().map(|(key, value)| DataItem {
                key: key.to_string(),
                value,
            }));
        }

        RuralAqiResponse {
            rural_aqi: f64::from(self.overall_index),
            dominant_pollutant: self.dominant_pollutant,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_lists_pollutants_then_weather() {
        let result = EstimationResult {
            location: LatLon(22.3, 73.2),
            concentrations: BTreeMap::from([(Pollutant::Pm10, 80.0), (Pollutant::Pm25, 44.0)]),
            sub_indices: BTreeMap::from([(Pollutant::Pm10, 80), (Pollutant::Pm25, 73)]),
            overall_index: 80,
            dominant_pollutant: Pollutant::Pm10,
            weather: Some(WeatherSnapshot {
                temperature: Some(30.0),
                ..Default::default()
            }),
            computed_at: Utc::now(),
        };

        let response = result.to_response();
        assert_eq!(response.rural_aqi, 80.0);
        assert_eq!(response.dominant_pollutant, Pollutant::Pm10);
        let keys: Vec<&str> = response.data.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["PM2.5", "PM10", "temperature"]);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["dominant_pollutant"], "PM10");
        assert_eq!(json["data"][0]["key"], "PM2.5");
        assert_eq!(json["data"][0]["value"], 44.0);
    }
}
