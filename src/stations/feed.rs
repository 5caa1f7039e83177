//! Retrieval and parsing of the monitoring network's XML feed.

use crate::stations::error::StationFeedError;
use crate::types::pollutant::Pollutant;
use crate::types::station::{Location, Station};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_FEED_URL: &str = "https://airquality.cpcb.gov.in/caaqms/rss_feed";

/// The network's marker for a reading that is not available.
const NO_DATA_SENTINEL: &str = "NA";

/// Source of raw station records.
///
/// Implemented by [`CpcbFeed`] for the live network; tests substitute fakes.
#[async_trait]
pub trait StationFeed: Send + Sync {
    async fn fetch_stations(&self) -> Result<Vec<Station>, StationFeedError>;
}

/// Fetches the national monitoring feed over HTTP.
#[derive(Debug, Clone)]
pub struct CpcbFeed {
    url: String,
    client: Client,
}

impl CpcbFeed {
    /// Creates a feed client for `url`. The whole request, including reading the
    /// body, is bounded by `timeout`; a timed-out fetch is reported as
    /// [`StationFeedError::NetworkRequest`].
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, StationFeedError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(StationFeedError::ClientBuild)?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl StationFeed for CpcbFeed {
    async fn fetch_stations(&self) -> Result<Vec<Station>, StationFeedError> {
        info!("Fetching station feed from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| StationFeedError::NetworkRequest(self.url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", self.url, e);
                return Err(if let Some(status) = e.status() {
                    StationFeedError::HttpStatus {
                        url: self.url.clone(),
                        status,
                        source: e,
                    }
                } else {
                    StationFeedError::NetworkRequest(self.url.clone(), e)
                });
            }
        };

        let body = response
            .text()
            .await
            .map_err(|e| StationFeedError::NetworkRequest(self.url.clone(), e))?;

        let parse_start = std::time::Instant::now();
        let stations = tokio::task::spawn_blocking(move || parse_feed(&body)).await??;
        info!(
            "Parsed {} stations from feed in {:?}",
            stations.len(),
            parse_start.elapsed()
        );
        Ok(stations)
    }
}

// --- Feed document shape: Country > State > City > Station ---

#[derive(Debug, Deserialize)]
struct FeedDocument {
    #[serde(rename = "Country", default)]
    countries: Vec<CountryNode>,
}

#[derive(Debug, Deserialize)]
struct CountryNode {
    #[serde(rename = "State", default)]
    states: Vec<StateNode>,
}

#[derive(Debug, Deserialize)]
struct StateNode {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "City", default)]
    cities: Vec<CityNode>,
}

#[derive(Debug, Deserialize)]
struct CityNode {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "Station", default)]
    stations: Vec<StationNode>,
}

#[derive(Debug, Deserialize)]
struct StationNode {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    latitude: Option<String>,
    #[serde(default)]
    longitude: Option<String>,
    #[serde(rename = "Pollutant_Index", default)]
    pollutants: Vec<PollutantNode>,
    #[serde(rename = "Air_Quality_Index", default)]
    air_quality_index: Option<AirQualityIndexNode>,
}

#[derive(Debug, Deserialize)]
struct PollutantNode {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "Avg", default)]
    avg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AirQualityIndexNode {
    #[serde(rename = "Value", default)]
    value: Option<String>,
}

/// Parses the feed document into station records.
///
/// Fails only if the payload is not a feed document. Stations with missing or
/// non-numeric coordinates are skipped; readings that are the `"NA"` sentinel,
/// non-numeric, or for unknown pollutants are left out of the station's readings.
pub fn parse_feed(xml: &str) -> Result<Vec<Station>, StationFeedError> {
    let document: FeedDocument =
        serde_xml_rs::from_str(xml).map_err(StationFeedError::MalformedPayload)?;

    let mut stations = Vec::new();
    let mut skipped = 0usize;
    for country in document.countries {
        for state in country.states {
            for city in state.cities {
                for node in city.stations {
                    match station_from_node(node, state.id.as_deref(), city.id.as_deref()) {
                        Some(station) => stations.push(station),
                        None => skipped += 1,
                    }
                }
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} stations with missing or invalid coordinates", skipped);
    }
    Ok(stations)
}

fn station_from_node(node: StationNode, state: Option<&str>, city: Option<&str>) -> Option<Station> {
    let latitude = node.latitude.as_deref().and_then(parse_number);
    let longitude = node.longitude.as_deref().and_then(parse_number);
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        warn!(
            "Dropping station {:?}: coordinates {:?}/{:?} are not usable",
            node.id, node.latitude, node.longitude
        );
        return None;
    };

    let id = node
        .id
        .unwrap_or_else(|| format!("{:.4},{:.4}", latitude, longitude));

    let mut readings = BTreeMap::new();
    for pollutant_node in node.pollutants {
        let Some(raw_id) = pollutant_node.id.as_deref() else {
            continue;
        };
        let Ok(pollutant) = raw_id.parse::<Pollutant>() else {
            debug!("Station {}: ignoring unknown pollutant '{}'", id, raw_id);
            continue;
        };
        match pollutant_node.avg.as_deref().and_then(parse_reading) {
            Some(value) => {
                readings.insert(pollutant, value);
            }
            None => debug!(
                "Station {}: no usable {} reading ({:?})",
                id, pollutant, pollutant_node.avg
            ),
        }
    }

    let reported_index = node
        .air_quality_index
        .and_then(|aqi| aqi.value)
        .as_deref()
        .and_then(parse_reading);

    Some(Station {
        id,
        city: city.map(str::to_string),
        state: state.map(str::to_string),
        location: Location {
            latitude,
            longitude,
        },
        readings,
        reported_index,
    })
}

/// Parses a reading, treating the no-data sentinel as absent.
pub(crate) fn parse_reading(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case(NO_DATA_SENTINEL) {
        return None;
    }
    parse_number(trimmed)
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
