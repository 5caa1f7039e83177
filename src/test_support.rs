//! Fakes for the collaborator traits, shared by the unit tests.

use crate::stations::error::StationFeedError;
use crate::stations::feed::{parse_feed, StationFeed};
use crate::types::pollutant::Pollutant;
use crate::types::station::{Location, Station};
use crate::types::weather::WeatherSnapshot;
use crate::weather::error::WeatherError;
use crate::weather::WeatherSource;
use crate::LatLon;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const FEED_FIXTURE: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/cpcb_feed.xml"));

pub fn station(id: &str, latitude: f64, longitude: f64, readings: &[(Pollutant, f64)]) -> Station {
    Station {
        id: id.to_string(),
        city: None,
        state: None,
        location: Location {
            latitude,
            longitude,
        },
        readings: readings.iter().copied().collect::<BTreeMap<_, _>>(),
        reported_index: None,
    }
}

/// Serves a fixed station list and counts how often it was asked.
pub struct FakeFeed {
    stations: Option<Vec<Station>>,
    fetches: AtomicUsize,
}

impl FakeFeed {
    pub fn new(stations: Vec<Station>) -> Self {
        Self {
            stations: Some(stations),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn from_fixture() -> Self {
        Self::new(parse_feed(FEED_FIXTURE).expect("fixture parses"))
    }

    /// A feed whose every fetch fails as if the upstream returned garbage.
    pub fn unavailable() -> Self {
        Self {
            stations: None,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StationFeed for FakeFeed {
    async fn fetch_stations(&self) -> Result<Vec<Station>, StationFeedError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match &self.stations {
            Some(stations) => Ok(stations.clone()),
            None => Err(parse_feed("<AqIndex>").expect_err("truncated feed fails to parse")),
        }
    }
}

/// Returns the same weather everywhere and counts requests.
pub struct FakeWeather {
    snapshot: WeatherSnapshot,
    next_day: WeatherSnapshot,
    failing: bool,
    requests: AtomicUsize,
}

impl FakeWeather {
    pub fn uniform(snapshot: WeatherSnapshot) -> Self {
        Self {
            snapshot,
            next_day: snapshot,
            failing: false,
            requests: AtomicUsize::new(0),
        }
    }

    /// A weather service whose every request fails with an unreadable body.
    pub fn unavailable() -> Self {
        Self {
            failing: true,
            ..Self::uniform(WeatherSnapshot::default())
        }
    }

    fn respond(&self, snapshot: WeatherSnapshot) -> Result<WeatherSnapshot, WeatherError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            let garbage = serde_json::from_str::<serde_json::Value>("{").expect_err("truncated json");
            return Err(WeatherError::JsonParse(garbage));
        }
        Ok(snapshot)
    }

    pub fn with_next_day(mut self, next_day: WeatherSnapshot) -> Self {
        self.next_day = next_day;
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

pub fn mild_weather() -> WeatherSnapshot {
    WeatherSnapshot {
        temperature: Some(30.0),
        wind_speed: Some(8.0),
        wind_direction: Some(200.0),
        relative_humidity: Some(55.0),
        surface_pressure: Some(1008.0),
        cloud_cover: Some(20.0),
        precipitation_probability: Some(5.0),
        precipitation: Some(0.0),
        shortwave_radiation: Some(18.5),
    }
}

#[async_trait]
impl WeatherSource for FakeWeather {
    async fn current(&self, _point: LatLon) -> Result<WeatherSnapshot, WeatherError> {
        self.respond(self.snapshot)
    }

    async fn next_day(&self, _point: LatLon) -> Result<WeatherSnapshot, WeatherError> {
        self.respond(self.next_day)
    }
}
