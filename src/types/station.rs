//! Defines the data structures representing monitoring stations and their latest
//! pollutant readings, as parsed from the network feed.

use crate::types::pollutant::Pollutant;
use crate::utils::haversine_km;
use crate::LatLon;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single monitoring station and the most recent averaged reading for each
/// pollutant it reports.
///
/// A station is an immutable snapshot: it is fetched fresh for each top-level
/// computation and never persisted. Readings the feed marked as unavailable are
/// simply missing from [`Station::readings`]; they are never stored as zero.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Station {
    /// The station identifier as published by the feed (e.g. "Nizampura - GPCB").
    pub id: String,
    /// The city the station is filed under, if the feed provided one.
    pub city: Option<String>,
    /// The state the station is filed under, if the feed provided one.
    pub state: Option<String>,
    /// Geographical location of the station.
    pub location: Location,
    /// Latest averaged reading per pollutant. Absent pollutants have no entry.
    pub readings: BTreeMap<Pollutant, f64>,
    /// The overall index the network itself reports for this station, if any.
    pub reported_index: Option<f64>,
}

/// Represents the geographical location of a monitoring station.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees (positive for North, negative for South).
    pub latitude: f64,
    /// Longitude in decimal degrees (positive for East, negative for West).
    pub longitude: f64,
}

impl Station {
    /// Returns the reading for `pollutant`, or `None` if the station does not report it.
    pub fn reading(&self, pollutant: Pollutant) -> Option<f64> {
        self.readings.get(&pollutant).copied()
    }

    /// Whether the station reports a value for `pollutant`.
    pub fn reports(&self, pollutant: Pollutant) -> bool {
        self.readings.contains_key(&pollutant)
    }

    pub fn lat_lon(&self) -> LatLon {
        LatLon(self.location.latitude, self.location.longitude)
    }

    /// Great-circle distance in kilometres from this station to `point`.
    pub fn distance_km(&self, point: LatLon) -> f64 {
        haversine_km(self.lat_lon(), point)
    }
}
