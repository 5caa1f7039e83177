use crate::interpolation::weights::{
    weighted_average, DirectionMetric, SpatialWeightEngine, WeightedCandidate,
};
use crate::stations::repository::{StationSet, DEFAULT_NEIGHBOURS};
use crate::types::pollutant::Pollutant;
use crate::types::station::Station;
use crate::types::weather::WeatherSnapshot;
use crate::LatLon;
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// Weather known at query time: at the query point and at candidate stations,
/// keyed by station id. Either may be empty, in which case weighting falls back
/// to distance alone.
#[derive(Debug, Clone, Default)]
pub struct WeatherContext {
    pub query: Option<WeatherSnapshot>,
    pub stations: HashMap<String, WeatherSnapshot>,
}

impl WeatherContext {
    pub fn new(query: Option<WeatherSnapshot>, stations: HashMap<String, WeatherSnapshot>) -> Self {
        Self { query, stations }
    }

    fn for_station(&self, station: &Station) -> Option<WeatherSnapshot> {
        self.stations.get(&station.id).copied()
    }
}

/// Estimates pollutant values at arbitrary points from a [`StationSet`].
#[derive(Debug, Clone, Copy)]
pub struct Interpolator {
    pollutant_engine: SpatialWeightEngine,
    index_engine: SpatialWeightEngine,
    neighbours: usize,
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::new(
            SpatialWeightEngine::distance_weather(1.0, 1.0, DirectionMetric::Linear, 10.0),
            DEFAULT_NEIGHBOURS,
        )
    }
}

impl Interpolator {
    /// `pollutant_engine` weights per-pollutant estimates. The aggregate index
    /// estimate always uses inverse-distance weighting with a zero-distance match.
    pub fn new(pollutant_engine: SpatialWeightEngine, neighbours: usize) -> Self {
        Self {
            pollutant_engine,
            index_engine: SpatialWeightEngine::inverse_distance(),
            neighbours,
        }
    }

    pub fn neighbours(&self) -> usize {
        self.neighbours
    }

    /// The estimated value of `pollutant` at `point`.
    ///
    /// A co-located station's value is passed through unchanged; otherwise the
    /// weighted average of the nearest reporting stations is rounded to the
    /// nearest integer. `None` when no station reports the pollutant.
    pub fn estimate(
        &self,
        stations: &StationSet,
        point: LatLon,
        pollutant: Pollutant,
        weather: &WeatherContext,
    ) -> Option<f64> {
        let nearest = stations.nearest_for_pollutant(point, pollutant, self.neighbours);
        if nearest.is_empty() {
            debug!("No station reports {} near {:?}", pollutant, point);
            return None;
        }

        let candidates: Vec<WeightedCandidate> = nearest
            .iter()
            .filter_map(|(station, distance_km)| {
                station.reading(pollutant).map(|value| WeightedCandidate {
                    distance_km: *distance_km,
                    value,
                    weather: weather.for_station(station),
                })
            })
            .collect();

        if let Some(exact) = self.pollutant_engine.co_located(&candidates) {
            debug!(
                "{} at {:?} taken from co-located station {}",
                pollutant, point, nearest[exact].0.id
            );
            return Some(candidates[exact].value);
        }

        let weights = self.pollutant_engine.weights(&candidates, weather.query.as_ref());
        weighted_average(&candidates, &weights).map(f64::round)
    }

    /// Estimates every pollutant in enumeration order, keeping only the ones
    /// that have a value.
    pub fn estimate_all(
        &self,
        stations: &StationSet,
        point: LatLon,
        weather: &WeatherContext,
    ) -> BTreeMap<Pollutant, f64> {
        Pollutant::ALL
            .iter()
            .filter_map(|&pollutant| {
                self.estimate(stations, point, pollutant, weather)
                    .map(|value| (pollutant, value))
            })
            .collect()
    }

    /// Inverse-distance estimate of the network's own overall index at `point`,
    /// from the nearest stations that report one. Not rounded.
    pub fn overall_index_estimate(&self, stations: &StationSet, point: LatLon) -> Option<f64> {
        let candidates: Vec<WeightedCandidate> = stations
            .nearest_reporting_index(point, self.neighbours)
            .into_iter()
            .filter_map(|(station, distance_km)| {
                station.reported_index.map(|value| WeightedCandidate {
                    distance_km,
                    value,
                    weather: None,
                })
            })
            .collect();

        if let Some(exact) = self.index_engine.co_located(&candidates) {
            return Some(candidates[exact].value);
        }
        let weights = self.index_engine.weights(&candidates, None);
        weighted_average(&candidates, &weights)
    }

    /// Every station that any per-pollutant estimate at `point` would consult,
    /// without duplicates, in first-seen order. Used to fetch station weather
    /// once per station rather than once per pollutant.
    pub fn candidate_stations(&self, stations: &StationSet, point: LatLon) -> Vec<Station> {
        let mut seen = std::collections::HashSet::new();
        Pollutant::ALL
            .iter()
            .flat_map(|&pollutant| stations.nearest_for_pollutant(point, pollutant, self.neighbours))
            .filter_map(|(station, _)| seen.insert(station.id.clone()).then_some(station))
            .collect()
    }
}
