use crate::stations::error::StationFeedError;
use crate::stations::feed::StationFeed;
use crate::types::pollutant::Pollutant;
use crate::types::station::Station;
use crate::LatLon;
use log::info;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

/// Default number of stations consulted per estimate.
pub const DEFAULT_NEIGHBOURS: usize = 5;

/// Fetches station snapshots from a [`StationFeed`].
#[derive(Clone)]
pub struct StationReadingsRepository {
    feed: Arc<dyn StationFeed>,
}

impl StationReadingsRepository {
    pub fn new(feed: Arc<dyn StationFeed>) -> Self {
        Self { feed }
    }

    /// Fetches a fresh snapshot of every usable station. Not retried; a failed
    /// fetch is returned to the caller as-is.
    pub async fn fetch(&self) -> Result<StationSet, StationFeedError> {
        let stations = self.feed.fetch_stations().await?;
        info!("Station snapshot holds {} usable stations", stations.len());
        Ok(StationSet::new(stations))
    }
}

/// An immutable snapshot of the station network, queried by proximity.
#[derive(Debug, Clone, Default)]
pub struct StationSet {
    stations: Vec<Station>,
}

// Helper struct for BinaryHeap ordering
struct StationCandidate<'a> {
    distance_km: OrderedFloat<f64>,
    station: &'a Station,
}
// Manual implementations (only compare distance)
impl PartialEq for StationCandidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.distance_km == other.distance_km
    }
}
impl Eq for StationCandidate<'_> {}
impl PartialOrd for StationCandidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for StationCandidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_km.cmp(&other.distance_km)
    }
}

impl StationSet {
    pub fn new(stations: Vec<Station>) -> Self {
        Self { stations }
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter()
    }

    /// Up to `k` stations that report `pollutant`, nearest first, paired with
    /// their great-circle distance in kilometres.
    ///
    /// Selection is per pollutant: a station that does not report `pollutant`
    /// never takes a slot, so sparsely covered pollutants reach further out.
    pub fn nearest_for_pollutant(
        &self,
        point: LatLon,
        pollutant: Pollutant,
        k: usize,
    ) -> Vec<(Station, f64)> {
        self.nearest_matching(point, k, |station| station.reports(pollutant))
    }

    /// Up to `k` stations that carry a network-reported overall index, nearest first.
    pub fn nearest_reporting_index(&self, point: LatLon, k: usize) -> Vec<(Station, f64)> {
        self.nearest_matching(point, k, |station| station.reported_index.is_some())
    }

    /// Up to `k` stations regardless of what they report, nearest first.
    pub fn nearest(&self, point: LatLon, k: usize) -> Vec<(Station, f64)> {
        self.nearest_matching(point, k, |_| true)
    }

    /// Bounded max-heap of the `k` best candidates seen so far.
    fn nearest_matching(
        &self,
        point: LatLon,
        k: usize,
        accept: impl Fn(&Station) -> bool,
    ) -> Vec<(Station, f64)> {
        if k == 0 {
            return vec![];
        }

        let mut heap: BinaryHeap<StationCandidate<'_>> = BinaryHeap::with_capacity(k + 1);
        for station in self.stations.iter().filter(|s| accept(s)) {
            let candidate = StationCandidate {
                distance_km: OrderedFloat(station.distance_km(point)),
                station,
            };

            if heap.len() < k {
                heap.push(candidate);
            } else if let Some(worst) = heap.peek() {
                if candidate.distance_km < worst.distance_km {
                    heap.pop(); // Remove element with largest distance
                    heap.push(candidate);
                }
            }
        }

        heap.into_sorted_vec() // Sorts ascending by distance (based on Ord impl)
            .into_iter()
            .map(|c| (c.station.to_owned(), c.distance_km.into_inner()))
            .collect()
    }
}

impl From<Vec<Station>> for StationSet {
    fn from(stations: Vec<Station>) -> Self {
        Self::new(stations)
    }
}
