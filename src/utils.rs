use crate::LatLon;
use haversine::{distance, Location as HaversineLocation, Units};

/// Great-circle distance between two points in kilometres (mean Earth radius 6371 km).
pub fn haversine_km(a: LatLon, b: LatLon) -> f64 {
    distance(
        HaversineLocation {
            latitude: a.0,
            longitude: a.1,
        },
        HaversineLocation {
            latitude: b.0,
            longitude: b.1,
        },
        Units::Kilometers,
    )
}
