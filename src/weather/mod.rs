//! Weather collaborator used for divergence weighting, ambient response fields
//! and forecast features.

pub mod error;
pub mod open_meteo;

use crate::types::weather::WeatherSnapshot;
use crate::LatLon;
use async_trait::async_trait;
use error::WeatherError;
use futures_util::future::try_join_all;

/// Provides current and next-day weather for a point.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Current conditions at `point`, plus today's precipitation and radiation sums.
    async fn current(&self, point: LatLon) -> Result<WeatherSnapshot, WeatherError>;

    /// Daily mean conditions for the day after today at `point`.
    async fn next_day(&self, point: LatLon) -> Result<WeatherSnapshot, WeatherError>;

    /// Current conditions for several points, fetched concurrently. Results are
    /// in the same order as `points`; the first failure fails the whole batch.
    async fn current_many(&self, points: &[LatLon]) -> Result<Vec<WeatherSnapshot>, WeatherError> {
        try_join_all(points.iter().map(|point| self.current(*point))).await
    }
}
