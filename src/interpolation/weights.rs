//! Interpolation weights between a query point and candidate stations.

use crate::types::weather::WeatherSnapshot;

/// When a candidate is close enough to the query point to be treated as the
/// ground truth for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExactMatch {
    /// Only a candidate at exactly 0 km. Used for the aggregate index estimate.
    ZeroDistance,
    /// Any candidate at or within the given distance in km. Used for per-pollutant estimates.
    WithinKm(f64),
}

impl ExactMatch {
    pub fn matches(&self, distance_km: f64) -> bool {
        match self {
            ExactMatch::ZeroDistance => distance_km == 0.0,
            ExactMatch::WithinKm(threshold) => distance_km <= *threshold,
        }
    }
}

/// How the wind-direction term of the weather divergence is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectionMetric {
    /// `|a - b| / 180`. 350° against 10° counts as 340° apart.
    #[default]
    Linear,
    /// Shortest angular difference divided by 180.
    Circular,
}

impl DirectionMetric {
    fn divergence(&self, a: f64, b: f64) -> f64 {
        let delta = (a - b).abs();
        match self {
            DirectionMetric::Linear => delta / 180.0,
            DirectionMetric::Circular => {
                let wrapped = delta % 360.0;
                wrapped.min(360.0 - wrapped) / 180.0
            }
        }
    }
}

/// The weighting function applied once no candidate is co-located.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightKernel {
    /// `1 / d²`.
    InverseDistanceSquared,
    /// `exp(-alpha * sd² - beta * sv²)` where `sd` and `sv` are distance and
    /// weather divergence, each scaled by the largest value among the candidates.
    DistanceWeather {
        alpha: f64,
        beta: f64,
        direction: DirectionMetric,
    },
}

/// A station as seen by the weight engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedCandidate {
    pub distance_km: f64,
    pub value: f64,
    pub weather: Option<WeatherSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialWeightEngine {
    kernel: WeightKernel,
    exact_match: ExactMatch,
}

impl SpatialWeightEngine {
    pub fn new(kernel: WeightKernel, exact_match: ExactMatch) -> Self {
        Self {
            kernel,
            exact_match,
        }
    }

    /// Inverse-distance-squared weighting with the zero-distance exact match.
    pub fn inverse_distance() -> Self {
        Self::new(WeightKernel::InverseDistanceSquared, ExactMatch::ZeroDistance)
    }

    /// Distance and weather kernel with the within-threshold exact match.
    pub fn distance_weather(
        alpha: f64,
        beta: f64,
        direction: DirectionMetric,
        exact_match_km: f64,
    ) -> Self {
        Self::new(
            WeightKernel::DistanceWeather {
                alpha,
                beta,
                direction,
            },
            ExactMatch::WithinKm(exact_match_km),
        )
    }

    pub fn kernel(&self) -> WeightKernel {
        self.kernel
    }

    pub fn exact_match(&self) -> ExactMatch {
        self.exact_match
    }

    /// Index of the nearest candidate that counts as co-located, if any.
    pub fn co_located(&self, candidates: &[WeightedCandidate]) -> Option<usize> {
        candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| self.exact_match.matches(c.distance_km))
            .min_by(|a, b| a.1.distance_km.total_cmp(&b.1.distance_km))
            .map(|(i, _)| i)
    }

    /// One non-negative weight per candidate.
    ///
    /// A co-located candidate gets weight 1 and every other candidate 0. An empty
    /// candidate set gives an empty result; callers treat a zero sum as "no estimate".
    pub fn weights(
        &self,
        candidates: &[WeightedCandidate],
        query_weather: Option<&WeatherSnapshot>,
    ) -> Vec<f64> {
        if candidates.is_empty() {
            return vec![];
        }

        if let Some(exact) = self.co_located(candidates) {
            let mut weights = vec![0.0; candidates.len()];
            weights[exact] = 1.0;
            return weights;
        }

        match self.kernel {
            WeightKernel::InverseDistanceSquared => candidates
                .iter()
                .map(|c| {
                    if c.distance_km > 0.0 {
                        1.0 / (c.distance_km * c.distance_km)
                    } else {
                        0.0
                    }
                })
                .collect(),
            WeightKernel::DistanceWeather {
                alpha,
                beta,
                direction,
            } => {
                let divergences: Vec<f64> = candidates
                    .iter()
                    .map(|c| match (query_weather, c.weather.as_ref()) {
                        (Some(query), Some(station)) => weather_divergence(query, station, direction),
                        _ => 0.0,
                    })
                    .collect();
                let distances: Vec<f64> = candidates.iter().map(|c| c.distance_km).collect();
                let scaled_distances = scale_by_max(&distances);
                let scaled_divergences = scale_by_max(&divergences);

                scaled_distances
                    .iter()
                    .zip(scaled_divergences.iter())
                    .map(|(sd, sv)| (-alpha * sd * sd - beta * sv * sv).exp())
                    .collect()
            }
        }
    }
}

/// `|Δtemperature| + |Δwind_speed| + direction term`. A term missing on either
/// side contributes nothing.
pub fn weather_divergence(a: &WeatherSnapshot, b: &WeatherSnapshot, direction: DirectionMetric) -> f64 {
    let temperature = a
        .temperature
        .zip(b.temperature)
        .map_or(0.0, |(x, y)| (x - y).abs());
    let wind_speed = a
        .wind_speed
        .zip(b.wind_speed)
        .map_or(0.0, |(x, y)| (x - y).abs());
    let wind_direction = a
        .wind_direction
        .zip(b.wind_direction)
        .map_or(0.0, |(x, y)| direction.divergence(x, y));
    temperature + wind_speed + wind_direction
}

/// Divides each value by the maximum, mapping onto [0, 1]. All zeros stay zero.
fn scale_by_max(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if max > 0.0 {
        values.iter().map(|v| v / max).collect()
    } else {
        vec![0.0; values.len()]
    }
}

/// Scales weights to sum to 1. A zero or empty sum is returned unchanged.
pub fn normalize(weights: &[f64]) -> Vec<f64> {
    let sum: f64 = weights.iter().sum();
    if sum > 0.0 {
        weights.iter().map(|w| w / sum).collect()
    } else {
        weights.to_vec()
    }
}

/// Weighted mean of candidate values, or `None` when the weights sum to zero.
pub fn weighted_average(candidates: &[WeightedCandidate], weights: &[f64]) -> Option<f64> {
    let weight_sum: f64 = weights.iter().sum();
    if weight_sum <= 0.0 || !weight_sum.is_finite() {
        return None;
    }
    let weighted_sum: f64 = candidates
        .iter()
        .zip(weights.iter())
        .map(|(c, w)| c.value * w)
        .sum();
    Some(weighted_sum / weight_sum)
}
