//! Ambient weather at a point, as returned by a [`crate::WeatherSource`].

use serde::{Deserialize, Serialize};

/// A snapshot of the weather at one location. Every field is optional because
/// upstream providers routinely return nulls for individual variables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Air temperature at 2 m, °C.
    pub temperature: Option<f64>,
    /// Wind speed at 10 m, km/h.
    pub wind_speed: Option<f64>,
    /// Wind direction at 10 m, degrees.
    pub wind_direction: Option<f64>,
    /// Relative humidity at 2 m, %.
    pub relative_humidity: Option<f64>,
    /// Surface pressure, hPa.
    pub surface_pressure: Option<f64>,
    /// Total cloud cover, %.
    pub cloud_cover: Option<f64>,
    /// Precipitation probability, %.
    pub precipitation_probability: Option<f64>,
    /// Daily precipitation sum, mm.
    pub precipitation: Option<f64>,
    /// Daily shortwave radiation sum, MJ/m².
    pub shortwave_radiation: Option<f64>,
}

impl WeatherSnapshot {
    /// The ambient fields reported alongside an estimate, in response order.
    /// Missing values are skipped.
    pub fn ambient_fields(&self) -> Vec<(&'static str, f64)> {
        [
            ("temperature", self.temperature),
            ("wind_speed", self.wind_speed),
            ("wind_direction", self.wind_direction),
            ("relative_humidity", self.relative_humidity),
            ("surface_pressure", self.surface_pressure),
            ("cloud_cover", self.cloud_cover),
            ("precipitation_probability", self.precipitation_probability),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}
