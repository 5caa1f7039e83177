//! Feature layouts the next-day regression models were trained on.

use crate::forecast::error::ForecastError;
use crate::types::pollutant::Pollutant;
use crate::types::weather::WeatherSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherFeature {
    Temperature,
    Humidity,
    Precipitation,
    WindSpeed,
    WindDirection,
    SolarRadiation,
    SurfacePressure,
}

impl WeatherFeature {
    pub fn name(&self) -> &'static str {
        match self {
            WeatherFeature::Temperature => "temperature",
            WeatherFeature::Humidity => "humidity",
            WeatherFeature::Precipitation => "precipitation",
            WeatherFeature::WindSpeed => "wind_speed",
            WeatherFeature::WindDirection => "wind_direction",
            WeatherFeature::SolarRadiation => "solar radiation",
            WeatherFeature::SurfacePressure => "surface_pressure",
        }
    }

    pub fn value(&self, weather: &WeatherSnapshot) -> Option<f64> {
        match self {
            WeatherFeature::Temperature => weather.temperature,
            WeatherFeature::Humidity => weather.relative_humidity,
            WeatherFeature::Precipitation => weather.precipitation,
            WeatherFeature::WindSpeed => weather.wind_speed,
            WeatherFeature::WindDirection => weather.wind_direction,
            WeatherFeature::SolarRadiation => weather.shortwave_radiation,
            WeatherFeature::SurfacePressure => weather.surface_pressure,
        }
    }
}

/// The four weather features used for `pollutant`, in model order. Each is
/// taken once from today's weather and once from tomorrow's.
pub fn weather_layout(pollutant: Pollutant) -> Result<[WeatherFeature; 4], ForecastError> {
    use WeatherFeature::*;
    match pollutant {
        Pollutant::Pm25 => Ok([Temperature, Humidity, WindSpeed, WindDirection]),
        Pollutant::Pm10 => Ok([Temperature, Precipitation, WindSpeed, WindDirection]),
        Pollutant::No2 | Pollutant::Ozone => Ok([Temperature, Humidity, WindSpeed, SolarRadiation]),
        Pollutant::So2 => Ok([Temperature, Precipitation, WindSpeed, SurfacePressure]),
        Pollutant::Co | Pollutant::Nh3 => Err(ForecastError::UnsupportedPollutant(pollutant)),
    }
}

/// `[value, today's features..., tomorrow's features...]`.
pub fn feature_vector(
    pollutant: Pollutant,
    value: f64,
    today: &WeatherSnapshot,
    tomorrow: &WeatherSnapshot,
) -> Result<Vec<f64>, ForecastError> {
    let layout = weather_layout(pollutant)?;
    let mut features = Vec::with_capacity(1 + 2 * layout.len());
    features.push(value);
    for feature in layout {
        features.push(
            feature
                .value(today)
                .ok_or_else(|| ForecastError::MissingFeature(feature.name().to_string()))?,
        );
    }
    for feature in layout {
        features.push(
            feature
                .value(tomorrow)
                .ok_or_else(|| ForecastError::MissingFeature(format!("{}_t+1", feature.name())))?,
        );
    }
    Ok(features)
}
