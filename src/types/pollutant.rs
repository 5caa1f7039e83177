//! Defines the closed set of pollutants reported by the monitoring network.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A pollutant tracked by the monitoring network and the national index.
///
/// The declaration order is significant: it is the enumeration order used to
/// break ties when selecting the dominant pollutant, and the order in which
/// per-pollutant estimates are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pollutant {
    /// Fine particulate matter (µg/m³).
    #[serde(rename = "PM2.5")]
    Pm25,
    /// Coarse particulate matter (µg/m³).
    #[serde(rename = "PM10")]
    Pm10,
    /// Nitrogen dioxide (µg/m³).
    #[serde(rename = "NO2")]
    No2,
    /// Sulphur dioxide (µg/m³).
    #[serde(rename = "SO2")]
    So2,
    /// Carbon monoxide (mg/m³).
    #[serde(rename = "CO")]
    Co,
    /// Ground-level ozone (µg/m³).
    #[serde(rename = "OZONE")]
    Ozone,
    /// Ammonia (µg/m³).
    #[serde(rename = "NH3")]
    Nh3,
}

impl Pollutant {
    /// All pollutants in enumeration order.
    pub const ALL: [Pollutant; 7] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::No2,
        Pollutant::So2,
        Pollutant::Co,
        Pollutant::Ozone,
        Pollutant::Nh3,
    ];

    /// The name used by the monitoring feed and in serialized responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
            Pollutant::No2 => "NO2",
            Pollutant::So2 => "SO2",
            Pollutant::Co => "CO",
            Pollutant::Ozone => "OZONE",
            Pollutant::Nh3 => "NH3",
        }
    }

    pub(crate) fn ordinal(&self) -> usize {
        match self {
            Pollutant::Pm25 => 0,
            Pollutant::Pm10 => 1,
            Pollutant::No2 => 2,
            Pollutant::So2 => 3,
            Pollutant::Co => 4,
            Pollutant::Ozone => 5,
            Pollutant::Nh3 => 6,
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a feed identifier does not name a known pollutant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown pollutant identifier '{0}'")]
pub struct UnknownPollutant(pub String);

/// Parses feed identifiers. Matching ignores case and whitespace, so
/// `"pm 2.5"` and `"PM2.5"` are the same pollutant. `O3` is accepted for ozone.
impl FromStr for Pollutant {
    type Err = UnknownPollutant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        match normalized.as_str() {
            "PM2.5" => Ok(Pollutant::Pm25),
            "PM10" => Ok(Pollutant::Pm10),
            "NO2" => Ok(Pollutant::No2),
            "SO2" => Ok(Pollutant::So2),
            "CO" => Ok(Pollutant::Co),
            "OZONE" | "O3" => Ok(Pollutant::Ozone),
            "NH3" => Ok(Pollutant::Nh3),
            _ => Err(UnknownPollutant(s.to_string())),
        }
    }
}
