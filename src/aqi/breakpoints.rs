//! The national breakpoint table.
//!
//! Any edit here changes published index values for existing data and must keep
//! the sub-index/invert round-trip tests passing.

use crate::aqi::category::Severity;
use crate::types::pollutant::Pollutant;

/// One band of a pollutant's piecewise-linear mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub conc_low: f64,
    pub conc_high: f64,
    pub index_low: u16,
    pub index_high: u16,
    pub severity: Severity,
}

/// Six bands per pollutant, ordered by increasing concentration.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakpointTable {
    pub version: &'static str,
    bands: [[Breakpoint; 6]; 7],
}

impl BreakpointTable {
    pub fn bands(&self, pollutant: Pollutant) -> &[Breakpoint; 6] {
        &self.bands[pollutant.ordinal()]
    }
}

const INDEX_BANDS: [(u16, u16); 6] = [(0, 50), (51, 100), (101, 200), (201, 300), (301, 400), (401, 500)];

const SEVERITIES: [Severity; 6] = [
    Severity::Low,
    Severity::Low,
    Severity::Moderate,
    Severity::High,
    Severity::VeryHigh,
    Severity::VeryHigh,
];

const fn band(conc: [(f64, f64); 6], i: usize) -> Breakpoint {
    Breakpoint {
        conc_low: conc[i].0,
        conc_high: conc[i].1,
        index_low: INDEX_BANDS[i].0,
        index_high: INDEX_BANDS[i].1,
        severity: SEVERITIES[i],
    }
}

const fn bands(conc: [(f64, f64); 6]) -> [Breakpoint; 6] {
    [
        band(conc, 0),
        band(conc, 1),
        band(conc, 2),
        band(conc, 3),
        band(conc, 4),
        band(conc, 5),
    ]
}

/// National AQI breakpoints (24-hour averages; µg/m³, CO in mg/m³).
/// Rows follow [`Pollutant::ALL`] order.
pub const NATIONAL_AQI: BreakpointTable = BreakpointTable {
    version: "IN-NAQI-2014",
    bands: [
        // PM2.5
        bands([(0.0, 30.0), (31.0, 60.0), (61.0, 90.0), (91.0, 120.0), (121.0, 250.0), (251.0, 500.0)]),
        // PM10
        bands([(0.0, 50.0), (51.0, 100.0), (101.0, 250.0), (251.0, 350.0), (351.0, 430.0), (431.0, 600.0)]),
        // NO2
        bands([(0.0, 40.0), (41.0, 80.0), (81.0, 180.0), (181.0, 280.0), (281.0, 400.0), (401.0, 1000.0)]),
        // SO2
        bands([(0.0, 40.0), (41.0, 80.0), (81.0, 380.0), (381.0, 800.0), (801.0, 1600.0), (1601.0, 2000.0)]),
        // CO
        bands([(0.0, 1.0), (1.1, 2.0), (2.1, 10.0), (10.1, 17.0), (17.1, 34.0), (34.1, 50.0)]),
        // OZONE
        bands([(0.0, 50.0), (51.0, 100.0), (101.0, 168.0), (169.0, 208.0), (209.0, 748.0), (749.0, 1000.0)]),
        // NH3
        bands([(0.0, 200.0), (201.0, 400.0), (401.0, 800.0), (801.0, 1200.0), (1201.0, 1800.0), (1801.0, 2000.0)]),
    ],
};
