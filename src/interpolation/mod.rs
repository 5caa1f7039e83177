//! Spatial estimation of pollutant values at points without a station.

pub mod interpolator;
pub mod weights;
