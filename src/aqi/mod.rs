//! Conversion between pollutant concentrations and the 0–500 national index.

pub mod breakpoints;
pub mod category;
pub mod converter;
pub mod error;
