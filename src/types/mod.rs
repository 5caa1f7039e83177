pub mod estimation;
pub mod pollutant;
pub mod station;
pub mod weather;
