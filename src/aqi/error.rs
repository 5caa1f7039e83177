use crate::types::pollutant::Pollutant;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AqiError {
    #[error("No pollutant has a computable sub-index")]
    NoValidPollutantData,

    #[error("Concentration {concentration} of {pollutant} is outside every breakpoint band")]
    OutOfRangeConcentration {
        pollutant: Pollutant,
        concentration: f64,
    },
}
