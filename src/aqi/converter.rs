use crate::aqi::breakpoints::{Breakpoint, BreakpointTable, NATIONAL_AQI};
use crate::aqi::category::Severity;
use crate::aqi::error::AqiError;
use crate::types::pollutant::Pollutant;
use log::debug;
use std::collections::BTreeMap;

/// Sub-indices for a set of concentrations and the overall index derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct AqiSummary {
    pub sub_indices: BTreeMap<Pollutant, u16>,
    pub overall_index: u16,
    pub dominant_pollutant: Pollutant,
}

/// Maps concentrations to sub-indices and back using a [`BreakpointTable`].
#[derive(Debug, Clone, Copy)]
pub struct AqiConverter {
    table: &'static BreakpointTable,
}

impl Default for AqiConverter {
    fn default() -> Self {
        Self::new(&NATIONAL_AQI)
    }
}

impl AqiConverter {
    pub fn new(table: &'static BreakpointTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'static BreakpointTable {
        self.table
    }

    /// Finds the band for `concentration` by upper bound. A value that falls
    /// between one band's high and the next band's low belongs to the next band.
    fn locate_band(&self, pollutant: Pollutant, concentration: f64) -> Option<&'static Breakpoint> {
        if !concentration.is_finite() || concentration < 0.0 {
            return None;
        }
        self.table
            .bands(pollutant)
            .iter()
            .find(|band| concentration <= band.conc_high)
    }

    /// Like [`AqiConverter::sub_index`], but reports why no index exists.
    pub fn checked_sub_index(&self, pollutant: Pollutant, concentration: f64) -> Result<u16, AqiError> {
        let band = self.locate_band(pollutant, concentration).ok_or(
            AqiError::OutOfRangeConcentration {
                pollutant,
                concentration,
            },
        )?;
        let c = concentration.max(band.conc_low);
        let slope = f64::from(band.index_high - band.index_low) / (band.conc_high - band.conc_low);
        let index = slope * (c - band.conc_low) + f64::from(band.index_low);
        Ok(index.round() as u16)
    }

    /// The 0–500 sub-index for `concentration`, or `None` if it lies outside
    /// every band of the pollutant's table.
    pub fn sub_index(&self, pollutant: Pollutant, concentration: f64) -> Option<u16> {
        self.checked_sub_index(pollutant, concentration).ok()
    }

    /// The representative concentration for a sub-index, rounded to the nearest
    /// whole unit. `None` above 500.
    pub fn invert(&self, pollutant: Pollutant, sub_index: u16) -> Option<f64> {
        let band = self
            .table
            .bands(pollutant)
            .iter()
            .find(|band| sub_index <= band.index_high)?;
        let slope = (band.conc_high - band.conc_low) / f64::from(band.index_high - band.index_low);
        let concentration = f64::from(sub_index.saturating_sub(band.index_low)) * slope + band.conc_low;
        Some(concentration.round())
    }

    /// Severity label of a raw concentration, independent of the 0–500 scale.
    pub fn severity(&self, pollutant: Pollutant, concentration: f64) -> Option<Severity> {
        self.locate_band(pollutant, concentration)
            .map(|band| band.severity)
    }

    /// Sub-indices for every concentration that falls inside its table.
    /// Out-of-range pollutants are dropped.
    pub fn sub_indices(&self, concentrations: &BTreeMap<Pollutant, f64>) -> BTreeMap<Pollutant, u16> {
        concentrations
            .iter()
            .filter_map(|(&pollutant, &concentration)| {
                match self.checked_sub_index(pollutant, concentration) {
                    Ok(index) => Some((pollutant, index)),
                    Err(e) => {
                        debug!("Dropping sub-index: {}", e);
                        None
                    }
                }
            })
            .collect()
    }

    /// The overall index (maximum sub-index) and the pollutant achieving it.
    /// Ties go to the pollutant that comes first in enumeration order.
    pub fn overall(&self, sub_indices: &BTreeMap<Pollutant, u16>) -> Result<(u16, Pollutant), AqiError> {
        let mut best: Option<(u16, Pollutant)> = None;
        // BTreeMap iterates in enumeration order, so a strict comparison keeps the first maximum.
        for (&pollutant, &index) in sub_indices {
            match best {
                Some((top, _)) if index <= top => {}
                _ => best = Some((index, pollutant)),
            }
        }
        best.ok_or(AqiError::NoValidPollutantData)
    }

    /// Computes sub-indices and the overall index in one step.
    pub fn summarize(&self, concentrations: &BTreeMap<Pollutant, f64>) -> Result<AqiSummary, AqiError> {
        let sub_indices = self.sub_indices(concentrations);
        let (overall_index, dominant_pollutant) = self.overall(&sub_indices)?;
        Ok(AqiSummary {
            sub_indices,
            overall_index,
            dominant_pollutant,
        })
    }
}
