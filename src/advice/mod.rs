//! Health advice phrased by a conversational model.

pub mod chat;
pub mod error;

use crate::aqi::category::AqiCategory;
use crate::aqi::converter::AqiConverter;
use crate::types::estimation::EstimationResult;
use async_trait::async_trait;
use error::AdviceError;
use log::debug;
use std::sync::Arc;

/// Turns a prompt into advisory text.
#[async_trait]
pub trait AdviceGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AdviceError>;
}

/// Builds the advisory prompt for an estimate and asks an [`AdviceGenerator`] to phrase it.
#[derive(Clone)]
pub struct HealthAdvisor {
    generator: Arc<dyn AdviceGenerator>,
    converter: AqiConverter,
}

impl HealthAdvisor {
    pub fn new(generator: Arc<dyn AdviceGenerator>, converter: AqiConverter) -> Self {
        Self {
            generator,
            converter,
        }
    }

    /// `AQI: {category}, Dominant Pollutant: {pollutant}, Level: {severity}`.
    ///
    /// The level is the severity band of the dominant pollutant's estimated
    /// concentration, or `Unknown` when there is none.
    pub fn build_prompt(&self, result: &EstimationResult) -> String {
        let category = AqiCategory::from_index(result.overall_index);
        let level = result
            .concentration(result.dominant_pollutant)
            .and_then(|c| self.converter.severity(result.dominant_pollutant, c))
            .map_or_else(|| "Unknown".to_string(), |s| s.to_string());
        format!(
            "AQI: {}, Dominant Pollutant: {}, Level: {}",
            category, result.dominant_pollutant, level
        )
    }

    pub async fn advise(&self, result: &EstimationResult) -> Result<String, AdviceError> {
        let prompt = self.build_prompt(result);
        debug!("Requesting health advice for prompt '{}'", prompt);
        let advice = self.generator.generate(&prompt).await?;
        Ok(advice.trim().to_string())
    }
}
