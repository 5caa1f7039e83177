//! Next-day pollutant forecasts from pre-trained regression models.

pub mod error;
pub mod features;

use crate::types::pollutant::Pollutant;
use crate::weather::WeatherSource;
use crate::LatLon;
use error::ForecastError;
use features::{feature_vector, weather_layout};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// An opaque, already-trained model.
pub trait RegressionModel: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<f64, ForecastError>;
}

/// Predicts tomorrow's value of a pollutant from today's value and the weather
/// today and tomorrow.
#[derive(Clone)]
pub struct Forecaster {
    weather: Arc<dyn WeatherSource>,
    models: HashMap<Pollutant, Arc<dyn RegressionModel>>,
}

impl Forecaster {
    pub fn new(weather: Arc<dyn WeatherSource>) -> Self {
        Self {
            weather,
            models: HashMap::new(),
        }
    }

    /// Registers the model used for `pollutant`.
    pub fn with_model(
        mut self,
        pollutant: Pollutant,
        model: Arc<dyn RegressionModel>,
    ) -> Result<Self, ForecastError> {
        weather_layout(pollutant)?;
        self.models.insert(pollutant, model);
        Ok(self)
    }

    pub fn supports(&self, pollutant: Pollutant) -> bool {
        self.models.contains_key(&pollutant)
    }

    /// Tomorrow's value of `pollutant` at `point`, rounded to the nearest integer.
    pub async fn forecast(
        &self,
        point: LatLon,
        pollutant: Pollutant,
        current_value: f64,
    ) -> Result<f64, ForecastError> {
        weather_layout(pollutant)?;
        let model = self
            .models
            .get(&pollutant)
            .ok_or(ForecastError::ModelNotRegistered(pollutant))?;

        let (today, tomorrow) =
            tokio::try_join!(self.weather.current(point), self.weather.next_day(point))?;
        let features = feature_vector(pollutant, current_value, &today, &tomorrow)?;
        debug!("Forecasting {} at {:?} from {:?}", pollutant, point, features);

        let prediction = model.predict(&features)?;
        Ok(prediction.round())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mild_weather, FakeWeather};
    use crate::types::weather::WeatherSnapshot;
    use std::sync::Mutex;

    /// `bias + sum(coefficients * features)`, remembering the last input.
    struct LinearModel {
        bias: f64,
        coefficients: Vec<f64>,
        seen: Mutex<Vec<f64>>,
    }

    impl RegressionModel for LinearModel {
        fn predict(&self, features: &[f64]) -> Result<f64, ForecastError> {
            if features.len() != self.coefficients.len() {
                return Err(ForecastError::Model(format!(
                    "expected {} features, got {}",
                    self.coefficients.len(),
                    features.len()
                )));
            }
            *self.seen.lock().unwrap() = features.to_vec();
            Ok(self.bias + features.iter().zip(&self.coefficients).map(|(f, c)| f * c).sum::<f64>())
        }
    }

    fn persistence_model() -> Arc<LinearModel> {
        let mut coefficients = vec![0.0; 9];
        coefficients[0] = 0.9;
        Arc::new(LinearModel {
            bias: 3.3,
            coefficients,
            seen: Mutex::new(vec![]),
        })
    }

    #[tokio::test]
    async fn forecast_rounds_the_prediction() -> Result<(), ForecastError> {
        let tomorrow = WeatherSnapshot {
            temperature: Some(27.0),
            ..mild_weather()
        };
        let weather = Arc::new(FakeWeather::uniform(mild_weather()).with_next_day(tomorrow));
        let model = persistence_model();
        let forecaster = Forecaster::new(weather.clone()).with_model(Pollutant::Pm25, model.clone())?;

        let value = forecaster.forecast(LatLon(22.3, 73.2), Pollutant::Pm25, 44.0).await?;
        // 0.9 * 44 + 3.3 = 42.9
        assert_eq!(value, 43.0);
        assert_eq!(weather.request_count(), 2);

        let seen = model.seen.lock().unwrap().clone();
        assert_eq!(seen[0], 44.0);
        assert_eq!(seen[1], 30.0);
        assert_eq!(seen[5], 27.0);
        Ok(())
    }

    #[tokio::test]
    async fn unregistered_and_unsupported_pollutants() {
        let forecaster = Forecaster::new(Arc::new(FakeWeather::uniform(mild_weather())));
        assert!(matches!(
            forecaster.forecast(LatLon(22.3, 73.2), Pollutant::No2, 20.0).await,
            Err(ForecastError::ModelNotRegistered(Pollutant::No2))
        ));
        assert!(matches!(
            forecaster.clone().with_model(Pollutant::Nh3, persistence_model()),
            Err(ForecastError::UnsupportedPollutant(Pollutant::Nh3))
        ));
    }

    #[tokio::test]
    async fn missing_weather_is_reported() -> Result<(), ForecastError> {
        let weather = Arc::new(
            FakeWeather::uniform(mild_weather()).with_next_day(WeatherSnapshot::default()),
        );
        let forecaster = Forecaster::new(weather).with_model(Pollutant::So2, persistence_model())?;
        match forecaster.forecast(LatLon(22.3, 73.2), Pollutant::So2, 12.0).await {
            Err(ForecastError::MissingFeature(name)) => assert_eq!(name, "temperature_t+1"),
            other => panic!("expected a missing feature, got {other:?}"),
        }
        Ok(())
    }
}
