use crate::error::{ArtifactError, PredictionError};
use crate::normalizer::FeatureVector;
use crate::prediction::{Nutrient, NutrientPrediction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maps a normalized feature vector onto six nutrient estimates.
///
/// Implementations are loaded once and must be invocable concurrently
/// without mutation.
pub trait Predictor: std::fmt::Debug + Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<NutrientPrediction, PredictionError>;
}

/// One regression per nutrient, as exported by the training pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    pub models: HashMap<String, LinearModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: [f64; 6],
}

impl LinearModel {
    fn apply(&self, features: &FeatureVector) -> f64 {
        self.coefficients
            .iter()
            .zip(features.values().iter())
            .fold(self.intercept, |acc, (c, x)| acc + c * x)
    }
}

impl PredictorConfig {
    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone)]
pub struct LinearPredictor {
    models: [LinearModel; 6],
}

impl LinearPredictor {
    pub fn new(mut config: PredictorConfig) -> Result<Self, ArtifactError> {
        let mut models = Vec::with_capacity(Nutrient::ALL.len());
        for nutrient in Nutrient::ALL {
            let model = config.models.remove(nutrient.name()).ok_or_else(|| {
                ArtifactError::Invalid(format!("missing model for {}", nutrient.name()))
            })?;
            let is_finite = model.intercept.is_finite()
                && model.coefficients.iter().all(|c| c.is_finite());
            if !is_finite {
                return Err(ArtifactError::Invalid(format!(
                    "non-finite weights for {}",
                    nutrient.name()
                )));
            }
            models.push(model);
        }

        if let Some(unknown) = config.models.keys().next() {
            tracing::warn!("Ignoring model for unknown nutrient {}", unknown);
        }

        let models: [LinearModel; 6] = models
            .try_into()
            .map_err(|_| ArtifactError::Invalid("expected six models".to_owned()))?;
        Ok(LinearPredictor { models })
    }
}

impl Predictor for LinearPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<NutrientPrediction, PredictionError> {
        let mut values = [0.0; 6];
        for (i, nutrient) in Nutrient::ALL.iter().enumerate() {
            let value = self.models[i].apply(features);
            if !value.is_finite() {
                return Err(PredictionError::MalformedOutput(nutrient.name()));
            }
            values[i] = value;
        }
        Ok(NutrientPrediction::from_values(values))
    }
}
