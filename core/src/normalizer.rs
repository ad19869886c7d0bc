use crate::error::{ArtifactError, PredictionError};
use crate::reading::{SensorField, SensorReading};
use serde::{Deserialize, Serialize};

/// Scaled feature vector, ordered like `SensorField::ALL`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; 6]);

impl FeatureVector {
    pub fn values(&self) -> &[f64; 6] {
        &self.0
    }
}

/// Fitted scaling transform as stored in the scaler artifact.
///
/// `features` pins the column order the transform was fitted with and has to
/// match the order the predictor expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    pub features: Vec<String>,
    #[serde(flatten)]
    pub transform: ScalerTransform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerTransform {
    /// `(x - mean) / scale`
    Standard { mean: [f64; 6], scale: [f64; 6] },
    /// `(x - min) / (max - min)`
    MinMax { min: [f64; 6], max: [f64; 6] },
}

impl NormalizerConfig {
    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Read-only feature normalizer, safe for unsynchronized concurrent use
#[derive(Debug, Clone)]
pub struct FeatureNormalizer {
    offset: [f64; 6],
    divisor: [f64; 6],
}

impl FeatureNormalizer {
    pub fn new(config: NormalizerConfig) -> Result<Self, ArtifactError> {
        let expected: Vec<&str> = SensorField::ALL.iter().map(|f| f.name()).collect();
        if config.features != expected {
            return Err(ArtifactError::Invalid(format!(
                "feature order {:?} does not match {:?}",
                config.features, expected
            )));
        }

        let (offset, divisor) = match config.transform {
            ScalerTransform::Standard { mean, scale } => (mean, scale),
            ScalerTransform::MinMax { min, max } => {
                let mut range = [0.0; 6];
                for i in 0..6 {
                    range[i] = max[i] - min[i];
                }
                (min, range)
            }
        };

        for (i, field) in SensorField::ALL.iter().enumerate() {
            if !offset[i].is_finite() || !divisor[i].is_finite() || divisor[i] == 0.0 {
                return Err(ArtifactError::Invalid(format!(
                    "degenerate scaling for {}",
                    field.name()
                )));
            }
        }

        Ok(FeatureNormalizer { offset, divisor })
    }

    pub fn normalize(&self, reading: &SensorReading) -> Result<FeatureVector, PredictionError> {
        let raw = reading.values();
        let mut scaled = [0.0; 6];
        for (i, field) in SensorField::ALL.iter().enumerate() {
            let value = (raw[i] - self.offset[i]) / self.divisor[i];
            if !value.is_finite() {
                return Err(PredictionError::MalformedFeature(field.name()));
            }
            scaled[i] = value;
        }
        Ok(FeatureVector(scaled))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const FEATURES: &str = r#"["pH", "TDS", "Turbidity", "Temperature", "Humidity", "Light_Intensity"]"#;

    fn standard_config() -> NormalizerConfig {
        NormalizerConfig::from_json(&format!(
            r#"{{
                "features": {},
                "kind": "standard",
                "mean": [6.0, 1000.0, 2.0, 24.0, 60.0, 500.0],
                "scale": [0.5, 200.0, 1.0, 2.0, 10.0, 100.0]
            }}"#,
            FEATURES
        ))
        .unwrap()
    }

    #[test]
    fn test_standard_scaling() {
        let normalizer = FeatureNormalizer::new(standard_config()).unwrap();
        let reading = SensorReading::from_values([6.5, 800.0, 2.0, 28.0, 40.0, 500.0]);

        let features = normalizer.normalize(&reading).unwrap();

        assert_eq!(&[1.0, -1.0, 0.0, 2.0, -2.0, 0.0], features.values());
    }

    #[test]
    fn test_min_max_scaling() {
        let config = NormalizerConfig::from_json(&format!(
            r#"{{
                "features": {},
                "kind": "min_max",
                "min": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                "max": [14.0, 2000.0, 10.0, 50.0, 100.0, 1000.0]
            }}"#,
            FEATURES
        ))
        .unwrap();
        let normalizer = FeatureNormalizer::new(config).unwrap();
        let reading = SensorReading::from_values([7.0, 500.0, 10.0, 0.0, 25.0, 1000.0]);

        let features = normalizer.normalize(&reading).unwrap();

        assert_eq!(&[0.5, 0.25, 1.0, 0.0, 0.25, 1.0], features.values());
    }

    #[test]
    fn test_wrong_feature_order_rejected() {
        let mut config = standard_config();
        config.features.swap(0, 1);

        assert!(FeatureNormalizer::new(config).is_err());
    }

    #[test]
    fn test_zero_scale_rejected() {
        let mut config = standard_config();
        if let ScalerTransform::Standard { scale, .. } = &mut config.transform {
            scale[3] = 0.0;
        }

        assert!(FeatureNormalizer::new(config).is_err());
    }

    #[test]
    fn test_wrong_vector_length_rejected() {
        let json = format!(
            r#"{{"features": {}, "kind": "standard", "mean": [1.0], "scale": [1.0]}}"#,
            FEATURES
        );

        assert!(NormalizerConfig::from_json(&json).is_err());
    }

    #[test]
    fn test_overflowing_feature_is_prediction_error() {
        let normalizer = FeatureNormalizer::new(standard_config()).unwrap();
        let reading = SensorReading::from_values([f64::MAX, 800.0, 2.0, 28.0, 40.0, 500.0]);

        let err = normalizer.normalize(&reading).unwrap_err();

        assert_eq!(PredictionError::MalformedFeature("pH"), err);
    }
}
