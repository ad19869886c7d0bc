//! Startup loading of the fitted scaler, the regression model and the
//! threshold tables. Any failure here aborts the process.

use crate::error::StartupError;
use hydrowatch_core::{
    Band, FeatureNormalizer, LinearPredictor, NormalizerConfig, PredictorConfig, ThresholdTable,
};
use tracing::info;
use yaml_rust::{Yaml, YamlLoader};

pub struct Thresholds {
    pub sensor: ThresholdTable,
    pub nutrient: ThresholdTable,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            sensor: ThresholdTable::default_sensor(),
            nutrient: ThresholdTable::default_nutrient(),
        }
    }
}

pub fn load_normalizer(path: &str) -> Result<FeatureNormalizer, StartupError> {
    let json = read(path)?;
    let normalizer = NormalizerConfig::from_json(&json)
        .and_then(FeatureNormalizer::new)
        .map_err(|e| StartupError::Artifact(path.to_owned(), e))?;
    info!("Loaded scaler from {}", path);
    Ok(normalizer)
}

pub fn load_predictor(path: &str) -> Result<LinearPredictor, StartupError> {
    let json = read(path)?;
    let predictor = PredictorConfig::from_json(&json)
        .and_then(LinearPredictor::new)
        .map_err(|e| StartupError::Artifact(path.to_owned(), e))?;
    info!("Loaded model from {}", path);
    Ok(predictor)
}

pub fn load_thresholds(path: Option<&str>) -> Result<Thresholds, StartupError> {
    let path = match path {
        Some(path) => path,
        None => {
            info!("No threshold file configured, using defaults");
            return Ok(Thresholds::default());
        }
    };

    let yaml = read(path)?;
    let thresholds = parse_thresholds(&yaml).map_err(|e| match e {
        ParseError::Scan(e) => StartupError::Yaml(path.to_owned(), e),
        ParseError::Artifact(e) => StartupError::Artifact(path.to_owned(), e),
    })?;
    info!(
        sensor = thresholds.sensor.len(),
        nutrient = thresholds.nutrient.len(),
        "Loaded thresholds from {}",
        path
    );
    Ok(thresholds)
}

enum ParseError {
    Scan(yaml_rust::ScanError),
    Artifact(hydrowatch_core::error::ArtifactError),
}

/// Expects two mappings `sensor` and `nutrient`, each `name: [low, high]`.
/// A missing section falls back to its default table.
fn parse_thresholds(yaml: &str) -> Result<Thresholds, ParseError> {
    let docs = YamlLoader::load_from_str(yaml).map_err(ParseError::Scan)?;
    let defaults = Thresholds::default();
    let doc = match docs.first() {
        Some(doc) => doc,
        None => return Ok(defaults),
    };

    let sensor = match &doc["sensor"] {
        Yaml::BadValue => defaults.sensor,
        section => parse_table("sensor", section).map_err(ParseError::Artifact)?,
    };
    let nutrient = match &doc["nutrient"] {
        Yaml::BadValue => defaults.nutrient,
        section => parse_table("nutrient", section).map_err(ParseError::Artifact)?,
    };
    Ok(Thresholds { sensor, nutrient })
}

fn parse_table(
    section: &str,
    yaml: &Yaml,
) -> Result<ThresholdTable, hydrowatch_core::error::ArtifactError> {
    use hydrowatch_core::error::ArtifactError;

    let hash = yaml
        .as_hash()
        .ok_or_else(|| ArtifactError::Invalid(format!("{} must be a mapping", section)))?;

    let mut table = ThresholdTable::new();
    for (key, value) in hash {
        let name = key
            .as_str()
            .ok_or_else(|| ArtifactError::Invalid(format!("{}: non-string key", section)))?;
        let bounds: Option<Vec<f64>> = value
            .as_vec()
            .and_then(|v| v.iter().map(as_number).collect());
        let (low, high) = match bounds.as_deref() {
            Some(&[low, high]) => (low, high),
            _ => {
                return Err(ArtifactError::Invalid(format!(
                    "{}.{} must be [low, high]",
                    section, name
                )))
            }
        };
        table.insert(name.to_owned(), Band::new(low, high)?);
    }
    Ok(table)
}

fn as_number(yaml: &Yaml) -> Option<f64> {
    match yaml {
        Yaml::Integer(i) => Some(*i as f64),
        Yaml::Real(_) => yaml.as_f64(),
        _ => None,
    }
}

fn read(path: &str) -> Result<String, StartupError> {
    std::fs::read_to_string(path).map_err(|e| StartupError::Io(path.to_owned(), e))
}
