use crate::error::ArtifactError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// Accepted operating band, both bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub fn new(low: f64, high: f64) -> Result<Self, ArtifactError> {
        if low.is_nan() || high.is_nan() || low > high {
            return Err(ArtifactError::Invalid(format!(
                "invalid band [{}, {}]",
                low, high
            )));
        }
        Ok(Band { low, high })
    }

    fn direction(&self, value: f64) -> Option<Direction> {
        if value < self.low {
            Some(Direction::Low)
        } else if value > self.high {
            Some(Direction::High)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Violation {
    pub name: String,
    pub value: f64,
    pub low: f64,
    pub high: f64,
    pub direction: Direction,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let word = match self.direction {
            Direction::Low => "too LOW",
            Direction::High => "too HIGH",
        };
        write!(
            f,
            "{} is {}: {:.2} (expected {} - {})",
            self.name, word, self.value, self.low, self.high
        )
    }
}

/// Immutable name -> band mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdTable {
    bands: HashMap<String, Band>,
}

impl ThresholdTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, low: f64, high: f64) -> Result<Self, ArtifactError> {
        self.bands.insert(name.to_owned(), Band::new(low, high)?);
        Ok(self)
    }

    pub fn insert(&mut self, name: String, band: Band) {
        self.bands.insert(name, band);
    }

    pub fn get(&self, name: &str) -> Option<&Band> {
        self.bands.get(name)
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Operating bands of the raw sensor array
    pub fn default_sensor() -> Self {
        Self::from_static(&[
            ("Temperature", 20.0, 30.0),
            ("pH", 5.5, 6.5),
            ("TDS", 500.0, 1800.0),
            ("Humidity", 50.0, 75.0),
        ])
    }

    /// Operating bands of the predicted nutrients, in ppm
    pub fn default_nutrient() -> Self {
        Self::from_static(&[
            ("Nitrogen", 200.0, 1500.0),
            ("Phosphorus", 10.0, 100.0),
            ("Potassium", 40.0, 200.0),
            ("Calcium", 20.0, 150.0),
            ("Magnesium", 10.0, 80.0),
            ("Sulfur", 5.0, 50.0),
        ])
    }

    fn from_static(bands: &[(&str, f64, f64)]) -> Self {
        let bands = bands
            .iter()
            .map(|(name, low, high)| {
                (
                    (*name).to_owned(),
                    Band {
                        low: *low,
                        high: *high,
                    },
                )
            })
            .collect();
        ThresholdTable { bands }
    }
}

/// Compares `values` against `table`.
///
/// Names without a band are skipped. The result keeps the order of `values`.
pub fn evaluate<S: AsRef<str>>(values: &[(S, f64)], table: &ThresholdTable) -> Vec<Violation> {
    values
        .iter()
        .filter_map(|(name, value)| {
            let name = name.as_ref();
            let band = table.get(name)?;
            band.direction(*value).map(|direction| Violation {
                name: name.to_owned(),
                value: *value,
                low: band.low,
                high: band.high,
                direction,
            })
        })
        .collect()
}
