use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nutrient {
    Nitrogen,
    Phosphorus,
    Potassium,
    Calcium,
    Magnesium,
    Sulfur,
}

impl Nutrient {
    pub const ALL: [Nutrient; 6] = [
        Nutrient::Nitrogen,
        Nutrient::Phosphorus,
        Nutrient::Potassium,
        Nutrient::Calcium,
        Nutrient::Magnesium,
        Nutrient::Sulfur,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Nutrient::Nitrogen => "Nitrogen",
            Nutrient::Phosphorus => "Phosphorus",
            Nutrient::Potassium => "Potassium",
            Nutrient::Calcium => "Calcium",
            Nutrient::Magnesium => "Magnesium",
            Nutrient::Sulfur => "Sulfur",
        }
    }
}

/// Six nutrient concentration estimates derived from one reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct NutrientPrediction {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub calcium: f64,
    pub magnesium: f64,
    pub sulfur: f64,
}

impl NutrientPrediction {
    pub fn from_values(values: [f64; 6]) -> Self {
        NutrientPrediction {
            nitrogen: values[0],
            phosphorus: values[1],
            potassium: values[2],
            calcium: values[3],
            magnesium: values[4],
            sulfur: values[5],
        }
    }

    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Nitrogen => self.nitrogen,
            Nutrient::Phosphorus => self.phosphorus,
            Nutrient::Potassium => self.potassium,
            Nutrient::Calcium => self.calcium,
            Nutrient::Magnesium => self.magnesium,
            Nutrient::Sulfur => self.sulfur,
        }
    }

    pub fn values(&self) -> [f64; 6] {
        Nutrient::ALL.map(|n| self.get(n))
    }

    pub fn metrics(&self) -> Vec<(&'static str, f64)> {
        Nutrient::ALL
            .iter()
            .map(|n| (n.name(), self.get(*n)))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_metrics_keep_nutrient_order() {
        let prediction = NutrientPrediction::from_values([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let names: Vec<&str> = prediction.metrics().iter().map(|(n, _)| *n).collect();

        assert_eq!(
            vec!["Nitrogen", "Phosphorus", "Potassium", "Calcium", "Magnesium", "Sulfur"],
            names
        );
        assert_eq!([1.0, 2.0, 3.0, 4.0, 5.0, 6.0], prediction.values());
    }

    #[test]
    fn test_json_keys() {
        let prediction = NutrientPrediction::from_values([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let json = serde_json::to_value(prediction).unwrap();

        assert_eq!(1.0, json["Nitrogen"]);
        assert_eq!(6.0, json["Sulfur"]);
    }
}
