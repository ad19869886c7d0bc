use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// The six raw measurements of the sensor array, in the order the
/// predictor was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorField {
    Ph,
    Tds,
    Turbidity,
    Temperature,
    Humidity,
    LightIntensity,
}

impl SensorField {
    pub const ALL: [SensorField; 6] = [
        SensorField::Ph,
        SensorField::Tds,
        SensorField::Turbidity,
        SensorField::Temperature,
        SensorField::Humidity,
        SensorField::LightIntensity,
    ];

    /// Key used on the wire and in threshold tables
    pub fn name(&self) -> &'static str {
        match self {
            SensorField::Ph => "pH",
            SensorField::Tds => "TDS",
            SensorField::Turbidity => "Turbidity",
            SensorField::Temperature => "Temperature",
            SensorField::Humidity => "Humidity",
            SensorField::LightIntensity => "Light_Intensity",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            SensorField::LightIntensity => &["LightIntensity"],
            _ => &[],
        }
    }
}

/// One ingestion event of the sensor array.
///
/// Every field is mandatory, a partial reading never gets defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SensorReading {
    #[serde(rename = "pH")]
    pub ph: f64,
    #[serde(rename = "TDS")]
    pub tds: f64,
    #[serde(rename = "Turbidity")]
    pub turbidity: f64,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Humidity")]
    pub humidity: f64,
    #[serde(rename = "Light_Intensity", alias = "LightIntensity")]
    pub light_intensity: f64,
}

impl SensorReading {
    /// Validates an untyped JSON payload.
    ///
    /// Extra keys are ignored. Numbers and numeric strings are accepted,
    /// anything else (null, bool, nested values, NaN, infinity) is invalid.
    /// All offending fields are collected, so the caller gets one error
    /// naming every problem at once.
    pub fn from_payload(payload: &Value) -> Result<Self, ValidationError> {
        let object = payload.as_object().ok_or(ValidationError::NotAnObject)?;

        let mut values = [0.0_f64; 6];
        let mut missing = Vec::new();
        let mut invalid = Vec::new();
        for (i, field) in SensorField::ALL.iter().enumerate() {
            let raw = std::iter::once(field.name())
                .chain(field.aliases().iter().copied())
                .find_map(|key| object.get(key));

            match raw {
                None => missing.push(field.name()),
                Some(value) => match coerce(value) {
                    Some(number) => values[i] = number,
                    None => invalid.push(field.name()),
                },
            }
        }

        if !missing.is_empty() || !invalid.is_empty() {
            return Err(ValidationError::Fields { missing, invalid });
        }
        Ok(Self::from_values(values))
    }

    pub fn from_values(values: [f64; 6]) -> Self {
        SensorReading {
            ph: values[0],
            tds: values[1],
            turbidity: values[2],
            temperature: values[3],
            humidity: values[4],
            light_intensity: values[5],
        }
    }

    pub fn get(&self, field: SensorField) -> f64 {
        match field {
            SensorField::Ph => self.ph,
            SensorField::Tds => self.tds,
            SensorField::Turbidity => self.turbidity,
            SensorField::Temperature => self.temperature,
            SensorField::Humidity => self.humidity,
            SensorField::LightIntensity => self.light_intensity,
        }
    }

    /// Values in training order
    pub fn values(&self) -> [f64; 6] {
        SensorField::ALL.map(|field| self.get(field))
    }

    /// Named values in training order, as consumed by the threshold evaluator
    pub fn metrics(&self) -> Vec<(&'static str, f64)> {
        SensorField::ALL
            .iter()
            .map(|field| (field.name(), self.get(*field)))
            .collect()
    }
}

fn coerce(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_payload() {
        let payload = json!({
            "pH": 6.0,
            "TDS": 900,
            "Turbidity": 2,
            "Temperature": 25,
            "Humidity": 60,
            "Light_Intensity": 400,
            "device": "esp32"
        });

        let reading = SensorReading::from_payload(&payload).unwrap();

        assert_eq!(6.0, reading.ph);
        assert_eq!(900.0, reading.tds);
        assert_eq!(2.0, reading.turbidity);
        assert_eq!(25.0, reading.temperature);
        assert_eq!(60.0, reading.humidity);
        assert_eq!(400.0, reading.light_intensity);
    }

    #[test]
    fn test_numeric_strings_and_alias() {
        let payload = json!({
            "pH": "6.25",
            "TDS": " 1200.5 ",
            "Turbidity": 0.1234567890123,
            "Temperature": -3,
            "Humidity": "0",
            "LightIntensity": 1e4
        });

        let reading = SensorReading::from_payload(&payload).unwrap();

        assert_eq!(6.25, reading.ph);
        assert_eq!(1200.5, reading.tds);
        assert_eq!(0.1234567890123, reading.turbidity);
        assert_eq!(10_000.0, reading.light_intensity);
    }

    #[test]
    fn test_missing_field_is_named() {
        let payload = json!({
            "pH": 6.0,
            "TDS": 900,
            "Turbidity": 2,
            "Humidity": 60,
            "Light_Intensity": 400
        });

        let err = SensorReading::from_payload(&payload).unwrap_err();

        assert_eq!(vec!["Temperature"], err.fields());
        assert!(err.to_string().contains("Temperature"));
    }

    #[test]
    fn test_invalid_fields_are_collected() {
        let payload = json!({
            "pH": "acidic",
            "TDS": null,
            "Turbidity": true,
            "Temperature": 25,
            "Light_Intensity": [400]
        });

        let err = SensorReading::from_payload(&payload).unwrap_err();

        match &err {
            ValidationError::Fields { missing, invalid } => {
                assert_eq!(&vec!["Humidity"], missing);
                assert_eq!(&vec!["pH", "TDS", "Turbidity", "Light_Intensity"], invalid);
            }
            _ => panic!("unexpected error {:?}", err),
        }
    }

    #[test]
    fn test_non_finite_strings_rejected() {
        let payload = json!({
            "pH": "NaN",
            "TDS": "inf",
            "Turbidity": 2,
            "Temperature": 25,
            "Humidity": 60,
            "Light_Intensity": 400
        });

        let err = SensorReading::from_payload(&payload).unwrap_err();

        assert_eq!(vec!["pH", "TDS"], err.fields());
    }

    #[test]
    fn test_not_an_object() {
        let err = SensorReading::from_payload(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(ValidationError::NotAnObject, err);
    }

    #[test]
    fn test_serialized_keys_match_wire_format() {
        let reading = SensorReading::from_values([6.0, 900.0, 2.0, 25.0, 60.0, 400.0]);

        let json = serde_json::to_value(reading).unwrap();

        assert_eq!(
            json!({
                "pH": 6.0,
                "TDS": 900.0,
                "Turbidity": 2.0,
                "Temperature": 25.0,
                "Humidity": 60.0,
                "Light_Intensity": 400.0
            }),
            json
        );
    }
}
