use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Request must be in JSON format")]
    NotJson,
    #[error("Request body must be a JSON object")]
    NotAnObject,
    #[error("{}", describe_fields(.missing, .invalid))]
    Fields {
        missing: Vec<&'static str>,
        invalid: Vec<&'static str>,
    },
}

impl ValidationError {
    /// Names of every field that was missing or not numeric
    pub fn fields(&self) -> Vec<&'static str> {
        match self {
            ValidationError::Fields { missing, invalid } => {
                missing.iter().chain(invalid.iter()).copied().collect()
            }
            _ => Vec::new(),
        }
    }
}

fn describe_fields(missing: &[&'static str], invalid: &[&'static str]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("Missing required features: {}", missing.join(", ")));
    }
    if !invalid.is_empty() {
        parts.push(format!("Non-numeric features: {}", invalid.join(", ")));
    }
    parts.join("; ")
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("Normalized feature {0} is not finite")]
    MalformedFeature(&'static str),
    #[error("Predictor returned a non-finite value for {0}")]
    MalformedOutput(&'static str),
    #[error("Predictor unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid artifact: {0}")]
    Invalid(String),
}
