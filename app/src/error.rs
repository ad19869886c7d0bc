use hydrowatch_core::error::{ArtifactError, PredictionError, ValidationError};
use thiserror::Error;
use warp::http::StatusCode;

#[derive(Debug, Error)]
pub enum DBError {
    #[error(transparent)]
    SQLError(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Database did not answer within {0} ms")]
    Timeout(u64),
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Publish failed: {0}")]
    Publish(#[from] rumqttc::ClientError),
    #[error("Invalid alert payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("Alert sink did not answer within {0} ms")]
    Timeout(u64),
}

/// Terminal error of a single pipeline stage
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Persisting failed: {0}")]
    Persistence(#[from] DBError),
    #[error("Prediction failed: {0}")]
    Prediction(#[from] PredictionError),
}

impl IngestError {
    /// Message safe to hand to a client, driver details stay in the log
    pub fn public_message(&self) -> String {
        match self {
            IngestError::Persistence(_) => "Persisting failed".to_owned(),
            e => e.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            IngestError::Validation(_) => StatusCode::BAD_REQUEST,
            IngestError::Persistence(_) | IngestError::Prediction(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Cannot read {0}: {1}")]
    Io(String, #[source] std::io::Error),
    #[error("Invalid artifact {0}: {1}")]
    Artifact(String, #[source] ArtifactError),
    #[error("Invalid YAML in {0}: {1}")]
    Yaml(String, #[source] yaml_rust::ScanError),
    #[error("Database unavailable: {0}")]
    Database(#[from] DBError),
    #[error("Invalid MQTT_BROKER {0}, expected host[:port]")]
    Broker(String),
    #[error("Invalid bind address {0}")]
    Address(String),
    #[error("Cannot bind webserver: {0}")]
    Bind(#[from] warp::Error),
    #[error("Cannot register signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}
