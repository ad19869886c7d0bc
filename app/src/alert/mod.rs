use crate::error::NotificationError;
use chrono::{DateTime, Utc};
use hydrowatch_core::Violation;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

pub mod mqtt;

#[cfg(test)]
pub mod mock;

pub use mqtt::MqttAlertDispatcher;

/// Best-effort notification sink for threshold violations.
///
/// Gets called at most once per ingestion, with the complete non-empty
/// violation list. Implementations bound their own runtime and report a
/// timeout as an error.
pub trait AlertDispatcher: Send + Sync + 'static {
    fn dispatch(
        &self,
        violations: &[Violation],
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;

    fn kind(&self) -> &'static str;

    /// False while the sink cannot deliver, alerts may still get queued
    fn is_ready(&self) -> bool {
        true
    }
}

#[derive(Debug, Serialize)]
pub struct AlertMessage<'a> {
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    pub violations: &'a [Violation],
}

impl<'a> AlertMessage<'a> {
    pub fn new(violations: &'a [Violation]) -> Self {
        let summary = violations
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        AlertMessage {
            timestamp: Utc::now(),
            summary,
            violations,
        }
    }
}

/// Writes alerts to the log only, used when no broker is configured
#[derive(Debug, Default)]
pub struct LogDispatcher;

impl AlertDispatcher for LogDispatcher {
    async fn dispatch(&self, violations: &[Violation]) -> Result<(), NotificationError> {
        let message = AlertMessage::new(violations);
        warn!(violations = violations.len(), "Threshold alert:\n{}", message.summary);
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "log"
    }
}

/// Alert sink selected at startup
pub enum AlertSink {
    Mqtt(Arc<MqttAlertDispatcher>),
    Log(LogDispatcher),
}

impl AlertDispatcher for AlertSink {
    async fn dispatch(&self, violations: &[Violation]) -> Result<(), NotificationError> {
        match self {
            AlertSink::Mqtt(dispatcher) => dispatcher.dispatch(violations).await,
            AlertSink::Log(dispatcher) => dispatcher.dispatch(violations).await,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AlertSink::Mqtt(dispatcher) => dispatcher.kind(),
            AlertSink::Log(dispatcher) => dispatcher.kind(),
        }
    }

    fn is_ready(&self) -> bool {
        match self {
            AlertSink::Mqtt(dispatcher) => dispatcher.is_ready(),
            AlertSink::Log(dispatcher) => dispatcher.is_ready(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hydrowatch_core::Direction;

    #[test]
    fn test_alert_message_lists_every_violation() {
        let violations = vec![
            Violation {
                name: "Nitrogen".to_owned(),
                value: 2500.0,
                low: 1000.0,
                high: 2000.0,
                direction: Direction::High,
            },
            Violation {
                name: "Sulfur".to_owned(),
                value: 1.0,
                low: 5.0,
                high: 50.0,
                direction: Direction::Low,
            },
        ];

        let message = AlertMessage::new(&violations);
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(2, message.summary.lines().count());
        assert_eq!("HIGH", json["violations"][0]["direction"]);
        assert_eq!("Sulfur", json["violations"][1]["name"]);
    }

    #[tokio::test]
    async fn test_log_dispatcher_never_fails() {
        let sink = AlertSink::Log(LogDispatcher);

        assert!(sink.dispatch(&[]).await.is_ok());
        assert_eq!("log", sink.kind());
    }
}
