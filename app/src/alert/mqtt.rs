use super::{AlertDispatcher, AlertMessage};
use crate::error::NotificationError;
use hydrowatch_core::Violation;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

const CAPACITY: usize = 64;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Publishes every alert as one JSON message on the alert topic
pub struct MqttAlertDispatcher {
    client: AsyncClient,
    eventloop: Mutex<EventLoop>,
    topic: String,
    timeout_ms: u64,
    is_connected: AtomicBool,
}

impl MqttAlertDispatcher {
    pub fn new(client_id: &str, host: &str, port: u16, topic: String, timeout_ms: u64) -> Arc<Self> {
        let mut options = MqttOptions::new(client_id, host, port);
        options.set_keep_alive(Duration::from_secs(5));
        let (client, eventloop) = AsyncClient::new(options, CAPACITY);

        Arc::new(MqttAlertDispatcher {
            client,
            eventloop: Mutex::new(eventloop),
            topic,
            timeout_ms,
            is_connected: AtomicBool::new(false),
        })
    }

    /// Drives the connection, publishes only leave the process while this runs.
    /// Blocks caller in infinite loop
    pub async fn dispatch_event_loop(self: Arc<MqttAlertDispatcher>) {
        let mut eventloop = match self.eventloop.try_lock() {
            Ok(eventloop) => eventloop,
            Err(_) => {
                error!("dispatch_event_loop() already called!");
                return;
            }
        };

        info!("Start polling MQTT alert broker");
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    self.is_connected.store(true, Ordering::Relaxed);
                    info!("Connected to MQTT alert broker");
                }
                Ok(Event::Incoming(Packet::PubAck(ack))) => {
                    debug!(pkid = ack.pkid, "Alert acknowledged");
                }
                Ok(_) => {}
                Err(e) => {
                    if self.is_connected.swap(false, Ordering::Relaxed) {
                        warn!("Lost MQTT alert broker: {}", e);
                    } else {
                        debug!("MQTT alert broker unreachable: {}", e);
                    }
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }
}

impl AlertDispatcher for MqttAlertDispatcher {
    async fn dispatch(&self, violations: &[Violation]) -> Result<(), NotificationError> {
        let payload = serde_json::to_vec(&AlertMessage::new(violations))?;
        let publish = self
            .client
            .publish(self.topic.as_str(), QoS::AtLeastOnce, false, payload);

        tokio::time::timeout(Duration::from_millis(self.timeout_ms), publish)
            .await
            .map_err(|_| NotificationError::Timeout(self.timeout_ms))??;
        debug!(topic = %self.topic, "Queued alert");
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "mqtt"
    }

    fn is_ready(&self) -> bool {
        self.is_connected.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hydrowatch_core::Direction;

    fn violation() -> Violation {
        Violation {
            name: "Nitrogen".to_owned(),
            value: 2500.0,
            low: 1000.0,
            high: 2000.0,
            direction: Direction::High,
        }
    }

    #[tokio::test]
    async fn test_publish_queues_without_broker() {
        let dispatcher =
            MqttAlertDispatcher::new("hydrowatch-test", "localhost", 1883, "test/alerts".to_owned(), 100);

        let res = dispatcher.dispatch(&[violation()]).await;

        assert!(res.is_ok());
        assert!(!dispatcher.is_ready());
    }

    #[tokio::test]
    async fn test_full_queue_times_out() {
        let dispatcher =
            MqttAlertDispatcher::new("hydrowatch-test", "localhost", 1883, "test/alerts".to_owned(), 20);

        // nobody polls the event loop, so the request channel fills up
        let mut last = Ok(());
        for _ in 0..=CAPACITY {
            last = dispatcher.dispatch(&[violation()]).await;
        }

        assert!(matches!(last, Err(NotificationError::Timeout(20))));
    }

    #[tokio::test]
    async fn test_event_loop_runs_once() {
        let dispatcher =
            MqttAlertDispatcher::new("hydrowatch-test", "localhost", 1883, "test/alerts".to_owned(), 20);
        let _guard = dispatcher.eventloop.lock().await;

        // returns immediately, as the loop is already owned
        dispatcher.clone().dispatch_event_loop().await;
    }
}
