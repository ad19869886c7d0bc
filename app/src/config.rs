use crate::error::StartupError;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::env;
use std::str::FromStr;

const DEFAULT_MQTT_PORT: u16 = 1883;

pub struct Config {
    inner: RwLock<InnerConfig>,
}

struct InnerConfig {
    database_url: String,
    bind_addr: String,
    server_port: u16,
    scaler_path: String,
    model_path: String,
    thresholds_path: Option<String>,
    db_timeout_ms: u64,
    mqtt_broker: Option<String>,
    mqtt_client_id: String,
    mqtt_alert_topic: String,
    mqtt_timeout_ms: u64,
    log_level: String,
    trace_stdout: bool,
}

impl Config {
    pub fn database_url(&self) -> String {
        let inner = self.inner.read();
        inner.database_url.clone()
    }

    pub fn bind_addr(&self) -> String {
        let inner = self.inner.read();
        format!("{}:{}", inner.bind_addr, inner.server_port)
    }

    pub fn scaler_path(&self) -> String {
        self.inner.read().scaler_path.clone()
    }

    pub fn model_path(&self) -> String {
        self.inner.read().model_path.clone()
    }

    pub fn thresholds_path(&self) -> Option<String> {
        self.inner.read().thresholds_path.clone()
    }

    pub fn db_timeout_ms(&self) -> u64 {
        self.inner.read().db_timeout_ms
    }

    /// Host and port of the alert broker, if one is configured.
    /// A configured but malformed broker is an error, never `None`.
    pub fn mqtt_broker(&self) -> Result<Option<(String, u16)>, StartupError> {
        let inner = self.inner.read();
        inner.mqtt_broker.as_deref().map(parse_broker).transpose()
    }

    pub fn mqtt_client_id(&self) -> String {
        self.inner.read().mqtt_client_id.clone()
    }

    pub fn mqtt_alert_topic(&self) -> String {
        self.inner.read().mqtt_alert_topic.clone()
    }

    pub fn mqtt_timeout_ms(&self) -> u64 {
        self.inner.read().mqtt_timeout_ms
    }

    pub fn log_level(&self) -> String {
        self.inner.read().log_level.clone()
    }

    pub fn trace_stdout(&self) -> bool {
        self.inner.read().trace_stdout
    }
}

fn parse_broker(broker: &str) -> Result<(String, u16), StartupError> {
    let invalid = || StartupError::Broker(broker.to_owned());
    let (host, port) = match broker.rsplit_once(':') {
        Some((host, port)) => (host, port.parse().map_err(|_| invalid())?),
        None => (broker, DEFAULT_MQTT_PORT),
    };
    if host.is_empty() {
        return Err(invalid());
    }
    Ok((host.to_owned(), port))
}

fn var_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv::dotenv().ok();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let mqtt_broker = env::var("MQTT_BROKER")
        .ok()
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty());

    Config {
        inner: RwLock::new(InnerConfig {
            database_url,
            bind_addr: var_or("BIND_ADDR", "0.0.0.0".to_owned()),
            server_port: var_or("SERVER_PORT", 5000),
            scaler_path: var_or("SCALER_PATH", "artifacts/scaler.json".to_owned()),
            model_path: var_or("MODEL_PATH", "artifacts/model.json".to_owned()),
            thresholds_path: env::var("THRESHOLDS_PATH").ok(),
            db_timeout_ms: var_or("DB_TIMEOUT_MS", 3000),
            mqtt_broker,
            mqtt_client_id: var_or("MQTT_CLIENT_ID", "hydrowatch".to_owned()),
            mqtt_alert_topic: var_or("MQTT_ALERT_TOPIC", "hydrowatch/alerts".to_owned()),
            mqtt_timeout_ms: var_or("MQTT_TIMEOUT_MS", 2000),
            log_level: var_or("LOG_LEVEL", "info".to_owned()),
            trace_stdout: var_or("TRACE_STDOUT", false),
        }),
    }
});
