mod alert;
mod artifacts;
mod cache;
mod config;
mod error;
mod ingest;
mod logging;
mod models;
mod rest;

use alert::{AlertSink, LogDispatcher, MqttAlertDispatcher};
use config::CONFIG;
use error::StartupError;
use ingest::IngestionService;
use models::PgStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{error, info};

#[tokio::main]
pub async fn main() {
    logging::init(&CONFIG.log_level(), CONFIG.trace_stdout());
    info!(
        version = env!("CARGO_PKG_VERSION"),
        core = hydrowatch_core::CORE_VERSION,
        "Starting hydrowatch"
    );

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let normalizer = artifacts::load_normalizer(&CONFIG.scaler_path())?;
    let predictor = artifacts::load_predictor(&CONFIG.model_path())?;
    let thresholds = artifacts::load_thresholds(CONFIG.thresholds_path().as_deref())?;

    let addr: SocketAddr = CONFIG
        .bind_addr()
        .parse()
        .map_err(|_| StartupError::Address(CONFIG.bind_addr()))?;
    let broker = CONFIG.mqtt_broker()?;

    let db_conn =
        models::establish_db_connection(&CONFIG.database_url(), CONFIG.db_timeout_ms()).await?;
    models::migrate(&db_conn).await?;
    let store = PgStore::new(db_conn, CONFIG.db_timeout_ms());

    let sink = match broker {
        Some((host, port)) => {
            info!("Sending alerts to mqtt://{}:{}", host, port);
            let dispatcher = MqttAlertDispatcher::new(
                &CONFIG.mqtt_client_id(),
                &host,
                port,
                CONFIG.mqtt_alert_topic(),
                CONFIG.mqtt_timeout_ms(),
            );
            tokio::spawn(MqttAlertDispatcher::dispatch_event_loop(dispatcher.clone()));
            AlertSink::Mqtt(dispatcher)
        }
        None => {
            info!("No MQTT_BROKER configured, alerts are logged only");
            AlertSink::Log(LogDispatcher)
        }
    };

    let service = IngestionService::new(
        store,
        sink,
        normalizer,
        Box::new(predictor),
        thresholds.sensor,
        thresholds.nutrient,
    );

    let shutdown = register_sigint_handler()?;
    rest::dispatch_server_daemon(service, addr, async move { shutdown.notified().await })
        .await?;
    info!("Shut down");
    Ok(())
}

fn register_sigint_handler() -> Result<Arc<Notify>, StartupError> {
    let notify = Arc::new(Notify::new());
    let handler_notify = notify.clone();
    ctrlc::set_handler(move || {
        info!("Received SIGINT, shutting down");
        handler_notify.notify_one();
    })?;
    Ok(notify)
}
