use super::{build_response, limited_body, parse_body, Service};
use crate::alert::AlertDispatcher;
use crate::models::ReadingStore;
use warp::hyper::body::Bytes;
use warp::Filter;

pub fn routes<S: ReadingStore, D: AlertDispatcher>(
    service: &Service<S, D>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    index()
        .or(sensor_data(service.clone()))
        .or(latest_data(service.clone()))
        .or(predict(service.clone()))
}

/// GET /
///
/// Liveness string
fn index() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path::end()
        .and(warp::get())
        .map(|| "Hydrowatch API is running! POST /sensor-data to ingest readings.")
        .boxed()
}

/// POST /sensor-data
///
/// Ingest one sensor reading
///
/// The reading gets cached, stored and run through the nutrient model.
/// Returns an `IngestResponseDto` which echoes the stored reading together
/// with the prediction and all violated nutrient bands
fn sensor_data<S: ReadingStore, D: AlertDispatcher>(
    service: Service<S, D>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::path!("sensor-data"))
        .and(warp::post())
        .and(limited_body())
        .and_then(|service: Service<S, D>, body: Bytes| async move {
            let resp = match parse_body(&body) {
                Ok(payload) => service
                    .ingest(&payload)
                    .await
                    .map(dto::IngestResponseDto::from),
                Err(e) => Err(e),
            };
            build_response(resp)
        })
        .boxed()
}

/// GET /latest-data
///
/// Returns the most recently accepted reading, or `{}` before the first one
fn latest_data<S: ReadingStore, D: AlertDispatcher>(
    service: Service<S, D>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::path!("latest-data"))
        .and(warp::get())
        .map(|service: Service<S, D>| match service.latest() {
            Some(reading) => warp::reply::json(&reading),
            None => warp::reply::json(&serde_json::json!({})),
        })
        .boxed()
}

/// POST /predict
///
/// Predict nutrient levels for a reading without storing the reading itself
///
/// Returns the six nutrient levels
fn predict<S: ReadingStore, D: AlertDispatcher>(
    service: Service<S, D>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::path!("predict"))
        .and(warp::post())
        .and(limited_body())
        .and_then(|service: Service<S, D>, body: Bytes| async move {
            let resp = match parse_body(&body) {
                Ok(payload) => service.predict(&payload).await,
                Err(e) => Err(e),
            };
            build_response(resp)
        })
        .boxed()
}

///
/// DTO
///
pub mod dto {
    use crate::ingest::IngestOutcome;
    use chrono::{DateTime, Utc};
    use hydrowatch_core::{NutrientPrediction, SensorReading, Violation};
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    pub const RECEIVED_MESSAGE: &str = "Data received successfully!";

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    pub struct IngestResponseDto {
        pub message: String,
        pub id: i64,
        pub timestamp: DateTime<Utc>,
        pub data: SensorReading,
        pub prediction: Option<NutrientPrediction>,
        pub violations: Vec<Violation>,
        pub warnings: Vec<String>,
    }

    impl From<IngestOutcome> for IngestResponseDto {
        fn from(outcome: IngestOutcome) -> Self {
            IngestResponseDto {
                message: RECEIVED_MESSAGE.to_owned(),
                id: outcome.reading.id,
                timestamp: outcome.reading.timestamp,
                data: outcome.reading.reading,
                prediction: outcome.prediction,
                violations: outcome.violations,
                warnings: outcome.warnings,
            }
        }
    }
}
