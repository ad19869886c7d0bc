use super::{build_response, Service};
use crate::alert::AlertDispatcher;
use crate::error::IngestError;
use crate::models::ReadingStore;
use serde::Deserialize;
use warp::Filter;

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    limit: Option<i64>,
}

impl LimitQuery {
    /// Clamped into `1..=MAX_LIMIT`
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

pub fn routes<S: ReadingStore, D: AlertDispatcher>(
    service: &Service<S, D>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    readings(service.clone())
        .or(predictions(service.clone()))
        .or(status(service.clone()))
}

/// GET /readings?limit=N
///
/// Returns the most recent stored readings, newest first
fn readings<S: ReadingStore, D: AlertDispatcher>(
    service: Service<S, D>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::path!("readings"))
        .and(warp::get())
        .and(warp::query::<LimitQuery>())
        .and_then(|service: Service<S, D>, query: LimitQuery| async move {
            let resp = service.store().latest_readings(query.limit()).await;
            build_response(resp.map_err(IngestError::from))
        })
        .boxed()
}

/// GET /predictions?limit=N
///
/// Returns the most recent stored predictions, newest first
fn predictions<S: ReadingStore, D: AlertDispatcher>(
    service: Service<S, D>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::path!("predictions"))
        .and(warp::get())
        .and(warp::query::<LimitQuery>())
        .and_then(|service: Service<S, D>, query: LimitQuery| async move {
            let resp = service.store().latest_predictions(query.limit()).await;
            build_response(resp.map_err(IngestError::from))
        })
        .boxed()
}

/// GET /status
///
/// Checks the latest reading against the sensor bands and the latest
/// prediction against the nutrient bands
///
/// Returns a `StatusDto`, no alert gets sent
fn status<S: ReadingStore, D: AlertDispatcher>(
    service: Service<S, D>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::path!("status"))
        .and(warp::get())
        .and_then(|service: Service<S, D>| async move {
            let resp = service.status().await.map(dto::StatusDto::from);
            build_response(resp)
        })
        .boxed()
}

pub mod dto {
    use crate::ingest::StatusReport;
    use crate::models::StoredPrediction;
    use hydrowatch_core::{SensorReading, Violation};
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    pub struct StatusDto {
        pub reading: Option<SensorReading>,
        pub sensor_violations: Vec<Violation>,
        pub prediction: Option<StoredPrediction>,
        pub nutrient_violations: Vec<Violation>,
        pub alerts: Vec<String>,
    }

    impl From<StatusReport> for StatusDto {
        fn from(report: StatusReport) -> Self {
            let alerts = report
                .sensor_violations
                .iter()
                .chain(report.nutrient_violations.iter())
                .map(|v| v.to_string())
                .collect();
            StatusDto {
                reading: report.reading,
                sensor_violations: report.sensor_violations,
                prediction: report.prediction,
                nutrient_violations: report.nutrient_violations,
                alerts,
            }
        }
    }
}
