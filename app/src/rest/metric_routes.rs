use super::{build_response, Service};
use crate::alert::AlertDispatcher;
use crate::models::ReadingStore;
use warp::Filter;

pub fn routes<S: ReadingStore, D: AlertDispatcher>(
    service: &Service<S, D>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    health(service.clone())
}

/// GET /health
///
/// Returns a `HealthyDto`, `healthy` is false while the database is unreachable
fn health<S: ReadingStore, D: AlertDispatcher>(
    service: Service<S, D>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || service.clone())
        .and(warp::path!("health"))
        .and(warp::get())
        .and_then(|service: Service<S, D>| async move {
            let store = service.store();
            let database_state = match store.check().await {
                Ok(()) => "ok".to_owned(),
                Err(e) => e.to_string(),
            };
            let ret = dto::HealthyDto {
                healthy: database_state == "ok",
                version: env!("CARGO_PKG_VERSION").to_owned(),
                core_version: hydrowatch_core::CORE_VERSION.to_owned(),
                database_state,
                alert_sink: service.dispatcher().kind().to_owned(),
                alert_sink_ready: service.dispatcher().is_ready(),
                reading_count: store.reading_count().await.ok(),
                prediction_count: store.prediction_count().await.ok(),
                has_latest: service.latest().is_some(),
            };
            build_response(Ok(ret))
        })
        .boxed()
}

pub mod dto {
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    pub struct HealthyDto {
        pub healthy: bool,
        pub version: String,
        pub core_version: String,
        pub database_state: String,
        pub alert_sink: String,
        pub alert_sink_ready: bool,
        pub reading_count: Option<i64>,
        pub prediction_count: Option<i64>,
        pub has_latest: bool,
    }
}
