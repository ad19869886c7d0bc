use crate::alert::AlertDispatcher;
use crate::error::IngestError;
use crate::ingest::IngestionService;
use crate::models::ReadingStore;
use hydrowatch_core::error::ValidationError;
use serde::Serialize;
use serde_json::Value;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

mod doc_routes;
mod history_routes;
mod metric_routes;
mod reading_routes;

/// Request bodies above this size are rejected with 413
pub const BODY_LIMIT: u64 = 4 * 1024;

type Service<S, D> = Arc<IngestionService<S, D>>;

pub fn routes<S: ReadingStore, D: AlertDispatcher>(
    service: &Service<S, D>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    reading_routes::routes(service)
        .or(history_routes::routes(service))
        .or(metric_routes::routes(service))
        .or(doc_routes::routes())
}

/// Serves all routes until `shutdown` resolves.
/// In-flight requests get completed before this returns.
pub async fn dispatch_server_daemon<S: ReadingStore, D: AlertDispatcher>(
    service: Service<S, D>,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), warp::Error> {
    let api = routes(&service)
        .recover(handle_rejection)
        .with(warp::trace::request());

    let (addr, server) = warp::serve(api).try_bind_with_graceful_shutdown(addr, shutdown)?;
    info!("Starting webserver at: {}", addr);
    server.await;
    info!("Webserver stopped");
    Ok(())
}

fn build_response<T: Serialize>(
    resp: Result<T, IngestError>,
) -> Result<warp::reply::Response, Rejection> {
    match resp {
        Ok(data) => Ok(warp::reply::json(&data).into_response()),
        Err(err) => {
            let status = err.status_code();
            if status.is_client_error() {
                warn!("{}", err);
            } else {
                error!("{}", err);
            }
            Ok(error_reply(err.public_message(), status))
        }
    }
}

fn error_reply(message: String, status: StatusCode) -> warp::reply::Response {
    let body = dto::ErrorResponseDto { error: message };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

#[derive(Debug)]
struct BodyTooLarge;

impl warp::reject::Reject for BodyTooLarge {}

/// Buffers the request body up to `BODY_LIMIT` bytes.
///
/// A declared oversized `Content-Length` fails before reading, bodies
/// without one (chunked) are checked after buffering.
fn limited_body() -> impl Filter<Extract = (Bytes,), Error = Rejection> + Clone {
    warp::header::optional::<u64>("content-length")
        .and_then(|length: Option<u64>| async move {
            match length {
                Some(length) if length > BODY_LIMIT => Err(warp::reject::custom(BodyTooLarge)),
                _ => Ok::<_, Rejection>(()),
            }
        })
        .untuple_one()
        .and(warp::body::bytes())
        .and_then(|body: Bytes| async move {
            if body.len() as u64 > BODY_LIMIT {
                return Err(warp::reject::custom(BodyTooLarge));
            }
            Ok::<_, Rejection>(body)
        })
}

fn parse_body(body: &Bytes) -> Result<Value, IngestError> {
    serde_json::from_slice(body).map_err(|_| ValidationError::NotJson.into())
}

/// Maps warp's own rejections onto the `{"error": ...}` body
pub(crate) async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_owned())
    } else if err.find::<BodyTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("Request body exceeds {} bytes", BODY_LIMIT),
        )
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_owned())
    } else {
        error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_owned(),
        )
    };
    Ok(error_reply(message, status))
}

pub mod dto {
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    pub struct ErrorResponseDto {
        pub error: String,
    }
}
