use super::dto::ErrorResponseDto;
use super::history_routes::dto::StatusDto;
use super::metric_routes::dto::HealthyDto;
use super::reading_routes::dto::IngestResponseDto;
use crate::models::{StoredPrediction, StoredReading};
use hydrowatch_core::{Direction, NutrientPrediction, SensorReading, Violation};
use std::sync::Arc;
use utoipa::openapi::content::{Content, ContentBuilder};
use utoipa::openapi::info::InfoBuilder;
use utoipa::openapi::path::{OperationBuilder, PathItem, PathItemType, PathsBuilder};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::response::{Response, ResponseBuilder};
use utoipa::openapi::schema::{Array, ComponentsBuilder, ObjectBuilder, Ref, Schema, SchemaType};
use utoipa::openapi::{OpenApi, OpenApiBuilder, RefOr, Required};
use warp::Filter;

enum Body {
    Schema(&'static str),
    ListOf(&'static str),
    Text,
}

struct Endpoint {
    path: &'static str,
    method: PathItemType,
    summary: &'static str,
    request: Option<&'static str>,
    response: Body,
}

const ENDPOINTS: &[Endpoint] = &[
    Endpoint {
        path: "/",
        method: PathItemType::Get,
        summary: "Liveness string",
        request: None,
        response: Body::Text,
    },
    Endpoint {
        path: "/sensor-data",
        method: PathItemType::Post,
        summary: "Ingest one sensor reading",
        request: Some("SensorReading"),
        response: Body::Schema("IngestResponseDto"),
    },
    Endpoint {
        path: "/latest-data",
        method: PathItemType::Get,
        summary: "Most recently accepted reading, empty object before the first one",
        request: None,
        response: Body::Schema("SensorReading"),
    },
    Endpoint {
        path: "/predict",
        method: PathItemType::Post,
        summary: "Predict nutrient levels without storing the reading",
        request: Some("SensorReading"),
        response: Body::Schema("NutrientPrediction"),
    },
    Endpoint {
        path: "/readings",
        method: PathItemType::Get,
        summary: "Stored readings, newest first",
        request: None,
        response: Body::ListOf("StoredReading"),
    },
    Endpoint {
        path: "/predictions",
        method: PathItemType::Get,
        summary: "Stored predictions, newest first",
        request: None,
        response: Body::ListOf("StoredPrediction"),
    },
    Endpoint {
        path: "/status",
        method: PathItemType::Get,
        summary: "Current sensor and nutrient violations",
        request: None,
        response: Body::Schema("StatusDto"),
    },
    Endpoint {
        path: "/health",
        method: PathItemType::Get,
        summary: "Service and database state",
        request: None,
        response: Body::Schema("HealthyDto"),
    },
];

pub fn routes() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let api = Arc::new(api_doc());

    warp::path!("api" / "doc" / "api.json")
        .and(warp::get())
        .map(move || warp::reply::json(api.as_ref()))
        .boxed()
}

pub fn api_doc() -> OpenApi {
    let mut paths = PathsBuilder::new();
    for endpoint in ENDPOINTS {
        let mut operation = OperationBuilder::new()
            .summary(Some(endpoint.summary))
            .response("200", ok_response(&endpoint.response));

        if let Some(request) = endpoint.request {
            let body = RequestBodyBuilder::new()
                .content("application/json", json_content(schema_ref(request)))
                .required(Some(Required::True))
                .build();
            operation = operation.request_body(Some(body)).response(
                "400",
                error_response("Malformed or incomplete reading"),
            );
        }
        if !matches!(endpoint.response, Body::Text) {
            operation = operation.response("500", error_response("Internal error"));
        }

        let item = PathItem::new(endpoint.method.clone(), operation.build());
        paths = paths.path(endpoint.path, item);
    }

    let components = ComponentsBuilder::new()
        .schema_from::<SensorReading>()
        .schema_from::<NutrientPrediction>()
        .schema_from::<Violation>()
        .schema_from::<Direction>()
        .schema_from::<StoredReading>()
        .schema_from::<StoredPrediction>()
        .schema_from::<IngestResponseDto>()
        .schema_from::<StatusDto>()
        .schema_from::<HealthyDto>()
        .schema_from::<ErrorResponseDto>();

    OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title("hydrowatch")
                .version(env!("CARGO_PKG_VERSION"))
                .build(),
        )
        .paths(paths.build())
        .components(Some(components.build()))
        .build()
}

fn json_content(schema: RefOr<Schema>) -> Content {
    ContentBuilder::new().schema(schema).build()
}

fn schema_ref(name: &str) -> RefOr<Schema> {
    RefOr::Ref(Ref::from_schema_name(name))
}

fn ok_response(body: &Body) -> RefOr<Response> {
    let builder = ResponseBuilder::new().description("Success");
    let builder = match body {
        Body::Schema(name) => builder.content("application/json", json_content(schema_ref(name))),
        Body::ListOf(name) => builder.content(
            "application/json",
            json_content(RefOr::T(Schema::Array(Array::new(schema_ref(name))))),
        ),
        Body::Text => builder.content(
            "text/plain",
            json_content(RefOr::T(Schema::Object(
                ObjectBuilder::new().schema_type(SchemaType::String).build(),
            ))),
        ),
    };
    RefOr::T(builder.build())
}

fn error_response(description: &str) -> RefOr<Response> {
    RefOr::T(
        ResponseBuilder::new()
            .description(description)
            .content("application/json", json_content(schema_ref("ErrorResponseDto")))
            .build(),
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::Value;

    #[tokio::test]
    async fn test_rest_api_doc() {
        // Prepare
        let routes = routes();

        // Execute
        let res = warp::test::request()
            .path("/api/doc/api.json")
            .reply(&routes)
            .await;

        // Validate
        assert_eq!(200, res.status());
        let doc: Value = serde_json::from_slice(res.body()).unwrap();
        for endpoint in ENDPOINTS {
            assert!(doc["paths"][endpoint.path].is_object(), "{}", endpoint.path);
        }
        assert!(doc["components"]["schemas"]["SensorReading"].is_object());
        assert!(doc["paths"]["/sensor-data"]["post"]["responses"]["400"].is_object());
    }
}
