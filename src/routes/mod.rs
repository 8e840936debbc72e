pub mod collector;
pub mod health;
pub mod latest;
pub mod status;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        status::index,
        health::healthz,
        collector::collect,
        latest::get_latest_reading,
        latest::get_latest_uplink,
    ),
    components(
        schemas(
            crate::ttn::UplinkMessage,
            crate::ttn::Metadata,
            collector::IngestResponse,
            latest::ReadingResponse,
            latest::UplinkResponse,
        )
    ),
    tags(
        (name = "status", description = "Human-readable collector status"),
        (name = "health", description = "Health check endpoints"),
        (name = "ingest", description = "TTN webhook"),
        (name = "readings", description = "Decoded sensor readings"),
        (name = "uplinks", description = "Stored uplink envelopes"),
    ),
    info(
        title = "redenv collector",
        description = "Collects redenv sensor frames from The Things Network",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let config = &state.config;
    let timeout = Duration::from_secs(config.request_timeout_seconds);

    tracing::info!(
        body_limit = config.max_body_bytes,
        ingest_concurrent = config.ingest_concurrent_limit,
        timeout_seconds = config.request_timeout_seconds,
        "Request limits configured"
    );

    // TTN webhook, body-limited since it is the only route taking input
    let ingest_routes = Router::new()
        .route("/redenv/collector", post(collector::collect))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes));

    let api_routes = Router::new()
        .route("/readings/latest", get(latest::get_latest_reading))
        .route("/uplinks/latest", get(latest::get_latest_uplink));

    let health_routes = Router::new().route("/healthz", get(health::healthz));

    // OpenAPI documentation
    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Router::new()
        .route("/", get(status::index))
        .merge(ingest_routes)
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
