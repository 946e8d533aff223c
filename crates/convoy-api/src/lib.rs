//! # convoy-api — HTTP Service for Convoy Dispatch
//!
//! Axum transport over [`convoy_dispatch::Dispatcher`]. Handlers parse and
//! validate requests, call one dispatcher operation, and map the result to
//! JSON. [`AppError`] turns dispatch error kinds into status codes.
//!
//! ## Surface
//!
//! | Method | Path | |
//! |--------|------|-|
//! | POST | `/v1/drivers` | register a driver |
//! | GET | `/v1/drivers/{driver_id}/offers` | actionable offers |
//! | POST | `/v1/shipments` | create and allocate a shipment |
//! | GET | `/v1/shipments/{shipment_id}/offers` | shipment offers |
//! | PUT | `/v1/offers/{offer_id}` | accept or pass |
//! | GET | `/v1/debug/{drivers,shipments,offers}` | table dumps |
//! | GET | `/health/liveness`, `/health/readiness` | probes |
//! | GET | `/metrics` | Prometheus exposition |
//! | GET | `/openapi.json` | OpenAPI document |

pub mod config;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod seed;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use convoy_store::EntityStore;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use middleware::metrics::ApiMetrics;
pub use state::{AppConfig, AppState};

/// Assemble the router with every route and middleware.
///
/// Layer order, outermost first: `TraceLayer`, metrics, handler.
pub fn app(state: AppState) -> Router {
    let metrics = ApiMetrics::new();

    let api = Router::new()
        .merge(routes::drivers::router())
        .merge(routes::shipments::router())
        .merge(routes::offers::router())
        .merge(routes::debug::router())
        .merge(openapi::router())
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(Extension(metrics.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let probes = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(prometheus_metrics))
        .layer(Extension(metrics))
        .with_state(state);

    Router::new().merge(probes).merge(api)
}

/// GET /metrics: refresh the domain gauges from the store, then encode
/// every metric in the Prometheus text format.
async fn prometheus_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> impl IntoResponse {
    match state.dispatcher.store().stats().await {
        Ok(stats) => metrics.observe_store(&stats),
        // Keep serving HTTP metrics; the gauges hold their last values.
        Err(e) => tracing::warn!(error = %e, "store stats unavailable for metrics scrape"),
    }

    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness probe: 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 "ready" when the store answers a ping, 503
/// otherwise.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.dispatcher.store();
    if let Err(e) = store.ping().await {
        tracing::warn!(backend = store.backend(), error = %e, "store health check failed");
        return (StatusCode::SERVICE_UNAVAILABLE, "store unreachable").into_response();
    }
    (StatusCode::OK, "ready").into_response()
}
