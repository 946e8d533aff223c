//! # OpenAPI Document
//!
//! Assembles the utoipa-annotated handlers into one OpenAPI 3.1 document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Convoy Dispatch API",
        version = "0.1.0",
        description = "Offers freight shipments to capable drivers and records exactly one acceptance per shipment.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        crate::routes::drivers::register_driver,
        crate::routes::drivers::driver_offers,
        crate::routes::shipments::create_shipment,
        crate::routes::shipments::shipment_offers,
        crate::routes::offers::respond_to_offer,
        crate::routes::debug::dump_drivers,
        crate::routes::debug::dump_shipments,
        crate::routes::debug::dump_offers,
    ),
    components(schemas(
        crate::dto::DriverResponse,
        crate::dto::ShipmentResponse,
        crate::dto::OfferResponse,
        crate::dto::AllocationResponse,
        crate::dto::ShipmentOffersResponse,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::drivers::RegisterDriverRequest,
        crate::routes::shipments::CreateShipmentRequest,
        crate::routes::offers::RespondRequest,
    )),
    tags(
        (name = "drivers", description = "Driver registration and actionable offers"),
        (name = "shipments", description = "Shipment creation and offer allocation"),
        (name = "offers", description = "Accept or pass decisions"),
        (name = "debug", description = "Table dumps"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
