//! # Debug Dumps
//!
//! Full listings of every table, in identifier order.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::dto::{convert, DriverResponse, OfferResponse, ShipmentResponse};
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/debug/drivers", get(dump_drivers))
        .route("/v1/debug/shipments", get(dump_shipments))
        .route("/v1/debug/offers", get(dump_offers))
}

#[utoipa::path(
    get,
    path = "/v1/debug/drivers",
    responses((status = 200, description = "All drivers", body = Vec<DriverResponse>)),
    tag = "debug"
)]
pub async fn dump_drivers(State(state): State<AppState>) -> Result<Json<Vec<DriverResponse>>, AppError> {
    Ok(Json(convert(state.dispatcher.drivers().await?)))
}

#[utoipa::path(
    get,
    path = "/v1/debug/shipments",
    responses((status = 200, description = "All shipments", body = Vec<ShipmentResponse>)),
    tag = "debug"
)]
pub async fn dump_shipments(
    State(state): State<AppState>,
) -> Result<Json<Vec<ShipmentResponse>>, AppError> {
    Ok(Json(convert(state.dispatcher.shipments().await?)))
}

#[utoipa::path(
    get,
    path = "/v1/debug/offers",
    responses((status = 200, description = "All offers", body = Vec<OfferResponse>)),
    tag = "debug"
)]
pub async fn dump_offers(State(state): State<AppState>) -> Result<Json<Vec<OfferResponse>>, AppError> {
    Ok(Json(convert(state.dispatcher.offers().await?)))
}
