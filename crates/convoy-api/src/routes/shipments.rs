//! # Shipments
//!
//! - `POST /v1/shipments`: create a shipment and allocate its offers
//! - `GET /v1/shipments/{shipment_id}/offers`: offers visible for a shipment

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use convoy_core::ShipmentId;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::dto::{AllocationResponse, ShipmentOffersResponse};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, parse_id, Validate};
use crate::state::AppState;

/// Request to create a shipment.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateShipmentRequest {
    pub title: String,
    /// Weight the carrying truck must support. Must be positive.
    pub capacity: i64,
}

impl Validate for CreateShipmentRequest {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.capacity <= 0 {
            return Err(format!("capacity must be positive, got {}", self.capacity));
        }
        Ok(())
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/shipments", post(create_shipment))
        .route("/v1/shipments/{shipment_id}/offers", get(shipment_offers))
}

/// POST /v1/shipments: create a shipment and offer it to the least-offered
/// drivers able to carry it.
#[utoipa::path(
    post,
    path = "/v1/shipments",
    request_body = CreateShipmentRequest,
    responses(
        (status = 201, description = "Shipment created and offers extended", body = AllocationResponse),
        (status = 422, description = "Invalid input", body = crate::error::ErrorBody),
        (status = 503, description = "Allocation rolled back or store unavailable", body = crate::error::ErrorBody),
    ),
    tag = "shipments"
)]
pub async fn create_shipment(
    State(state): State<AppState>,
    body: Result<Json<CreateShipmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AllocationResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let allocation = state.dispatcher.create_shipment(&req.title, req.capacity).await?;
    Ok((StatusCode::CREATED, Json(allocation.into())))
}

/// GET /v1/shipments/{shipment_id}/offers: the accepted offer once there is
/// one, otherwise every active offer.
#[utoipa::path(
    get,
    path = "/v1/shipments/{shipment_id}/offers",
    params(("shipment_id" = String, Path, description = "Shipment ID, `3` or `shipment:3`")),
    responses(
        (status = 200, description = "Shipment offers", body = ShipmentOffersResponse),
        (status = 404, description = "Unknown shipment", body = crate::error::ErrorBody),
        (status = 422, description = "Malformed shipment ID", body = crate::error::ErrorBody),
    ),
    tag = "shipments"
)]
pub async fn shipment_offers(
    State(state): State<AppState>,
    Path(shipment_id): Path<String>,
) -> Result<Json<ShipmentOffersResponse>, AppError> {
    let id: ShipmentId = parse_id(&shipment_id)?;
    let view = state.dispatcher.shipment_offers(id).await?;
    Ok(Json(view.into()))
}
