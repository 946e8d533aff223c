//! # Drivers
//!
//! - `POST /v1/drivers`: register a driver
//! - `GET /v1/drivers/{driver_id}/offers`: the driver's actionable offers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use convoy_core::DriverId;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::dto::{convert, DriverResponse, OfferResponse};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, parse_id, Validate};
use crate::state::AppState;

/// Request to register a driver.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RegisterDriverRequest {
    /// Display name.
    pub name: String,
    /// Maximum weight the driver's truck can carry. Must be positive.
    pub capacity: i64,
}

impl Validate for RegisterDriverRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.capacity <= 0 {
            return Err(format!("capacity must be positive, got {}", self.capacity));
        }
        Ok(())
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/drivers", post(register_driver))
        .route("/v1/drivers/{driver_id}/offers", get(driver_offers))
}

/// POST /v1/drivers: register a driver with a zero offer count.
#[utoipa::path(
    post,
    path = "/v1/drivers",
    request_body = RegisterDriverRequest,
    responses(
        (status = 201, description = "Driver registered", body = DriverResponse),
        (status = 422, description = "Invalid input", body = crate::error::ErrorBody),
        (status = 503, description = "Store unavailable", body = crate::error::ErrorBody),
    ),
    tag = "drivers"
)]
pub async fn register_driver(
    State(state): State<AppState>,
    body: Result<Json<RegisterDriverRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DriverResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let driver = state.dispatcher.register_driver(&req.name, req.capacity).await?;
    Ok((StatusCode::CREATED, Json(driver.into())))
}

/// GET /v1/drivers/{driver_id}/offers: active offers on shipments still
/// open for responses.
#[utoipa::path(
    get,
    path = "/v1/drivers/{driver_id}/offers",
    params(("driver_id" = String, Path, description = "Driver ID, `7` or `driver:7`")),
    responses(
        (status = 200, description = "Actionable offers", body = Vec<OfferResponse>),
        (status = 404, description = "Unknown driver", body = crate::error::ErrorBody),
        (status = 422, description = "Malformed driver ID", body = crate::error::ErrorBody),
    ),
    tag = "drivers"
)]
pub async fn driver_offers(
    State(state): State<AppState>,
    Path(driver_id): Path<String>,
) -> Result<Json<Vec<OfferResponse>>, AppError> {
    let id: DriverId = parse_id(&driver_id)?;
    let offers = state.dispatcher.driver_offers(id).await?;
    Ok(Json(convert(offers)))
}
