//! # Offers
//!
//! `PUT /v1/offers/{offer_id}` records a driver's decision. Accepting
//! revokes the shipment's other active offers; offers already passed stay
//! passed. When several drivers accept at once exactly one succeeds and the
//! rest get 409 `CONFLICT`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::put;
use axum::{Json, Router};
use convoy_core::OfferId;
use convoy_state::Decision;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, parse_id, Validate};
use crate::state::AppState;

/// A driver's response to an offer.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RespondRequest {
    /// `ACCEPT` or `PASS`, case-insensitive.
    pub decision: String,
}

impl RespondRequest {
    fn decision(&self) -> Result<Decision, String> {
        self.decision
            .parse()
            .map_err(|_| format!("decision must be ACCEPT or PASS, got {:?}", self.decision))
    }
}

impl Validate for RespondRequest {
    fn validate(&self) -> Result<(), String> {
        self.decision().map(|_| ())
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/offers/{offer_id}", put(respond_to_offer))
}

/// PUT /v1/offers/{offer_id}: accept or pass.
#[utoipa::path(
    put,
    path = "/v1/offers/{offer_id}",
    params(("offer_id" = String, Path, description = "Offer ID, `12` or `offer:12`")),
    request_body = RespondRequest,
    responses(
        (status = 204, description = "Decision recorded"),
        (status = 404, description = "Unknown offer", body = crate::error::ErrorBody),
        (status = 409, description = "Offer already resolved, or another driver won", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid decision or offer ID", body = crate::error::ErrorBody),
        (status = 503, description = "Store unavailable", body = crate::error::ErrorBody),
    ),
    tag = "offers"
)]
pub async fn respond_to_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
    body: Result<Json<RespondRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let id: OfferId = parse_id(&offer_id)?;
    let req = extract_validated_json(body)?;
    let decision = req.decision().map_err(AppError::Validation)?;
    state.dispatcher.respond_to_offer(id, decision).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_is_case_insensitive() {
        for raw in ["accept", "ACCEPT", " Accept "] {
            let req = RespondRequest { decision: raw.into() };
            assert_eq!(req.decision().unwrap(), Decision::Accept);
        }
        let req = RespondRequest { decision: "pass".into() };
        assert_eq!(req.decision().unwrap(), Decision::Pass);
    }

    #[test]
    fn unknown_decision_fails_validation() {
        let req = RespondRequest { decision: "maybe".into() };
        assert!(req.validate().unwrap_err().contains("ACCEPT or PASS"));
    }
}
