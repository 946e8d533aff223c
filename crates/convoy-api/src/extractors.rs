//! # Extractors & Validation
//!
//! The [`Validate`] trait for request bodies, helpers that turn JSON
//! rejections into 422 responses, and [`parse_id`] for path identifiers.

use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use convoy_core::ValidationError;

use crate::error::AppError;

/// Checks a request body must pass beyond what serde enforces.
pub trait Validate {
    /// Returns a client-facing message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Unwrap a JSON body. Malformed JSON, a wrong content type and unknown
/// fields all become [`AppError::Validation`].
///
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::Validation(err.body_text()))
}

/// [`extract_json`] followed by [`Validate::validate`].
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Parse a path segment into an identifier newtype. Accepts `7` and
/// `offer:7` alike.
pub fn parse_id<T>(raw: &str) -> Result<T, AppError>
where
    T: FromStr<Err = ValidationError>,
{
    raw.parse().map_err(AppError::from)
}
