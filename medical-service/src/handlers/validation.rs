//! Required-field checks shared by the handlers.
//!
//! Every check runs before the store is touched and fails with the
//! client-facing message the endpoint documents.

use axum::{extract::rejection::JsonRejection, Json};
use serde_json::Value;

use super::AppError;
use crate::models::Payload;

pub const SEARCH_REQUIRED: &str = "A `search` string is required";
pub const FUZZINESS_INVALID: &str = "`fuzziness` must be a non-negative integer";
pub const INFORMATION_REQUIRED: &str = "An `information` object is required";
pub const DOCTOR_REQUIRED: &str = "A `doctor` string is required";
pub const PATIENT_REQUIRED: &str = "A `patient` string is required";
pub const MESSAGE_REQUIRED: &str = "A `message` string is required";
pub const DEPARTMENT_REQUIRED: &str = "A `department` string is required";
pub const APPOINTMENT_REQUIRED: &str = "A `appointment` unix time is required";
pub const ID_REQUIRED: &str = "An `id` string is required";
pub const OBJECT_BODY_REQUIRED: &str = "A JSON object body is required";

/// Unwrap a JSON body that must be an object.
pub fn object_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Payload, AppError> {
    let Json(body) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    match body {
        Value::Object(fields) => Ok(fields),
        _ => Err(AppError::Validation(OBJECT_BODY_REQUIRED.to_string())),
    }
}

/// A non-empty string field.
pub fn require_string<'a>(
    payload: &'a Payload,
    field: &str,
    message: &str,
) -> Result<&'a str, AppError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(message.to_string()))
}

pub fn require_object(payload: &Payload, field: &str, message: &str) -> Result<(), AppError> {
    match payload.get(field) {
        Some(Value::Object(_)) => Ok(()),
        _ => Err(AppError::Validation(message.to_string())),
    }
}

/// Any JSON number, e.g. a unix timestamp with or without a fraction.
pub fn require_number(payload: &Payload, field: &str, message: &str) -> Result<f64, AppError> {
    payload
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| AppError::Validation(message.to_string()))
}

/// Optional `fuzziness`; `null` counts as absent.
pub fn optional_fuzziness(payload: &Payload) -> Result<Option<u8>, AppError> {
    match payload.get("fuzziness") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| u8::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| AppError::Validation(FUZZINESS_INVALID.to_string())),
    }
}
