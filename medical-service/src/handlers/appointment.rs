use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use super::validation::*;
use super::AppError;
use crate::models::*;
use crate::AppState;

pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Value>>, AppError> {
    let appointments = state.medical_service.list(DocType::Appointment).await?;
    Ok(Json(appointments))
}

pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let body = object_body(payload)?;
    require_string(&body, "doctor", DOCTOR_REQUIRED)?;
    require_string(&body, "patient", PATIENT_REQUIRED)?;
    require_number(&body, "appointment", APPOINTMENT_REQUIRED)?;

    let appointment = state
        .medical_service
        .create(DocType::Appointment, body)
        .await?;
    Ok(Json(appointment))
}

/// Cancel an appointment given `{"id": "..."}` (or `appointmentid`)
pub async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Vec<Value>>, AppError> {
    let body = object_body(payload)?;
    let id = require_string(&body, "id", ID_REQUIRED)
        .or_else(|_| require_string(&body, "appointmentid", ID_REQUIRED))?;

    let deleted = state.medical_service.delete_appointment(id).await?;
    Ok(Json(deleted))
}
