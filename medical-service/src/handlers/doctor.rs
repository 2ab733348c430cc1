use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use super::validation::*;
use super::AppError;
use crate::models::*;
use crate::AppState;

pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Value>>, AppError> {
    let doctors = state.medical_service.list(DocType::Doctor).await?;
    Ok(Json(doctors))
}

pub async fn get_doctor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor = state.medical_service.get(DocType::Doctor, &id).await?;
    Ok(Json(doctor))
}

/// Patients of a doctor; `?serviced=true` switches to patients with notes by them
pub async fn doctor_patients(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<DoctorPatientsQuery>,
) -> Result<Json<Vec<Value>>, AppError> {
    let patients = state
        .medical_service
        .doctor_patients(&id, query.serviced)
        .await?;
    Ok(Json(patients))
}

pub async fn doctor_appointments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Value>>, AppError> {
    let appointments = state
        .medical_service
        .appointments(AppointmentParty::Doctor, &id)
        .await?;
    Ok(Json(appointments))
}

pub async fn create_doctor(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let body = object_body(payload)?;
    require_object(&body, "information", INFORMATION_REQUIRED)?;
    require_string(&body, "department", DEPARTMENT_REQUIRED)?;

    let doctor = state.medical_service.create(DocType::Doctor, body).await?;
    Ok(Json(doctor))
}

/// Add a patient to the doctor's `patients` list
pub async fn assign_patient(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PatientAssignment>, AppError> {
    let body = object_body(payload)?;
    let assignment = PatientAssignment {
        doctor: require_string(&body, "doctor", DOCTOR_REQUIRED)?.to_string(),
        patient: require_string(&body, "patient", PATIENT_REQUIRED)?.to_string(),
    };

    state.medical_service.assign_patient(&assignment).await?;
    Ok(Json(assignment))
}
