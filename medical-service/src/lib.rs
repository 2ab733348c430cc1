//! Patient, doctor and appointment scheduling over the workshop bucket.

pub mod config;
pub mod handlers;
pub mod models;
pub mod queries;
pub mod services;

use axum::{
    routing::{get, post, put},
    Router,
};
use shared::DocumentStore;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::handlers::{appointment, doctor, health, patient};
use crate::services::medical_service::MedicalService;

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub medical_service: Arc<MedicalService>,
}

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        // Patients
        .route("/patients", get(patient::list_patients))
        .route("/patients/condition", post(patient::search_conditions))
        .route("/patient", post(patient::create_patient))
        .route("/patient/:id", get(patient::get_patient))
        .route("/patient/appointments/:id", get(patient::patient_appointments))
        .route("/patient/notes/:id", put(patient::add_note))
        // Doctors
        .route("/doctors", get(doctor::list_doctors))
        .route("/doctor", post(doctor::create_doctor))
        .route("/doctor/patient", put(doctor::assign_patient))
        .route("/doctor/:id", get(doctor::get_doctor))
        .route("/doctor/patients/:id", get(doctor::doctor_patients))
        .route("/doctor/appointments/:id", get(doctor::doctor_appointments))
        // Appointments
        .route("/appointments", get(appointment::list_appointments))
        .route(
            "/appointment",
            post(appointment::create_appointment).delete(appointment::delete_appointment),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
