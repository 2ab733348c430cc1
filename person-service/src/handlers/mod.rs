pub mod health;
pub mod person;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::PersonError;

/// `{status, results}` / `{status, error}` envelope used by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(results: T) -> Self {
        Self {
            status: "ok",
            results: Some(results),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn ok_empty() -> Self {
        Self {
            status: "ok",
            results: None,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: "failed",
            results: None,
            error: Some(error.into()),
        }
    }
}

// ============= Error Handling =============

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Person(PersonError),
}

impl From<PersonError> for AppError {
    fn from(err: PersonError) -> Self {
        AppError::Person(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => {
                tracing::warn!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
            AppError::Person(PersonError::MissingInfo) => {
                tracing::warn!("Rejected request: missing person info");
                (StatusCode::BAD_REQUEST, PersonError::MissingInfo.to_string())
            }
            AppError::Person(err) => {
                tracing::error!("Person operation failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        (status, Json(ApiResponse::failed(message))).into_response()
    }
}
