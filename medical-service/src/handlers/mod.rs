pub mod appointment;
pub mod doctor;
pub mod health;
pub mod patient;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::StoreError;
use thiserror::Error;

use crate::models::{ErrorBody, MessageBody};

// ============= Error Handling =============

#[derive(Debug, Error)]
pub enum AppError {
    /// Request rejected before touching the store.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(message) => {
                tracing::warn!("Rejected request: {}", message);
                (StatusCode::BAD_REQUEST, Json(MessageBody { message })).into_response()
            }
            AppError::Store(err) => {
                tracing::error!("Store operation failed: {}", err);
                let body = ErrorBody {
                    code: err.code(),
                    message: err.to_string(),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}
