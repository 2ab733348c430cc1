use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use std::sync::Arc;

use super::{ApiResponse, AppError};
use crate::models::*;
use crate::AppState;

/// Find all people in the bucket
pub async fn get_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Person>>>, AppError> {
    let people = state.person_service.get_all().await?;
    Ok(Json(ApiResponse::ok(people)))
}

/// Get a single person by key
pub async fn get(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GetPersonQuery>,
) -> Result<Json<ApiResponse<Person>>, AppError> {
    let id = non_empty(query.id)
        .ok_or_else(|| AppError::BadRequest("missing person id".to_string()))?;

    let person = state.person_service.get(&id).await?;
    Ok(Json(ApiResponse::ok(person)))
}

/// Create or update a person
pub async fn save(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Person>, JsonRejection>,
) -> Result<Json<ApiResponse<Person>>, AppError> {
    let Json(person) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let saved = state.person_service.save(person).await?;
    Ok(Json(ApiResponse::ok(saved)))
}

/// Delete a person given `{"id": "..."}`
pub async fn delete(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DeletePersonRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let id = non_empty(req.id).ok_or_else(|| AppError::BadRequest("missing id".to_string()))?;

    state.person_service.delete(&id).await?;
    Ok(Json(ApiResponse::ok_empty()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
