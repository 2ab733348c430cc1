use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;
use shared::SearchResults;
use std::sync::Arc;

use super::validation::*;
use super::AppError;
use crate::models::*;
use crate::AppState;

pub async fn list_patients(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Value>>, AppError> {
    let patients = state.medical_service.list(DocType::Patient).await?;
    Ok(Json(patients))
}

pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let patient = state.medical_service.get(DocType::Patient, &id).await?;
    Ok(Json(patient))
}

pub async fn patient_appointments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Value>>, AppError> {
    let appointments = state
        .medical_service
        .appointments(AppointmentParty::Patient, &id)
        .await?;
    Ok(Json(appointments))
}

/// Full-text search over patient names and notes
pub async fn search_conditions(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SearchResults>, AppError> {
    let body = object_body(payload)?;
    let search = ConditionSearch {
        search: require_string(&body, "search", SEARCH_REQUIRED)?.to_string(),
        fuzziness: optional_fuzziness(&body)?,
    };

    let results = state.medical_service.search_conditions(&search).await?;
    Ok(Json(results))
}

pub async fn create_patient(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let body = object_body(payload)?;
    require_object(&body, "information", INFORMATION_REQUIRED)?;

    let patient = state.medical_service.create(DocType::Patient, body).await?;
    Ok(Json(patient))
}

/// Append a doctor's note to a patient
pub async fn add_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let body = object_body(payload)?;
    require_string(&body, "doctor", DOCTOR_REQUIRED)?;
    require_string(&body, "message", MESSAGE_REQUIRED)?;

    let note = state.medical_service.add_note(&id, body).await?;
    Ok(Json(note))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use shared::store::search::{SearchHit, SearchStatus};
    use shared::{Document, MockDocumentStore, StoreError};
    use std::collections::BTreeMap;

    use crate::handlers::test_support::{send, test_app};
    use crate::handlers::validation::*;

    #[tokio::test]
    async fn test_list_patients_returns_rows() {
        let mut store = MockDocumentStore::new();
        store
            .expect_query()
            .withf(|query| query.params == vec!["patient"])
            .returning(|_| Ok(vec![json!({ "id": "p1", "type": "patient" })]));

        let (status, body) = send(test_app(store), "GET", "/patients", None).await;

        assert_eq!(status.as_u16(), 200);
        assert_eq!(body, json!([{ "id": "p1", "type": "patient" }]));
    }

    #[tokio::test]
    async fn test_get_patient_returns_content() {
        let mut store = MockDocumentStore::new();
        store.expect_get().withf(|id| id == "p1").returning(|id| {
            Ok(Document {
                id: id.to_string(),
                cas: 3,
                content: json!({ "type": "patient", "information": { "firstname": "Ada" } }),
            })
        });

        let (status, body) = send(test_app(store), "GET", "/patient/p1", None).await;

        assert_eq!(status.as_u16(), 200);
        assert_eq!(body["information"]["firstname"], "Ada");
    }

    #[tokio::test]
    async fn test_missing_patient_is_server_error_with_code() {
        let mut store = MockDocumentStore::new();
        store
            .expect_get()
            .returning(|id| Err(StoreError::DocumentNotFound(id.to_string())));

        let (status, body) = send(test_app(store), "GET", "/patient/nobody", None).await;

        assert_eq!(status.as_u16(), 500);
        assert_eq!(
            body,
            json!({ "code": 13, "message": "document not found: nobody" })
        );
    }

    #[tokio::test]
    async fn test_create_patient_requires_information() {
        let mut store = MockDocumentStore::new();
        store.expect_insert().never();

        let (status, body) = send(
            test_app(store),
            "POST",
            "/patient",
            Some(json!({ "information": "Ada Lovelace" })),
        )
        .await;

        assert_eq!(status.as_u16(), 400);
        assert_eq!(body, json!({ "message": INFORMATION_REQUIRED }));
    }

    #[tokio::test]
    async fn test_create_patient_stores_typed_document() {
        let mut store = MockDocumentStore::new();
        store
            .expect_insert()
            .withf(|_, content| {
                content["type"] == "patient" && content["information"]["gender"] == "F"
            })
            .times(1)
            .returning(|_, _| Ok(1));

        let (status, body) = send(
            test_app(store),
            "POST",
            "/patient",
            Some(json!({ "information": { "firstname": "Ada", "gender": "F" } })),
        )
        .await;

        assert_eq!(status.as_u16(), 200);
        assert_eq!(body["type"], "patient");
        assert!(body["timestamp"].is_i64());
        assert!(body["id"].is_string());
    }

    #[tokio::test]
    async fn test_add_note_requires_message() {
        let mut store = MockDocumentStore::new();
        store.expect_mutate_in().never();

        let (status, body) = send(
            test_app(store),
            "PUT",
            "/patient/notes/p1",
            Some(json!({ "doctor": "d1", "message": "" })),
        )
        .await;

        assert_eq!(status.as_u16(), 400);
        assert_eq!(body, json!({ "message": MESSAGE_REQUIRED }));
    }

    #[tokio::test]
    async fn test_add_note_appends_with_parents() {
        let mut store = MockDocumentStore::new();
        store
            .expect_mutate_in()
            .withf(|id, specs| match specs {
                [shared::MutateInSpec::ArrayAppend {
                    path,
                    value,
                    create_parents,
                }] => {
                    id == "p1"
                        && path == "notes"
                        && *create_parents
                        && value["doctor"] == "d1"
                        && value["timestamp"].is_i64()
                }
                _ => false,
            })
            .times(1)
            .returning(|_, _| Ok(2));

        let (status, body) = send(
            test_app(store),
            "PUT",
            "/patient/notes/p1",
            Some(json!({ "doctor": "d1", "message": "Persistent cough" })),
        )
        .await;

        assert_eq!(status.as_u16(), 200);
        assert_eq!(body["message"], "Persistent cough");
    }

    #[tokio::test]
    async fn test_search_requires_search_string() {
        let mut store = MockDocumentStore::new();
        store.expect_search().never();

        let (status, body) = send(
            test_app(store),
            "POST",
            "/patients/condition",
            Some(json!({ "fuzziness": 1 })),
        )
        .await;

        assert_eq!(status.as_u16(), 400);
        assert_eq!(body, json!({ "message": SEARCH_REQUIRED }));
    }

    #[tokio::test]
    async fn test_search_returns_highlighted_hits() {
        let mut store = MockDocumentStore::new();
        store
            .expect_search()
            .withf(|query| query.query.text == "cough" && query.query.fuzziness == 0)
            .returning(|query| {
                let mut fragments = BTreeMap::new();
                fragments.insert(
                    "notes.message".to_string(),
                    vec!["Persistent <mark>cough</mark>".to_string()],
                );
                Ok(shared::SearchResults {
                    status: SearchStatus {
                        total: 1,
                        failed: 0,
                        successful: 1,
                    },
                    hits: vec![SearchHit {
                        index: query.index.clone(),
                        id: "p1".to_string(),
                        score: 1.0,
                        fragments,
                        fields: serde_json::Map::new(),
                    }],
                    total_hits: 1,
                    max_score: 1.0,
                    took: 10,
                })
            });

        let (status, body) = send(
            test_app(store),
            "POST",
            "/patients/condition",
            Some(json!({ "search": "cough" })),
        )
        .await;

        assert_eq!(status.as_u16(), 200);
        assert_eq!(body["total_hits"], 1);
        assert_eq!(body["hits"][0]["id"], "p1");
        assert_eq!(
            body["hits"][0]["fragments"]["notes.message"][0],
            "Persistent <mark>cough</mark>"
        );
    }
}
