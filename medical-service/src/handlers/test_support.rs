use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use shared::database::DatabaseConfig;
use shared::observability::LoggingSettings;
use shared::settings::ServerSettings;
use shared::{DocumentStore, MockDocumentStore};
use std::sync::Arc;
use tower::ServiceExt;

use crate::config::{Config, SearchSettings};
use crate::services::medical_service::MedicalService;
use crate::AppState;

pub fn test_app(store: MockDocumentStore) -> Router {
    let search = SearchSettings {
        index: "medical-condition".to_string(),
        doc_type: "patient".to_string(),
        fields: vec!["notes.message".to_string()],
    };
    let store: Arc<dyn DocumentStore> = Arc::new(store);
    let state = Arc::new(AppState {
        config: Config {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            database: DatabaseConfig::default(),
            bucket: "default".to_string(),
            logging: LoggingSettings::default(),
            search: search.clone(),
        },
        store: store.clone(),
        medical_service: Arc::new(MedicalService::new(store, "default", search)),
    });
    crate::app(state)
}

pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}
