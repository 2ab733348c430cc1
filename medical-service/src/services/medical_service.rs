use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use shared::store::{HighlightStyle, MatchQuery, SearchResults};
use shared::{DocumentStore, MutateInSpec, SearchQuery, StoreError, StoreResult};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SearchSettings;
use crate::models::*;
use crate::queries;

/// Stored fields returned with every condition search hit.
pub const CONDITION_FIELDS: [&str; 3] = [
    "information.firstname",
    "information.lastname",
    "notes.message",
];

pub const HIGHLIGHTED_FIELD: &str = "notes.message";

pub struct MedicalService {
    store: Arc<dyn DocumentStore>,
    bucket: String,
    search: SearchSettings,
}

impl MedicalService {
    pub fn new(store: Arc<dyn DocumentStore>, bucket: &str, search: SearchSettings) -> Self {
        Self {
            store,
            bucket: bucket.to_string(),
            search,
        }
    }

    /// Every document of `doc_type`, each with its key as `id`.
    pub async fn list(&self, doc_type: DocType) -> StoreResult<Vec<Value>> {
        self.store
            .query(&queries::list_by_type(&self.bucket, doc_type))
            .await
    }

    /// Content of one document. A document of another type counts as absent.
    pub async fn get(&self, doc_type: DocType, id: &str) -> StoreResult<Value> {
        let document = self.store.get(id).await?;
        if document.content.get("type").and_then(Value::as_str) != Some(doc_type.as_str()) {
            return Err(StoreError::DocumentNotFound(id.to_string()));
        }
        Ok(document.content)
    }

    pub async fn appointments(&self, party: AppointmentParty, id: &str) -> StoreResult<Vec<Value>> {
        self.store
            .query(&queries::appointments_for(&self.bucket, party, id))
            .await
    }

    /// Patients assigned to a doctor, or with `serviced` the patients the
    /// doctor has written notes for.
    pub async fn doctor_patients(
        &self,
        doctor_id: &str,
        serviced: bool,
    ) -> StoreResult<Vec<Value>> {
        let statement = if serviced {
            queries::patients_serviced_by(&self.bucket, doctor_id)
        } else {
            queries::patients_assigned_to(&self.bucket, doctor_id)
        };
        self.store.query(&statement).await
    }

    /// Store `payload` as a new document of `doc_type` under a fresh key.
    ///
    /// Returns the stored content with the key merged in as `id`.
    pub async fn create(&self, doc_type: DocType, mut payload: Payload) -> StoreResult<Value> {
        payload.insert("type".to_string(), Value::from(doc_type.as_str()));
        payload.insert("timestamp".to_string(), Value::from(Utc::now().timestamp()));

        let id = Uuid::new_v4().to_string();
        let content = Value::Object(payload);
        self.store.insert(&id, &content).await?;
        info!("Created {} {}", doc_type.as_str(), id);

        let mut created = content;
        if let Value::Object(fields) = &mut created {
            fields.insert("id".to_string(), Value::from(id));
        }
        Ok(created)
    }

    /// Append a timestamped note to the patient's `notes` array.
    pub async fn add_note(&self, patient_id: &str, mut note: Payload) -> StoreResult<Value> {
        note.insert("timestamp".to_string(), Value::from(Utc::now().timestamp()));
        let note = Value::Object(note);

        let spec = MutateInSpec::array_append("notes", note.clone()).create_parents(true);
        let cas = self.store.mutate_in(patient_id, &[spec]).await?;
        debug!("Added note to patient {} (cas {})", patient_id, cas);
        Ok(note)
    }

    /// Record the patient in the doctor's `patients` list once.
    pub async fn assign_patient(&self, assignment: &PatientAssignment) -> StoreResult<()> {
        let patient = Value::from(assignment.patient.as_str());
        let spec = MutateInSpec::array_add_unique("patients", patient).create_parents(true);
        self.store.mutate_in(&assignment.doctor, &[spec]).await?;
        info!(
            "Assigned patient {} to doctor {}",
            assignment.patient, assignment.doctor
        );
        Ok(())
    }

    /// Delete an appointment, returning the removed rows.
    pub async fn delete_appointment(&self, id: &str) -> StoreResult<Vec<Value>> {
        let rows = self
            .store
            .query(&queries::delete_appointment(&self.bucket, id))
            .await?;
        info!("Deleted {} appointment(s) with id {}", rows.len(), id);
        Ok(rows)
    }

    pub async fn search_conditions(&self, search: &ConditionSearch) -> StoreResult<SearchResults> {
        let mut matcher = MatchQuery::new(search.search.as_str());
        if let Some(fuzziness) = search.fuzziness {
            matcher = matcher.fuzziness(fuzziness);
        }

        let query = SearchQuery::new(self.search.index.as_str(), matcher)
            .fields(CONDITION_FIELDS)
            .highlight(HighlightStyle::Html, [HIGHLIGHTED_FIELD]);
        self.store.search(&query).await
    }
}
