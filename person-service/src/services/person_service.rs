use std::sync::Arc;

use serde_json::Value;
use shared::database::postgres::quote_ident;
use shared::{Cas, DocumentStore, QueryStatement, StoreError};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::models::*;

pub struct PersonService {
    store: Arc<dyn DocumentStore>,
    bucket: String,
}

impl PersonService {
    pub fn new(store: Arc<dyn DocumentStore>, bucket: &str) -> Self {
        Self {
            store,
            bucket: bucket.to_string(),
        }
    }

    /// Every person in the bucket, ordered by key.
    pub async fn get_all(&self) -> PersonResult<Vec<Person>> {
        let statement = format!(
            "SELECT jsonb_build_object('id', id, 'version', cas) || content AS row \
             FROM {} WHERE content->>'type' = $1 ORDER BY id",
            quote_ident(&self.bucket)
        );
        let rows = self
            .store
            .query(&QueryStatement::parameterized(statement, [PERSON_TYPE]))
            .await?;

        rows.into_iter().map(Person::from_row).collect()
    }

    pub async fn get(&self, id: &str) -> PersonResult<Person> {
        let document = self.store.get(id).await.map_err(|e| match e {
            StoreError::DocumentNotFound(_) => PersonError::NotFound,
            other => PersonError::Store(other),
        })?;
        Person::from_document(document)
    }

    /// Persist `person`, generating a key when it has none.
    ///
    /// A non-zero version is checked against the stored cas. Keys held by
    /// documents of another type are never overwritten.
    pub async fn save(&self, mut person: Person) -> PersonResult<Person> {
        person.validate().map_err(|_| PersonError::MissingInfo)?;

        let content = person.to_content();
        let (id, cas) = match person.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {
                let cas = match (person.version, self.current_version(id).await?) {
                    (0, None) => self.store.insert(id, &content).await?,
                    (0, Some(current)) => self.store.replace(id, &content, current).await?,
                    (version, _) => self.store.replace(id, &content, version).await?,
                };
                (id.to_string(), cas)
            }
            _ => {
                let id = Uuid::new_v4().to_string();
                let cas = self.store.insert(&id, &content).await?;
                (id, cas)
            }
        };

        info!("Saved person {} at version {}", id, cas);
        person.id = Some(id);
        person.version = cas;
        Ok(person)
    }

    /// Delete a person by key. Other document types are left alone.
    pub async fn delete(&self, id: &str) -> PersonResult<()> {
        let statement = format!(
            "DELETE FROM {} WHERE id = $1 AND content->>'type' = $2 \
             RETURNING jsonb_build_object('id', id) AS row",
            quote_ident(&self.bucket)
        );
        let deleted = self
            .store
            .query(&QueryStatement::parameterized(statement, [id, PERSON_TYPE]))
            .await?;

        if deleted.is_empty() {
            return Err(PersonError::NotFound);
        }
        debug!("Deleted person {}", id);
        Ok(())
    }

    /// Cas of the stored person under `id`, `None` when the key is free.
    async fn current_version(&self, id: &str) -> PersonResult<Option<Cas>> {
        match self.store.get(id).await {
            Ok(document) => match document.content.get("type").and_then(Value::as_str) {
                Some(PERSON_TYPE) => Ok(Some(document.cas)),
                _ => Err(PersonError::WrongType(id.to_string())),
            },
            Err(StoreError::DocumentNotFound(_)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
