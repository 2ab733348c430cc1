use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::{Cas, Document, StoreError};
use thiserror::Error;
use validator::Validate;

/// Discriminator stored in every person document.
pub const PERSON_TYPE: &str = "person";

pub type PersonResult<T> = Result<T, PersonError>;

#[derive(Debug, Error)]
pub enum PersonError {
    #[error("missing person info")]
    MissingInfo,

    #[error("Document not found")]
    NotFound,

    #[error("document {0} is not a person")]
    WrongType(String),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("invalid person document {id}: {message}")]
    Corrupt { id: String, message: String },
}

/// A person record as exchanged with clients.
///
/// `id` is the document key and `version` its cas; neither is stored in the
/// document body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default, alias = "Version")]
    pub version: Cas,

    #[validate(required, length(min = 1))]
    pub first_name: Option<String>,

    #[validate(required, length(min = 1))]
    pub last_name: Option<String>,

    pub email: Option<String>,
}

impl Person {
    /// Body written to the store.
    pub fn to_content(&self) -> Value {
        json!({
            "type": PERSON_TYPE,
            "firstName": self.first_name,
            "lastName": self.last_name,
            "email": self.email,
        })
    }

    pub fn from_document(document: Document) -> PersonResult<Self> {
        let Document { id, cas, content } = document;
        if content.get("type").and_then(Value::as_str) != Some(PERSON_TYPE) {
            return Err(PersonError::NotFound);
        }
        Self::from_row(content).map(|person| Person {
            id: Some(id),
            version: cas,
            ..person
        })
    }

    /// Decode a query row carrying `id` and `version` next to the body.
    pub fn from_row(row: Value) -> PersonResult<Self> {
        let id = row
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        serde_json::from_value(row).map_err(|e| PersonError::Corrupt {
            id,
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct GetPersonQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeletePersonRequest {
    pub id: Option<String>,
}
