//! Document store abstraction.
//!
//! A bucket holds JSON documents addressed by key. Besides key-value access
//! the store runs query statements, applies sub-document mutations and
//! answers full-text searches. Handlers only talk to [`DocumentStore`], so
//! the PostgreSQL backend can be swapped for a mock in tests.

pub mod error;
pub mod postgres;
pub mod query;
pub mod search;
pub mod subdoc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

pub use error::{StoreError, StoreResult};
pub use postgres::PostgresStore;
pub use query::QueryStatement;
pub use search::{
    HighlightStyle, MatchQuery, SearchHit, SearchIndexDefinition, SearchQuery, SearchResults,
};
pub use subdoc::MutateInSpec;

/// Per-document version token. Starts at 1 and grows with every write.
pub type Cas = u64;

/// A stored document together with its key and current cas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    pub cas: Cas,
    pub content: Value,
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by key.
    async fn get(&self, id: &str) -> StoreResult<Document>;

    /// Create a document; fails if the key is taken.
    async fn insert(&self, id: &str, content: &Value) -> StoreResult<Cas>;

    /// Create or overwrite a document.
    async fn upsert(&self, id: &str, content: &Value) -> StoreResult<Cas>;

    /// Overwrite an existing document whose cas still equals `cas`.
    async fn replace(&self, id: &str, content: &Value, cas: Cas) -> StoreResult<Cas>;

    /// Delete a document by key.
    async fn remove(&self, id: &str) -> StoreResult<()>;

    /// Run a statement and return one JSON value per row.
    async fn query(&self, statement: &QueryStatement) -> StoreResult<Vec<Value>>;

    /// Apply sub-document mutations to one document atomically.
    async fn mutate_in(&self, id: &str, specs: &[MutateInSpec]) -> StoreResult<Cas>;

    /// Run a full-text search against a configured index.
    async fn search(&self, query: &SearchQuery) -> StoreResult<SearchResults>;

    /// Check that the backing database answers.
    async fn ping(&self) -> StoreResult<()>;
}

pub(crate) fn ensure_object(id: &str, content: &Value) -> StoreResult<()> {
    if content.is_object() {
        Ok(())
    } else {
        Err(StoreError::InvalidDocument(format!(
            "document {} must be a JSON object",
            id
        )))
    }
}
