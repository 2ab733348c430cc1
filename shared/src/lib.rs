//! Shared building blocks for the workshop services: the document store,
//! configuration loading and logging setup.

// Re-export common dependencies
pub use async_trait;
pub use serde_json;
pub use tracing;

pub mod database;
pub mod observability;
pub mod settings;
pub mod store;

pub use store::{
    Cas, Document, DocumentStore, MutateInSpec, QueryStatement, SearchQuery, SearchResults,
    StoreError, StoreResult,
};

#[cfg(any(test, feature = "mock"))]
pub use store::MockDocumentStore;
