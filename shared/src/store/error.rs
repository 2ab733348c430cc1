//! Errors raised by document store operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("document already exists: {0}")]
    DocumentExists(String),

    #[error("cas mismatch for {id}: expected {expected}, found {actual}")]
    CasMismatch { id: String, expected: u64, actual: u64 },

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("path mismatch: {0}")]
    PathMismatch(String),

    #[error("path already exists: {0}")]
    PathExists(String),

    #[error("Query Error: {0}")]
    Query(String),

    #[error("search index not found: {0}")]
    SearchIndexNotFound(String),

    #[error("Search Error: {0}")]
    Search(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Numeric error code reported alongside the message in error bodies.
    pub fn code(&self) -> u32 {
        match self {
            StoreError::InvalidDocument(_) => 4,
            StoreError::CasMismatch { .. } => 9,
            StoreError::DocumentExists(_) => 12,
            StoreError::DocumentNotFound(_) => 13,
            StoreError::Connection(_) => 23,
            StoreError::PathNotFound(_) => 64,
            StoreError::PathMismatch(_) => 65,
            StoreError::PathExists(_) => 71,
            StoreError::SearchIndexNotFound(_) => 404,
            StoreError::Search(_) => 1000,
            StoreError::Query(_) => 5000,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::DocumentNotFound(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Connection(err.to_string()),
            other => StoreError::Query(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(StoreError::DocumentNotFound("p1".to_string()).code(), 13);
        assert_eq!(StoreError::DocumentExists("p1".to_string()).code(), 12);
        assert_eq!(StoreError::Query("bad".to_string()).code(), 5000);
    }

    #[test]
    fn test_messages() {
        let err = StoreError::DocumentNotFound("p1".to_string());
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "document not found: p1");

        let err = StoreError::Query("syntax error".to_string());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Query Error: syntax error");
    }

    #[test]
    fn test_pool_timeout_is_connection_error() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StoreError::Connection(_)));

        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::Query(_)));
    }
}
