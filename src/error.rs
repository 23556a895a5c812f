//! Error types for the entity store.

use crate::types::Id;
use thiserror::Error;

/// Boxed error returned by a fallible transform.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Transform failed for entity {id}: {source}")]
    Transform {
        id: Id,
        #[source]
        source: BoxError,
    },

    #[error("Duplicate id in allIds: {0}")]
    DuplicateId(Id),

    #[error("Id listed in allIds has no entity: {0}")]
    MissingRecord(Id),

    #[error("Entity is not listed in allIds: {0}")]
    OrphanRecord(Id),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
