//! Database-specific error types and conversions.

use neurofetch_core::error::NeurofetchError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Unique constraint violated on {entity}")]
    Duplicate { entity: String },

    #[error("Secret hashing failed: {0}")]
    Hash(String),
}

impl From<DbError> for NeurofetchError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => NeurofetchError::NotFound { entity, id },
            DbError::Duplicate { entity } => NeurofetchError::AlreadyExists { entity },
            DbError::Hash(msg) => NeurofetchError::Crypto(msg),
            other => NeurofetchError::Database(other.to_string()),
        }
    }
}
