//! Error types for the NeuroFetch system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NeurofetchError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),
}

pub type NeurofetchResult<T> = Result<T, NeurofetchError>;
