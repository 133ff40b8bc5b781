//! Authentication error types.

use neurofetch_core::error::NeurofetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user already exists")]
    Conflict,

    #[error("no token provided")]
    Unauthenticated,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("user not found")]
    UserNotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error("credential store error: {0}")]
    Store(#[from] NeurofetchError),
}

impl AuthError {
    /// True for every failure of the access-control guard.
    ///
    /// Callers collapse these into a single "unauthorized" answer; the
    /// variant is only for server-side diagnostics.
    pub fn is_guard_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::Unauthenticated | AuthError::InvalidToken(_) | AuthError::UserNotFound
        )
    }
}
