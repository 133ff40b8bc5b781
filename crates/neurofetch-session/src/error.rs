//! Session-layer error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user already exists")]
    Conflict,

    #[error("no documents selected")]
    EmptySelection,

    #[error("documents are already being processed")]
    AlreadyProcessing,

    #[error("retrieval backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("retrieval backend rejected the request: {0}")]
    BackendRejected(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("authentication gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("authentication gateway rejected the request: {0}")]
    GatewayRejected(String),

    #[error("token store error: {0}")]
    TokenStore(#[from] std::io::Error),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}
