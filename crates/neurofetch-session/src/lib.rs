//! NeuroFetch Session — the client-held state machine that checks
//! authentication, stages documents, drives ingestion, and runs the
//! conversation against the retrieval backend.
//!
//! The [`SessionController`] owns a single session aggregate and is
//! the only thing that mutates it; consumers observe it through
//! [`SessionSnapshot`]. Collaborators sit behind
//! traits so the controller can be driven by HTTP adapters in
//! production and by in-process fakes in tests:
//!
//! - [`GatewayClient`]: the authentication gateway
//! - [`RetrievalBackend`]: document ingestion and question answering
//! - [`TokenStore`]: the persisted identity token

pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod model;
pub mod roster;
pub mod token_store;

pub use backend::{HttpRetrievalBackend, RetrievalBackend};
pub use config::SessionConfig;
pub use controller::{HttpSessionController, QueryOutcome, SessionController};
pub use error::SessionError;
pub use gateway::{GatewayClient, HttpGatewayClient, LoginSession};
pub use model::{
    AgentRoster, AuthState, Message, QueryAnswer, Readiness, Role, SessionSnapshot, StagedFile,
};
pub use roster::fetch_roster;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
