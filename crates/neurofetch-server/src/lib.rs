//! NeuroFetch Server — the HTTP face of the authentication gateway.
//!
//! Routes:
//! - `POST /auth/signup`  → `201 {message}`
//! - `POST /auth/login`   → `200 {token, user, expires_in}`
//! - `GET  /auth/verify`  → `200 {user}` (guarded)
//! - `GET  /health`       → `200 {status}`

pub mod config;
pub mod error;
pub mod guard;
pub mod routes;
pub mod state;

pub use config::ServerArgs;
pub use error::{ApiError, StartupError};
pub use guard::AuthenticatedUser;
pub use routes::router;
pub use state::{AppState, Gateway};
