//! NeuroFetch Auth — stateless identity tokens and the
//! signup/login/verify gateway service.

pub mod config;
pub mod error;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, LoginInput, LoginOutput, SignupInput};
pub use token::{TokenClaims, TokenService};
