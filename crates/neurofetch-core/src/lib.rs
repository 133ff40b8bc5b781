//! NeuroFetch Core — domain models, error types, and the credential
//! store abstraction shared by every other crate.

pub mod error;
pub mod models;
pub mod repository;
