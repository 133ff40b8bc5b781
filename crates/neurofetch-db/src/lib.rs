//! NeuroFetch Database — SurrealDB connection management and the
//! credential store implementation.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Argon2id secret hashing ([`password`])
//! - The [`UserRepository`](neurofetch_core::repository::UserRepository)
//!   implementation ([`repository::SurrealUserRepository`])

mod connection;
mod error;
pub mod password;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
