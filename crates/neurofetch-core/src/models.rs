//! Domain models for NeuroFetch.

pub mod user;
