//! Client configuration.

use std::path::PathBuf;

/// Where the controller's collaborators live and how long to wait on
/// them.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the authentication gateway.
    pub gateway_url: String,
    /// Base URL of the retrieval backend.
    pub backend_url: String,
    /// Timeout for gateway round-trips in seconds (default: 15).
    pub gateway_timeout_secs: u64,
    /// Timeout for backend round-trips in seconds (default: 120).
    /// Ingestion of large batches is slow.
    pub backend_timeout_secs: u64,
    /// Directory holding the persisted token file.
    pub token_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://localhost:3000".into(),
            backend_url: "http://localhost:5000".into(),
            gateway_timeout_secs: 15,
            backend_timeout_secs: 120,
            token_dir: PathBuf::from(".neurofetch"),
        }
    }
}
