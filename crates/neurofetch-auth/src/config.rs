//! Authentication configuration.

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Process-wide HMAC secret for signing tokens (HS256).
    pub jwt_secret: String,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Token lifetime in seconds (default: 86_400 = 24 hours).
    pub token_lifetime_secs: u64,
    /// Clock-skew tolerance applied to `exp` in seconds (default: 30).
    pub token_leeway_secs: u64,
    /// Minimum secret length accepted at signup (default: 8).
    pub min_secret_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: "neurofetch".into(),
            token_lifetime_secs: 86_400,
            token_leeway_secs: 30,
            min_secret_length: 8,
        }
    }
}
