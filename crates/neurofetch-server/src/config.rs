//! Server configuration, read from CLI flags or the environment.

use std::net::SocketAddr;

use clap::Parser;
use neurofetch_auth::AuthConfig;
use neurofetch_db::DbConfig;

use crate::error::StartupError;

#[derive(Debug, Clone, Parser)]
#[command(name = "neurofetch-server", version, about = "NeuroFetch authentication gateway")]
pub struct ServerArgs {
    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// HMAC secret used to sign identity tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Token lifetime in seconds.
    #[arg(long, env = "NEUROFETCH_TOKEN_LIFETIME_SECS", default_value_t = 86_400)]
    pub token_lifetime_secs: u64,

    /// Clock-skew tolerance for token expiry, in seconds.
    #[arg(long, env = "NEUROFETCH_TOKEN_LEEWAY_SECS", default_value_t = 30)]
    pub token_leeway_secs: u64,

    /// Minimum secret length accepted at signup.
    #[arg(long, env = "NEUROFETCH_MIN_SECRET_LENGTH", default_value_t = 8)]
    pub min_secret_length: usize,

    /// Optional pepper prepended to secrets before hashing.
    #[arg(long, env = "NEUROFETCH_PEPPER", hide_env_values = true)]
    pub pepper: Option<String>,

    /// SurrealDB endpoint (`mem://`, `ws://host:port`).
    #[arg(long, env = "NEUROFETCH_DB_URL", default_value = "mem://")]
    pub db_url: String,

    #[arg(long, env = "NEUROFETCH_DB_NAMESPACE", default_value = "neurofetch")]
    pub db_namespace: String,

    #[arg(long, env = "NEUROFETCH_DB_NAME", default_value = "main")]
    pub db_name: String,

    #[arg(long, env = "NEUROFETCH_DB_USER")]
    pub db_user: Option<String>,

    #[arg(long, env = "NEUROFETCH_DB_PASS", hide_env_values = true)]
    pub db_pass: Option<String>,
}

impl ServerArgs {
    pub fn bind_addr(&self) -> Result<SocketAddr, StartupError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| StartupError::Config(format!("invalid bind address: {e}")))
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.jwt_secret.clone(),
            token_lifetime_secs: self.token_lifetime_secs,
            token_leeway_secs: self.token_leeway_secs,
            min_secret_length: self.min_secret_length,
            ..Default::default()
        }
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.db_url.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_name.clone(),
            username: self.db_user.clone(),
            password: self.db_pass.clone(),
        }
    }
}
