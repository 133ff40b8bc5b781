//! Shared application state.

use std::sync::Arc;

use neurofetch_auth::{AuthConfig, AuthService};
use neurofetch_db::repository::SurrealUserRepository;
use neurofetch_db::{DbConfig, DbManager};
use surrealdb::engine::any::Any;
use tracing::info;

use crate::error::StartupError;

/// The gateway wired to the SurrealDB credential store.
pub type Gateway = AuthService<SurrealUserRepository<Any>>;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Gateway>,
}

impl AppState {
    /// Connect the credential store and build the gateway.
    pub async fn build(
        db_config: &DbConfig,
        auth_config: AuthConfig,
        pepper: Option<String>,
    ) -> Result<Self, StartupError> {
        let manager = DbManager::connect(db_config).await?;
        let db = manager.client().clone();

        let repo = match pepper {
            Some(p) => SurrealUserRepository::with_pepper(db, p),
            None => SurrealUserRepository::new(db),
        };

        let auth = AuthService::new(repo, auth_config)?;
        info!("authentication gateway ready");

        Ok(Self {
            auth: Arc::new(auth),
        })
    }
}
