//! SurrealDB implementation of [`UserRepository`].

use chrono::{DateTime, Utc};
use neurofetch_core::error::NeurofetchResult;
use neurofetch_core::models::user::{CreateUser, User};
use neurofetch_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;
use crate::password;
use crate::schema::USER_EMAIL_INDEX;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    email: String,
    secret_hash: String,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    email: String,
    secret_hash: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> User {
        User {
            id,
            email: self.email,
            secret_hash: self.secret_hash,
            created_at: self.created_at,
        }
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        Ok(User {
            id,
            email: self.email,
            secret_hash: self.secret_hash,
            created_at: self.created_at,
        })
    }
}

/// Attempts per insert when the engine reports a write conflict.
const CREATE_ATTEMPTS: usize = 3;

fn is_unique_violation(message: &str) -> bool {
    message.contains(USER_EMAIL_INDEX) || message.contains("already contains")
}

fn is_write_conflict(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("conflict") || lower.contains("can be retried")
}

/// SurrealDB implementation of the credential store.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for secret hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> NeurofetchResult<User> {
        let secret_hash = password::hash_secret(&input.secret, self.pepper.as_deref())?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let id = Uuid::new_v4();
            let id_str = id.to_string();

            let result = self
                .db
                .query(
                    "CREATE type::record('user', $id) SET \
                     email = $email, secret_hash = $secret_hash",
                )
                .bind(("id", id_str.clone()))
                .bind(("email", input.email.clone()))
                .bind(("secret_hash", secret_hash.clone()))
                .await
                .map_err(DbError::from)?;

            let mut result = match result.check() {
                Ok(result) => result,
                Err(e) => {
                    let message = e.to_string();
                    if is_unique_violation(&message) {
                        return Err(DbError::Duplicate {
                            entity: "user".into(),
                        }
                        .into());
                    }
                    if is_write_conflict(&message) {
                        // A racing insert may have committed the same email.
                        if self.get_by_email(&input.email).await.is_ok() {
                            return Err(DbError::Duplicate {
                                entity: "user".into(),
                            }
                            .into());
                        }
                        if attempt < CREATE_ATTEMPTS {
                            debug!(attempt, "retrying user insert after write conflict");
                            continue;
                        }
                    }
                    return Err(DbError::Query(message).into());
                }
            };

            let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
            let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
                entity: "user".into(),
                id: id_str,
            })?;

            debug!(user_id = %id, "user created");
            return Ok(row.into_user(id));
        }
    }

    async fn get_by_id(&self, id: Uuid) -> NeurofetchResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id))
    }

    async fn get_by_email(&self, email: &str) -> NeurofetchResult<User> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM user WHERE email = $email")
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn verify_secret(&self, user: &User, secret: &str) -> NeurofetchResult<bool> {
        Ok(password::verify_secret(
            secret,
            &user.secret_hash,
            self.pepper.as_deref(),
        )?)
    }

    async fn delete(&self, id: Uuid) -> NeurofetchResult<()> {
        self.db
            .query("DELETE type::record('user', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        debug!(user_id = %id, "user deleted");
        Ok(())
    }
}
