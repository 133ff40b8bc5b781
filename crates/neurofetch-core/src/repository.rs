//! Repository trait definitions for data access abstraction.

use uuid::Uuid;

use crate::error::NeurofetchResult;
use crate::models::user::{CreateUser, User};

/// Credential store holding user records and verifying secrets.
///
/// Implementations own email uniqueness: `create` must fail with
/// [`NeurofetchError::AlreadyExists`](crate::error::NeurofetchError::AlreadyExists)
/// for a taken email even when two signups race.
pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = NeurofetchResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = NeurofetchResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = NeurofetchResult<User>> + Send;
    /// Compare `secret` against the user's stored hash.
    fn verify_secret(
        &self,
        user: &User,
        secret: &str,
    ) -> impl Future<Output = NeurofetchResult<bool>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = NeurofetchResult<()>> + Send;
}
