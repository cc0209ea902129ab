//! Account and token persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepositoryResult;
use crate::api::UserId;
use crate::models::{ApiToken, NewUser, User};

/// Repository trait for users and their bearer tokens.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait UserRepository: Send + Sync {
    // ==================== Health & Connection ====================

    /// Check if the backing store is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if connection is healthy
    /// - `Ok(false)` if connection is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if an error occurred during the check
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Users ====================

    /// Persist a new user.
    ///
    /// # Returns
    /// * `Ok(User)` - The stored user with its assigned ID
    /// * `Err(RepositoryError::Conflict)` - If the email is already registered
    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User>;

    /// Fetch a user by ID.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the user doesn't exist
    async fn get_user(&self, user_id: UserId) -> RepositoryResult<User>;

    /// Look a user up by email, ignoring case.
    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    // ==================== Tokens ====================

    /// Store the digest of a freshly issued bearer token.
    async fn store_token(
        &self,
        user_id: UserId,
        token_hash: &str,
        created_at: DateTime<Utc>,
    ) -> RepositoryResult<ApiToken>;

    /// Resolve a token digest to its owner and record the use.
    ///
    /// # Returns
    /// * `Ok(None)` - If no token has this digest
    async fn find_user_by_token(
        &self,
        token_hash: &str,
        used_at: DateTime<Utc>,
    ) -> RepositoryResult<Option<User>>;
}
