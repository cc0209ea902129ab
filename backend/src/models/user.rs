//! Account records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{TokenId, UserId};

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Argon2id PHC string. Never leaves the server.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Fields required to persist a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    /// Stored lowercased; lookups are case-insensitive.
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// An issued bearer token. Only the SHA-256 digest of the secret is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiToken {
    pub id: TokenId,
    pub user_id: UserId,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Registration payload as received from the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login payload as received from the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginDraft {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A user together with the plaintext token that was just issued for them.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub user: User,
    pub token: String,
}
