//! Argon2id password hashing.

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Hash `password` into a self-describing PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check `password` against a stored PHC string.
///
/// A wrong password is `Ok(false)`; only an unreadable hash is an error.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let parsed =
        PasswordHash::new(stored).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Verify `password` against a placeholder hash and report no match.
///
/// Logins for unknown emails go through here so they cost the same Argon2 work as
/// logins for real accounts.
pub fn verify_without_account(password: &str) -> Result<bool, PasswordError> {
    static PLACEHOLDER: OnceLock<String> = OnceLock::new();
    let stored = match PLACEHOLDER.get() {
        Some(hash) => hash,
        None => {
            let hash = hash_password(&crate::auth::generate_token())?;
            PLACEHOLDER.get_or_init(|| hash)
        }
    };
    verify_password(password, stored)?;
    Ok(false)
}
