//! Credential primitives: password hashing and bearer-token digests.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password, verify_without_account, PasswordError};
pub use token::{generate_token, token_digest};
