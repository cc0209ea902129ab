//! Bearer tokens.
//!
//! Clients hold the plaintext secret; the store only ever sees its SHA-256 digest.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Generate a fresh 64-character hex secret.
pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Calculate the SHA-256 digest of a token secret.
///
/// # Returns
/// Hexadecimal string representation of the hash.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_consistency() {
        let token = "0123456789abcdef";
        assert_eq!(token_digest(token), token_digest(token));
        assert_eq!(token_digest(token).len(), 64);
    }

    #[test]
    fn test_different_tokens_different_digests() {
        assert_ne!(token_digest("token-a"), token_digest("token-b"));
    }

    #[test]
    fn test_generated_tokens_are_unique_hex() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
