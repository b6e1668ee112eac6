//! Salted SHA-256 password hashing and verification.
//!
//! The digest format is `sha256$` + salt + hex(digest): it self-describes
//! its algorithm so a future migration to another scheme is detectable by
//! prefix. The salt is the process-wide secret, so rotating the secret
//! invalidates every stored digest at once. The stored digest string also
//! feeds the bearer-token digest, which is what makes a password change
//! revoke every outstanding token.

use sha2::{Digest, Sha256};

/// Handles password digest creation and verification.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    secret: String,
}

impl PasswordHasher {
    /// Creates a hasher salting with the given process-wide secret.
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
        }
    }

    /// Hashes a raw password into the self-describing digest format.
    pub fn hash_password(&self, raw: &str) -> String {
        let digest = Sha256::digest(format!("{}{}", self.secret, raw).as_bytes());
        format!("sha256${}{}", self.secret, hex::encode(digest))
    }

    /// Verifies a raw password against a stored digest by recomputing.
    pub fn verify_password(&self, stored: &str, raw: &str) -> bool {
        stored == self.hash_password(raw)
    }
}
