//! Salted one-way digests for passwords and per-account secret words.
//!
//! The digest is SHA-1 hex over `"{salt}--{value}--"`, which keeps stored
//! hashes compatible with existing account rows.

use crate::config::AuthConfig;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Computes the salted hex digest of `value`.
pub fn salted_digest(salt: &str, value: &str) -> String {
    sha1_smol::Sha1::from(format!("{salt}--{value}--"))
        .digest()
        .to_string()
}

/// Whether a save must replace the stored digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordDecision {
    /// Hash the staged plaintext and rotate the secret word.
    Rehash,
    /// Leave the stored digest untouched.
    Keep,
}

/// Decides at the persistence boundary whether to hash a staged password.
///
/// Only a staged plaintext that equals its confirmation is hashed; a record
/// loaded from the store has nothing staged, so its digest is never hashed
/// a second time.
pub fn password_decision(staged: Option<&str>, confirmation: Option<&str>) -> PasswordDecision {
    match (staged, confirmation) {
        (Some(staged), Some(confirmation)) if staged == confirmation => PasswordDecision::Rehash,
        _ => PasswordDecision::Keep,
    }
}

/// Salted hasher bound to one configuration.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    salt: String,
}

impl PasswordHasher {
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.salt())
    }

    pub fn hash(&self, value: &str) -> String {
        salted_digest(&self.salt, value)
    }

    /// Compares the digest of `plaintext` with `stored` byte for byte.
    pub fn verify(&self, plaintext: &str, stored: &str) -> bool {
        self.hash(plaintext).as_bytes() == stored.as_bytes()
    }

    /// Generates a fresh opaque token for `login`.
    pub fn secret_word(&self, login: &str, now: DateTime<Utc>) -> String {
        self.hash(&format!(
            "{login}{}{}",
            now.timestamp(),
            Uuid::new_v4().simple()
        ))
    }
}
