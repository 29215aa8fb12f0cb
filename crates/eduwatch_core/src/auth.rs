//! Password digest boundary.
//!
//! # Responsibility
//! - Turn clear-text passwords into opaque comparable digests.
//!
//! # Invariants
//! - Clear-text passwords never reach storage or logs.
//! - Digest comparison does not short-circuit on the first differing byte.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub trait PasswordHasher {
    /// Returns the digest stored for `password`.
    fn hash(&self, password: &str) -> String;

    /// Returns whether `password` matches a stored `digest`.
    fn verify(&self, password: &str, digest: &str) -> bool {
        self.hash(password)
            .as_bytes()
            .ct_eq(digest.as_bytes())
            .into()
    }
}

/// Unsalted SHA-256, hex encoded.
///
/// Matches digests already present in deployed stores and the seed accounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256PasswordHasher;

impl PasswordHasher for Sha256PasswordHasher {
    fn hash(&self, password: &str) -> String {
        hex::encode(Sha256::digest(password.as_bytes()))
    }
}
