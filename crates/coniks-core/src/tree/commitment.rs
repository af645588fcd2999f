//! Leaf commitments: `(salt, value_hash)` binding a username/key pair
//! without revealing either.
//!
//! # Format
//!
//! ```text
//! value_hash = H(salt || username || key)
//! ```
//!
//! `salt` is a fresh random of hash width, generated once at insertion time.
//! Verification recomputes `value_hash` from the claimed `(username, key)`
//! and compares.

use crate::crypto::hash;
use crate::errors::CoreError;
use serde::{Deserialize, Serialize};

/// Salted commitment to `(username, key)`, stored at a tree leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub salt: [u8; 32],
    pub value_hash: [u8; 32],
}

impl Commitment {
    /// Commit to `(username, key)` using a caller-supplied salt. Used when
    /// the salt must be deterministic (e.g. replaying a fixture in tests).
    pub fn with_salt(salt: [u8; 32], username: &str, key: &[u8]) -> Self {
        Self {
            salt,
            value_hash: commit_value(&salt, username, key),
        }
    }

    /// Commit to `(username, key)` with a fresh random salt, as performed on
    /// every insertion (`set`).
    pub fn new_random(username: &str, key: &[u8]) -> Result<Self, CoreError> {
        use rand_core::RngCore;
        let mut salt = [0u8; 32];
        rand_core::OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| CoreError::crypto(format!("failed to generate commitment salt: {e}")))?;
        Ok(Self::with_salt(salt, username, key))
    }

    /// Verify this commitment opens to `(username, key)`.
    pub fn verify(&self, username: &str, key: &[u8]) -> bool {
        self.value_hash == commit_value(&self.salt, username, key)
    }
}

fn commit_value(salt: &[u8; 32], username: &str, key: &[u8]) -> [u8; 32] {
    let mut h = hash::hasher();
    h.update(salt);
    h.update(username.as_bytes());
    h.update(key);
    h.finalize()
}
