//! Pure synchronous hash trait for commitments, STR hashing, and TB state
//!
//! The trait design allows swapping hash algorithms while maintaining a single
//! source of truth for which algorithm is used throughout the codebase. `H`
//! in the data-model formulas (commitment hashing, `previous_str_hash = H(prev.signature)`)
//! is the [`hash`] function below.
//!
//! # Algorithm selection
//!
//! The hash algorithm is selected once at compile time via the `ALGORITHM`
//! constant. To change algorithms, implement [`HashAlgorithm`] for the new
//! type and repoint `ALGORITHM`; every call site using [`hash`]/[`hasher`]
//! picks it up without further changes.
//!
//! Current algorithm: **SHA-256** (256-bit / 32-byte output).

#![allow(clippy::disallowed_types, clippy::disallowed_methods)]

use sha2::{Digest, Sha256};
use std::fmt;

/// Synchronous trait for cryptographic hashing.
pub trait HashAlgorithm: Send + Sync + fmt::Debug {
    /// Hash arbitrary bytes to a 32-byte digest.
    fn hash(&self, data: &[u8]) -> [u8; 32];

    /// Create an incremental hasher for multi-part hashing.
    fn hasher(&self) -> Box<dyn Hasher>;
}

/// Trait for incremental hashing of multi-part data.
pub trait Hasher: Send {
    /// Update the hasher with more data.
    fn update(&mut self, data: &[u8]);

    /// Finalize the hasher and return the 32-byte digest. Consumes the
    /// hasher.
    fn finalize(self: Box<Self>) -> [u8; 32];
}

/// SHA-256 hash implementation (NIST FIPS 180-4).
#[derive(Debug, Clone, Copy)]
pub struct Sha256Algorithm;

impl HashAlgorithm for Sha256Algorithm {
    fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        let mut output = [0u8; 32];
        output.copy_from_slice(&result);
        output
    }

    fn hasher(&self) -> Box<dyn Hasher> {
        Box::new(Sha256Hasher(Sha256::new()))
    }
}

struct Sha256Hasher(Sha256);

impl Hasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> [u8; 32] {
        let result = self.0.finalize();
        let mut output = [0u8; 32];
        output.copy_from_slice(&result);
        output
    }
}

/// The global hash algorithm used throughout the system. Single source of
/// truth for which digest backs commitments, STR hashing, and TB state.
pub const ALGORITHM: Sha256Algorithm = Sha256Algorithm;

/// Hash using the global algorithm. Equivalent to `ALGORITHM.hash(data)`.
#[inline]
pub fn hash(data: &[u8]) -> [u8; 32] {
    ALGORITHM.hash(data)
}

/// Create an incremental hasher using the global algorithm.
#[inline]
pub fn hasher() -> Box<dyn Hasher> {
    ALGORITHM.hasher()
}
