//! Ed25519 signature types and operations, used for STR signatures and
//! temporary-binding signatures.

use crate::crypto::serde_fixed_bytes;
use crate::errors::CoreError;
use ed25519_dalek::Signer;
use serde::{Deserialize, Serialize};

/// Ed25519 signature wrapper (bytes form for serialization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ed25519Signature(#[serde(with = "serde_fixed_bytes")] pub [u8; 64]);

impl Ed25519Signature {
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        self.0
    }

    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| CoreError::crypto("Ed25519 signature must be exactly 64 bytes"))?;
        Ok(Self(arr))
    }
}

impl From<[u8; 64]> for Ed25519Signature {
    fn from(value: [u8; 64]) -> Self {
        Self(value)
    }
}

impl TryFrom<&[u8]> for Ed25519Signature {
    type Error = CoreError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from_slice(value)
    }
}

/// Ed25519 signing key wrapper.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ed25519SigningKey(pub [u8; 32]);

impl std::fmt::Debug for Ed25519SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Ed25519SigningKey(..)")
    }
}

impl Ed25519SigningKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::crypto("Ed25519 signing key must be exactly 32 bytes"))?;
        Ok(Self(arr))
    }

    /// Generate a fresh random signing key. Fallible only on randomness
    /// exhaustion, the only fatal failure mode in steady-state key generation.
    pub fn generate() -> Result<Self, CoreError> {
        use rand_core::RngCore;
        let mut seed = [0u8; 32];
        rand_core::OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| CoreError::crypto(format!("failed to generate signing key: {e}")))?;
        Ok(Self(seed))
    }

    pub fn verifying_key(&self) -> Ed25519VerifyingKey {
        let key = ed25519_dalek::SigningKey::from_bytes(&self.0);
        Ed25519VerifyingKey(key.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        let key = ed25519_dalek::SigningKey::from_bytes(&self.0);
        let sig = key.sign(message);
        Ed25519Signature(sig.to_bytes())
    }
}

impl TryFrom<&[u8]> for Ed25519SigningKey {
    type Error = CoreError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from_slice(value)
    }
}

/// Ed25519 verifying key wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ed25519VerifyingKey(pub [u8; 32]);

impl Ed25519VerifyingKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CoreError> {
        ed25519_dalek::VerifyingKey::from_bytes(&bytes)
            .map(|_| Ed25519VerifyingKey(bytes))
            .map_err(|e| CoreError::crypto(e.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::crypto("invalid public key length"))?;
        Self::from_bytes(arr)
    }

    /// Convenience verification helper, used to check STR and TB signatures.
    pub fn verify(&self, message: &[u8], signature: &Ed25519Signature) -> bool {
        ed25519_verify(message, signature, self)
    }
}

/// Verify an Ed25519 signature using dalek's strict verification.
pub fn ed25519_verify(
    message: &[u8],
    signature: &Ed25519Signature,
    public_key: &Ed25519VerifyingKey,
) -> bool {
    let Ok(pk) = ed25519_dalek::VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    pk.verify_strict(message, &sig).is_ok()
}

/// Derive a verifying key from signing key bytes.
pub fn ed25519_verifying_key(signing_key: &Ed25519SigningKey) -> Ed25519VerifyingKey {
    signing_key.verifying_key()
}
