//! Signed Tree Root: the epoch-anchored, signed commitment to a directory
//! snapshot.
//!
//! `signature` covers the full serialization of the STR body (policies
//! included) minus the signature itself:
//! `epoch || previous_epoch || tree_hash || previous_str_hash || policies.serialize()`,
//! numeric fields little-endian 64-bit.

use crate::crypto::{hash, Ed25519Signature, Ed25519SigningKey, Ed25519VerifyingKey};
use crate::errors::ClientError;
use crate::tree::policy::Policies;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTreeRoot {
    pub epoch: u64,
    pub previous_epoch: u64,
    pub tree_hash: [u8; 32],
    pub previous_str_hash: [u8; 32],
    pub policies: Policies,
    pub signature: Ed25519Signature,
}

impl SignedTreeRoot {
    /// Serialize the signed body, in the fixed field order the signature
    /// covers.
    pub fn serialize_body(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8 + 8 + 32 + 32 + 56);
        bytes.extend_from_slice(&self.epoch.to_le_bytes());
        bytes.extend_from_slice(&self.previous_epoch.to_le_bytes());
        bytes.extend_from_slice(&self.tree_hash);
        bytes.extend_from_slice(&self.previous_str_hash);
        bytes.extend_from_slice(&self.policies.serialize());
        bytes
    }

    /// Construct and sign the epoch-0 STR. By convention `previous_str_hash
    /// = H(empty)` and `previous_epoch = 0`.
    pub fn initial(tree_hash: [u8; 32], policies: Policies, signing_key: &Ed25519SigningKey) -> Self {
        let mut str0 = Self {
            epoch: 0,
            previous_epoch: 0,
            tree_hash,
            previous_str_hash: hash::hash(b""),
            policies,
            signature: Ed25519Signature::from_bytes([0u8; 64]),
        };
        str0.signature = signing_key.sign(&str0.serialize_body());
        str0
    }

    /// Construct and sign the STR for `prev.epoch + 1`.
    pub fn next(prev: &SignedTreeRoot, tree_hash: [u8; 32], policies: Policies, signing_key: &Ed25519SigningKey) -> Self {
        let mut next = Self {
            epoch: prev.epoch + 1,
            previous_epoch: prev.epoch,
            tree_hash,
            previous_str_hash: hash::hash(prev.signature.as_bytes()),
            policies,
            signature: Ed25519Signature::from_bytes([0u8; 64]),
        };
        next.signature = signing_key.sign(&next.serialize_body());
        next
    }

    /// Verify this STR's signature under `verifying_key`.
    pub fn verify_signature(&self, verifying_key: &Ed25519VerifyingKey) -> bool {
        verifying_key.verify(&self.serialize_body(), &self.signature)
    }
}

/// `cur.previous_epoch == prev.epoch && cur.epoch == prev.epoch + 1 &&
/// cur.previous_str_hash == H(prev.signature)`.
pub fn verify_hash_chain(prev: &SignedTreeRoot, cur: &SignedTreeRoot) -> bool {
    cur.previous_epoch == prev.epoch
        && cur.epoch == prev.epoch + 1
        && cur.previous_str_hash == hash::hash(prev.signature.as_bytes())
}

/// Hash of the epoch-0 STR's signature; a stable identifier for a directory
/// history. Only defined for the initial STR.
pub fn directory_identity(str0: &SignedTreeRoot) -> Result<[u8; 32], ClientError> {
    if str0.epoch != 0 {
        return Err(ClientError::bad_str(
            "directory identity requires the epoch-0 STR",
        ));
    }
    Ok(hash::hash(str0.signature.as_bytes()))
}
