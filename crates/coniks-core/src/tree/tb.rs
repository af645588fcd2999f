//! Temporary Binding: a signed one-epoch promise that a pending registration
//! will appear in the next STR.
//!
//! `signature` is over `prev_str.signature || index || value`. A TB issued
//! while the latest sealed STR is at epoch `e` is valid only for
//! `issued_epoch = e + 1`; it must be honoured by the snapshot published at
//! that epoch.

use crate::crypto::{Ed25519Signature, Ed25519SigningKey, Ed25519VerifyingKey, Index};
use crate::tree::str::SignedTreeRoot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryBinding {
    pub index: Index,
    pub value: Vec<u8>,
    pub issued_epoch: u64,
    pub signature: Ed25519Signature,
}

fn signing_bytes(prev_str_signature: &[u8], index: &Index, value: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(64 + 32 + value.len());
    bytes.extend_from_slice(prev_str_signature);
    bytes.extend_from_slice(index.as_bytes());
    bytes.extend_from_slice(value);
    bytes
}

impl TemporaryBinding {
    /// Issue a TB against `prev_str`, valid for `prev_str.epoch + 1`.
    pub fn issue(
        prev_str: &SignedTreeRoot,
        index: Index,
        value: Vec<u8>,
        signing_key: &Ed25519SigningKey,
    ) -> Self {
        let signature = signing_key.sign(&signing_bytes(prev_str.signature.as_bytes(), &index, &value));
        Self {
            index,
            value,
            issued_epoch: prev_str.epoch + 1,
            signature,
        }
    }

    /// A TB is only honoured by the snapshot published at `issued_epoch`.
    pub fn valid_for_epoch(&self, epoch: u64) -> bool {
        self.issued_epoch == epoch
    }

    /// Verify the TB's signature against the STR it was issued over.
    pub fn verify_signature(&self, prev_str: &SignedTreeRoot, verifying_key: &Ed25519VerifyingKey) -> bool {
        let bytes = signing_bytes(prev_str.signature.as_bytes(), &self.index, &self.value);
        verifying_key.verify(&bytes, &self.signature)
    }
}
