//! Auditor core: a pinned directory signing key and the last-verified STR
//! Verifies ranges of STRs by hash-chain continuity and
//! signature, advancing `verified_str` only over validated STRs.

use crate::crypto::Ed25519VerifyingKey;
use crate::errors::ClientError;
use crate::tree::{verify_hash_chain, SignedTreeRoot};
use tracing::{debug, warn};

pub struct Auditor {
    signing_pub_key: Ed25519VerifyingKey,
    verified_str: SignedTreeRoot,
}

impl Auditor {
    pub fn new(signing_pub_key: Ed25519VerifyingKey, verified_str: SignedTreeRoot) -> Self {
        Self {
            signing_pub_key,
            verified_str,
        }
    }

    pub fn verified_str(&self) -> &SignedTreeRoot {
        &self.verified_str
    }

    pub fn signing_pub_key(&self) -> &Ed25519VerifyingKey {
        &self.signing_pub_key
    }

    /// Check `str` against the currently pinned STR: bit-for-bit equality if
    /// it claims the same epoch, hash-chain plus signature if it claims the
    /// next epoch, `bad_str` otherwise (covers reordered/stale responses per
    /// the open-question default).
    pub fn check_against_verified(&self, str: &SignedTreeRoot) -> Result<(), ClientError> {
        if str.epoch == self.verified_str.epoch {
            if str == &self.verified_str {
                return Ok(());
            }
            warn!(epoch = str.epoch, "equivocating STR for already-verified epoch");
            return Err(ClientError::bad_str("equivocation: differing STR at verified epoch"));
        }

        if str.epoch == self.verified_str.epoch + 1 {
            if !verify_hash_chain(&self.verified_str, str) {
                return Err(ClientError::bad_str("hash chain broken"));
            }
            if !str.verify_signature(&self.signing_pub_key) {
                return Err(ClientError::bad_signature("STR signature invalid"));
            }
            return Ok(());
        }

        Err(ClientError::bad_str(format!(
            "unexpected epoch {} relative to verified epoch {}",
            str.epoch, self.verified_str.epoch
        )))
    }

    /// Successive hash-chain and signature checks over `strs`, chained from
    /// `prev`. Used both by `audit_directory` and by the auditor log.
    pub fn verify_range(prev: &SignedTreeRoot, strs: &[SignedTreeRoot], signing_pub_key: &Ed25519VerifyingKey) -> Result<(), ClientError> {
        let mut cursor = prev;
        for str in strs {
            if !verify_hash_chain(cursor, str) {
                return Err(ClientError::bad_str(format!(
                    "hash chain broken at epoch {}",
                    str.epoch
                )));
            }
            if !str.verify_signature(signing_pub_key) {
                return Err(ClientError::bad_signature(format!(
                    "invalid signature at epoch {}",
                    str.epoch
                )));
            }
            cursor = str;
        }
        Ok(())
    }

    /// Validate a single STR against the pinned state and, if it is exactly
    /// the next epoch, advance `verified_str` to it. Used by the consistency
    /// checker when a response carries one STR rather than a range.
    pub fn observe(&mut self, str: &SignedTreeRoot) -> Result<(), ClientError> {
        self.check_against_verified(str)?;
        if str.epoch == self.verified_str.epoch + 1 {
            self.verified_str = str.clone();
        }
        Ok(())
    }

    /// `check_against_verified(strs[0])` then `verify_range(strs[0], strs[1..])`,
    /// advancing `verified_str` to the last validated entry.
    pub fn audit_directory(&mut self, strs: &[SignedTreeRoot]) -> Result<(), ClientError> {
        let Some(first) = strs.first() else {
            return Err(ClientError::malformed("empty STR range"));
        };
        self.check_against_verified(first)?;
        Self::verify_range(first, &strs[1..], &self.signing_pub_key)?;

        let last = strs.last().expect("non-empty").clone();
        debug!(epoch = last.epoch, "auditor advanced verified STR");
        self.verified_str = last;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Ed25519SigningKey, VrfPublicKey};
    use crate::tree::Policies;

    fn chain(len: usize, signing_key: &Ed25519SigningKey) -> Vec<SignedTreeRoot> {
        let policies = Policies::new(VrfPublicKey([1u8; 32]));
        let mut strs = vec![SignedTreeRoot::initial([0u8; 32], policies, signing_key)];
        for i in 1..len {
            let prev = strs.last().unwrap();
            strs.push(SignedTreeRoot::next(prev, [i as u8; 32], policies, signing_key));
        }
        strs
    }

    #[test]
    fn audit_directory_advances_verified_str() {
        let signing_key = Ed25519SigningKey::from_bytes([8u8; 32]);
        let strs = chain(5, &signing_key);
        let mut auditor = Auditor::new(signing_key.verifying_key(), strs[0].clone());
        auditor.audit_directory(&strs[1..]).unwrap();
        assert_eq!(auditor.verified_str().epoch, 4);
    }

    #[test]
    fn equivocating_str_at_verified_epoch_rejected() {
        let signing_key = Ed25519SigningKey::from_bytes([8u8; 32]);
        let strs = chain(2, &signing_key);
        let auditor = Auditor::new(signing_key.verifying_key(), strs[0].clone());

        let policies = Policies::new(VrfPublicKey([1u8; 32]));
        let forked = SignedTreeRoot::initial([99u8; 32], policies, &signing_key);
        assert!(matches!(
            auditor.check_against_verified(&forked),
            Err(ClientError::BadStr { .. })
        ));
    }

    #[test]
    fn tampered_signature_detected_in_range() {
        let signing_key = Ed25519SigningKey::from_bytes([8u8; 32]);
        let mut strs = chain(6, &signing_key);
        strs[5].signature.0[0] ^= 1;
        let mut auditor = Auditor::new(signing_key.verifying_key(), strs[0].clone());
        let err = auditor.audit_directory(&strs[1..]).unwrap_err();
        assert!(matches!(err, ClientError::BadSignature { .. }));
    }

    #[test]
    fn wrong_epoch_jump_rejected() {
        let signing_key = Ed25519SigningKey::from_bytes([8u8; 32]);
        let strs = chain(3, &signing_key);
        let auditor = Auditor::new(signing_key.verifying_key(), strs[0].clone());
        let err = auditor.check_against_verified(&strs[2]).unwrap_err();
        assert!(matches!(err, ClientError::BadStr { .. }));
    }
}
