//! Client consistency checker: verifies directory proofs, tracks outstanding
//! temporary bindings, and detects broken promises and equivocation
//!

use crate::auditor::Auditor;
use crate::errors::{ClientError, ClientResult};
use crate::tree::{branch_hash, empty_hash, leaf_hash, AuthenticationPath, SignedTreeRoot, TemporaryBinding};
use crate::wire::{DirectoryResponseBody, Response, StrHistoryRange};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Register,
    KeyLookup,
}

pub struct ConsistencyChecker {
    auditor: Auditor,
    bindings: HashMap<String, Vec<u8>>,
    tbs: HashMap<String, TemporaryBinding>,
}

impl ConsistencyChecker {
    pub fn new(auditor: Auditor) -> Self {
        Self {
            auditor,
            bindings: HashMap::new(),
            tbs: HashMap::new(),
        }
    }

    pub fn binding(&self, username: &str) -> Option<&[u8]> {
        self.bindings.get(username).map(Vec::as_slice)
    }

    pub fn outstanding_tb(&self, username: &str) -> Option<&TemporaryBinding> {
        self.tbs.get(username)
    }

    pub fn verified_str(&self) -> &SignedTreeRoot {
        self.auditor.verified_str()
    }

    /// Validate a register or key-lookup response: shape, STR chain, the
    /// (code, proof-type) pair, the authentication path, and the TB state
    /// machine, then record the verified binding.
    pub fn handle_response(
        &mut self,
        kind: RequestKind,
        response: &Response,
        username: &str,
        key: Option<&[u8]>,
    ) -> ClientResult<()> {
        let proof = match &response.directory_response {
            Some(DirectoryResponseBody::DirectoryProof(proof))
                if proof.aps.len() == 1 && proof.strs.len() == 1 =>
            {
                proof
            }
            _ => return Err(ClientError::malformed("expected a single-AP directory proof")),
        };
        let ap = &proof.aps[0];
        let str = &proof.strs[0];

        self.auditor.observe(str)?;

        let is_inclusion = ap.is_inclusion();
        validate_shape(kind, response.error, is_inclusion, proof.tb.is_some())?;

        let value = self.verify_authentication_path(ap, str, username, key, proof.tb.as_ref())?;

        self.update_tb_state(kind, is_inclusion, username, str, ap, proof.tb.as_ref())?;

        self.bindings.insert(username.to_string(), value);
        Ok(())
    }

    fn verify_authentication_path(
        &self,
        ap: &AuthenticationPath,
        str: &SignedTreeRoot,
        username: &str,
        key: Option<&[u8]>,
        tb: Option<&TemporaryBinding>,
    ) -> ClientResult<Vec<u8>> {
        if !str.policies.vrf_public_key.verify(username, &ap.lookup_index, &ap.vrf_proof) {
            return Err(ClientError::BadVrfProof {
                username: username.to_string(),
            });
        }

        if ap.leaf.index.shared_prefix_len(&ap.lookup_index) < ap.leaf.level as usize {
            return Err(ClientError::BadLookupIndex);
        }

        let candidate = if ap.is_inclusion() {
            Some(ap.leaf.value.clone())
        } else {
            tb.map(|tb| tb.value.clone())
        };

        let value = match (key, candidate) {
            (Some(supplied), Some(found)) if supplied == found.as_slice() => found,
            (Some(_), Some(_)) => {
                return Err(ClientError::BindingsDiffer {
                    username: username.to_string(),
                });
            }
            (Some(supplied), None) => supplied.to_vec(),
            (None, Some(found)) => found, // TOFU
            (None, None) => Vec::new(),
        };

        if ap.is_inclusion() && !ap.leaf.commitment.verify(username, &value) {
            return Err(ClientError::BadCommitment);
        }

        if recompute_root(ap) != str.tree_hash {
            return Err(ClientError::BadAuthPath);
        }

        Ok(value)
    }

    fn update_tb_state(
        &mut self,
        kind: RequestKind,
        is_inclusion: bool,
        username: &str,
        str: &SignedTreeRoot,
        ap: &AuthenticationPath,
        tb: Option<&TemporaryBinding>,
    ) -> ClientResult<()> {
        match kind {
            RequestKind::Register => {
                if let Some(tb) = tb {
                    self.verify_tb_validity(tb, str, ap)?;
                    self.tbs.insert(username.to_string(), tb.clone());
                }
            }
            RequestKind::KeyLookup => {
                if is_inclusion {
                    if let Some(outstanding) = self.tbs.get(username) {
                        if ap.lookup_index != outstanding.index || ap.leaf.value != outstanding.value {
                            warn!(username, "promised binding not honoured");
                            return Err(ClientError::BrokenPromise {
                                username: username.to_string(),
                            });
                        }
                    }
                    self.tbs.remove(username);
                } else if let Some(tb) = tb {
                    self.verify_tb_validity(tb, str, ap)?;
                    self.tbs.insert(username.to_string(), tb.clone());
                } else if let Some(outstanding) = self.tbs.get(username) {
                    if outstanding.issued_epoch <= str.epoch {
                        warn!(username, "promised binding not honoured");
                        return Err(ClientError::BrokenPromise {
                            username: username.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// `tb.signature` verifies over `str.signature || tb.index || tb.value`
    /// under the pinned directory signing key, and `tb.index == ap.lookup_index`.
    fn verify_tb_validity(&self, tb: &TemporaryBinding, str: &SignedTreeRoot, ap: &AuthenticationPath) -> ClientResult<()> {
        if tb.index != ap.lookup_index {
            return Err(ClientError::bad_promise("TB index does not match authentication path"));
        }
        if !tb.verify_signature(str, self.auditor.signing_pub_key()) {
            return Err(ClientError::bad_promise("TB signature invalid"));
        }
        Ok(())
    }

    /// Verify a supplied STR-history range internally, then compare its
    /// latest STR against the currently verified STR. Any mismatch signals
    /// server equivocation.
    pub fn check_equivocation(&mut self, range: &StrHistoryRange) -> ClientResult<()> {
        let Some(first) = range.strs.first() else {
            return Err(ClientError::malformed("empty STR range"));
        };
        Auditor::verify_range(first, &range.strs[1..], self.auditor.signing_pub_key())?;
        let last = range.strs.last().expect("non-empty");
        self.auditor.check_against_verified(last)?;
        debug!(epoch = last.epoch, "equivocation check passed");
        Ok(())
    }
}

fn recompute_root(ap: &AuthenticationPath) -> [u8; 32] {
    let mut computed = if ap.leaf.empty {
        empty_hash(&ap.tree_nonce, ap.leaf.level, &ap.leaf.index)
    } else {
        leaf_hash(&ap.leaf.index, ap.leaf.level, &ap.leaf.commitment)
    };
    for (level, sibling) in ap.pruned_siblings.iter().enumerate().rev() {
        let bit = ap.lookup_index.bit(level);
        computed = if bit {
            branch_hash(level as u16, sibling, &computed)
        } else {
            branch_hash(level as u16, &computed, sibling)
        };
    }
    computed
}

fn validate_shape(kind: RequestKind, error: crate::errors::ServerErrorCode, is_inclusion: bool, has_tb: bool) -> ClientResult<()> {
    use crate::errors::ServerErrorCode::*;
    let ok = match (kind, error) {
        (RequestKind::Register, Success) => !is_inclusion && has_tb,
        (RequestKind::Register, NameExisted) => is_inclusion || has_tb,
        (RequestKind::KeyLookup, NameNotFound) => !is_inclusion,
        (RequestKind::KeyLookup, Success) => is_inclusion || has_tb,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(ClientError::malformed(format!(
            "unexpected (code, proof-type) pair {error:?}/inclusion={is_inclusion} for {kind:?}"
        )))
    }
}
