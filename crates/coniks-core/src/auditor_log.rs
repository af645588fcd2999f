//! Auditor log: per-directory-identity STR histories, keyed by the hash of
//! each directory's epoch-0 STR signature.

use crate::auditor::Auditor;
use crate::crypto::Ed25519VerifyingKey;
use crate::errors::{ClientError, ServerErrorCode};
use crate::tree::{directory_identity, SignedTreeRoot};
use crate::wire::{Response, StrHistoryRange};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// A single directory's observed STR history: its name, pinned signing key,
/// and every STR accepted so far, keyed by epoch.
pub struct DirectoryHistory {
    pub name: String,
    pub signing_pub_key: Ed25519VerifyingKey,
    snapshots: BTreeMap<u64, SignedTreeRoot>,
    latest_epoch: u64,
}

impl DirectoryHistory {
    pub fn latest(&self) -> &SignedTreeRoot {
        self.snapshots
            .get(&self.latest_epoch)
            .expect("latest_epoch always present")
    }
}

#[derive(Default)]
pub struct AuditorLog {
    histories: HashMap<[u8; 32], DirectoryHistory>,
}

impl AuditorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new directory's history. `strs[0].epoch` must be 0;
    /// `verify_range` is run starting from that STR. Rejects a re-init of an
    /// already-tracked identity.
    pub fn init_history(
        &mut self,
        name: impl Into<String>,
        signing_pub_key: Ed25519VerifyingKey,
        strs: Vec<SignedTreeRoot>,
    ) -> Result<(), ClientError> {
        let Some(first) = strs.first() else {
            return Err(ClientError::malformed("empty STR history"));
        };
        if first.epoch != 0 {
            return Err(ClientError::malformed("initial history must start at epoch 0"));
        }
        if !first.verify_signature(&signing_pub_key) {
            return Err(ClientError::bad_signature("epoch-0 STR signature invalid"));
        }

        let identity = directory_identity(first)?;
        if self.histories.contains_key(&identity) {
            return Err(ClientError::malformed("directory history already exists"));
        }

        Auditor::verify_range(first, &strs[1..], &signing_pub_key)?;

        let latest_epoch = strs.last().expect("non-empty").epoch;
        let snapshots = strs.into_iter().map(|s| (s.epoch, s)).collect();
        self.histories.insert(
            identity,
            DirectoryHistory {
                name: name.into(),
                signing_pub_key,
                snapshots,
                latest_epoch,
            },
        );
        debug!(identity = hex::encode(identity), "initialized directory history");
        Ok(())
    }

    /// Extend a tracked history by one validated STR.
    pub fn update(&mut self, identity: [u8; 32], new_str: SignedTreeRoot) -> Result<(), ClientError> {
        let history = self
            .histories
            .get_mut(&identity)
            .ok_or_else(|| ClientError::malformed("unknown directory identity"))?;

        let prev = history.latest().clone();
        Auditor::verify_range(&prev, std::slice::from_ref(&new_str), &history.signing_pub_key)?;

        history.latest_epoch = new_str.epoch;
        history.snapshots.insert(new_str.epoch, new_str);
        Ok(())
    }

    /// Serve an observed range as a wire `Response`.
    pub fn get_observed(&self, identity: [u8; 32], start: u64, end: u64) -> Response {
        let Some(history) = self.histories.get(&identity) else {
            return Response::error_only(ServerErrorCode::UnknownDirectory);
        };
        if start > end || end > history.latest_epoch {
            return Response::error_only(ServerErrorCode::MalformedClient);
        }

        let strs: Vec<_> = (start..=end).filter_map(|e| history.snapshots.get(&e).cloned()).collect();
        Response::history(StrHistoryRange { strs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Ed25519SigningKey, VrfPublicKey};
    use crate::tree::Policies;
    use crate::wire::DirectoryResponseBody;

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
    fn init_then_get_observed_round_trip() {
        let signing_key = Ed25519SigningKey::from_bytes([4u8; 32]);
        let strs = chain(5, &signing_key);
        let identity = directory_identity(&strs[0]).unwrap();

        let mut log = AuditorLog::new();
        log.init_history("example", signing_key.verifying_key(), strs.clone()).unwrap();

        let resp = log.get_observed(identity, 1, 3);
        match resp.directory_response.unwrap() {
            DirectoryResponseBody::StrHistoryRange(range) => assert_eq!(range.strs.len(), 3),
            _ => panic!("expected range"),
        }
    }

    #[test]
    fn reinit_same_identity_rejected() {
        let signing_key = Ed25519SigningKey::from_bytes([4u8; 32]);
        let strs = chain(2, &signing_key);
        let mut log = AuditorLog::new();
        log.init_history("example", signing_key.verifying_key(), strs.clone()).unwrap();
        assert!(log.init_history("example", signing_key.verifying_key(), strs).is_err());
    }

    #[test]
    fn update_extends_and_out_of_range_rejected() {
        let signing_key = Ed25519SigningKey::from_bytes([4u8; 32]);
        let strs = chain(3, &signing_key);
        let identity = directory_identity(&strs[0]).unwrap();
        let mut log = AuditorLog::new();
        log.init_history("example", signing_key.verifying_key(), strs.clone()).unwrap();

        let policies = Policies::new(VrfPublicKey([1u8; 32]));
        let next = SignedTreeRoot::next(&strs[2], [9u8; 32], policies, &signing_key);
        log.update(identity, next).unwrap();

        let resp = log.get_observed(identity, 0, 10);
        assert_eq!(resp.error, ServerErrorCode::MalformedClient);
    }

    #[test]
    fn unknown_identity_rejected() {
        let log = AuditorLog::new();
        let resp = log.get_observed([0u8; 32], 0, 0);
        assert_eq!(resp.error, ServerErrorCode::UnknownDirectory);
    }
}
