//! Persistent Authenticated Directory: the current mutable APT, the bounded
//! history of sealed snapshots, and the signing/VRF key material.

use crate::crypto::{Ed25519SigningKey, Index, VrfSigningKey};
use crate::errors::CoreError;
use crate::tree::{Apt, Policies, SignedTreeRoot, TemporaryBinding};
use std::collections::VecDeque;

/// An immutable APT plus the STR that commits to it.
#[derive(Clone)]
pub struct Snapshot {
    pub str: SignedTreeRoot,
    pub apt: Apt,
}

/// Holds the current mutable APT, the sequence of past snapshots (bounded by
/// `loaded_history_length`), the signing and VRF private keys, and the
/// current policy.
pub struct Pad {
    mutable_apt: Apt,
    snapshots: VecDeque<Snapshot>,
    signing_key: Ed25519SigningKey,
    vrf_key: VrfSigningKey,
    policies: Policies,
    pending_policies: Option<Policies>,
    loaded_history_length: usize,
}

impl Pad {
    /// Initialize a fresh directory: an empty APT sealed as the epoch-0
    /// snapshot.
    pub fn new(
        signing_key: Ed25519SigningKey,
        vrf_key: VrfSigningKey,
        policies: Policies,
        loaded_history_length: usize,
    ) -> Result<Self, CoreError> {
        use rand_core::RngCore;
        let mut tree_nonce = [0u8; 32];
        rand_core::OsRng
            .try_fill_bytes(&mut tree_nonce)
            .map_err(|e| CoreError::crypto(format!("failed to generate tree nonce: {e}")))?;

        let mutable_apt = Apt::new(tree_nonce);
        let str0 = SignedTreeRoot::initial(mutable_apt.root_hash(), policies, &signing_key);
        let mut snapshots = VecDeque::with_capacity(loaded_history_length.max(1));
        snapshots.push_back(Snapshot {
            str: str0,
            apt: mutable_apt.clone(),
        });

        Ok(Self {
            mutable_apt,
            snapshots,
            signing_key,
            vrf_key,
            policies,
            pending_policies: None,
            loaded_history_length,
        })
    }

    pub fn vrf_key(&self) -> &VrfSigningKey {
        &self.vrf_key
    }

    pub fn latest_snapshot(&self) -> &Snapshot {
        self.snapshots.back().expect("at least one sealed snapshot always exists")
    }

    pub fn latest_str(&self) -> &SignedTreeRoot {
        &self.latest_snapshot().str
    }

    pub fn get_snapshot(&self, epoch: u64) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| s.str.epoch == epoch)
    }

    pub fn get_str(&self, epoch: u64) -> Option<&SignedTreeRoot> {
        self.get_snapshot(epoch).map(|s| &s.str)
    }

    pub fn earliest_retained_epoch(&self) -> u64 {
        self.snapshots.front().map(|s| s.str.epoch).unwrap_or(0)
    }

    /// Insert `(username, value)` at `index` into the in-flight mutable
    /// APT. Not yet visible to readers — only the snapshot produced by the
    /// next `update()` exposes it.
    pub fn register_index(&mut self, index: Index, username: &str, value: Vec<u8>) -> Result<(), CoreError> {
        self.mutable_apt.set(index, username, value)
    }

    /// Issue a TB against the latest sealed STR, valid for the upcoming
    /// epoch.
    pub fn sign_tb(&self, index: Index, value: Vec<u8>) -> TemporaryBinding {
        TemporaryBinding::issue(self.latest_str(), index, value, &self.signing_key)
    }

    /// Schedule a policy change to take effect one epoch after it is set
    /// (i.e. in the STR sealed by the *next* `update()`).
    pub fn schedule_policy_change(&mut self, new_policies: Policies) {
        self.pending_policies = Some(new_policies);
    }

    pub fn current_policies(&self) -> Policies {
        self.policies
    }

    /// Freeze the mutable APT, emit and sign the STR for `epoch + 1`, then
    /// clone the APT forward for further mutation. Atomic with respect to
    /// observers: the new snapshot is only appended once fully built, so no
    /// half-transitioned state (new STR without matching sealed APT) is ever
    /// visible.
    pub fn update(&mut self) -> &SignedTreeRoot {
        let policies = self.pending_policies.take().unwrap_or(self.policies);
        self.policies = policies;

        let tree_hash = self.mutable_apt.root_hash();
        let prev_str = self.latest_str().clone();
        let new_str = SignedTreeRoot::next(&prev_str, tree_hash, policies, &self.signing_key);

        self.snapshots.push_back(Snapshot {
            str: new_str,
            apt: self.mutable_apt.clone(),
        });
        while self.snapshots.len() > self.loaded_history_length {
            self.snapshots.pop_front();
        }

        self.mutable_apt = self.mutable_apt.clone_for_next_epoch();
        &self.latest_snapshot().str
    }
}
