//! Directory service: register / lookup / lookup-in-epoch / monitor /
//! STR-history, each producing a proof `Response`.
//!
//! Wraps a [`Pad`] behind a `parking_lot::RwLock` for the reader/writer
//! split: `register` and `update` take the write guard;
//! `key_lookup`/`lookup_in_epoch`/`monitor`/`get_str_history` take a read
//! guard over the latest sealed snapshot only, never the in-flight mutable
//! clone (the mutable APT lives inside the locked [`Pad`] itself and is
//! never read directly by these operations).

use crate::crypto::{Ed25519SigningKey, VrfSigningKey};
use crate::errors::ServerErrorCode;
use crate::pad::Pad;
use crate::tree::{AuthenticationPath, Policies, TemporaryBinding};
use crate::wire::{DirectoryProof, Response, StrHistoryRange};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, warn};

struct DirectoryState {
    pad: Pad,
    /// Names registered but not yet included in a sealed snapshot, keyed by
    /// username. Drained for an epoch at the `update()` boundary that seals
    /// it, discarding that epoch's TBs regardless of whether they were
    /// honoured.
    pending: HashMap<String, TemporaryBinding>,
}

pub struct ConiksDirectory {
    state: RwLock<DirectoryState>,
}

impl ConiksDirectory {
    pub fn new(
        signing_key: Ed25519SigningKey,
        vrf_key: VrfSigningKey,
        policies: Policies,
        loaded_history_length: usize,
    ) -> Result<Self, crate::errors::CoreError> {
        let pad = Pad::new(signing_key, vrf_key, policies, loaded_history_length)?;
        Ok(Self {
            state: RwLock::new(DirectoryState {
                pad,
                pending: HashMap::new(),
            }),
        })
    }

    /// Seal the mutable APT into a new epoch, discarding this epoch's
    /// pending TBs regardless of whether they were honoured (detecting a
    /// broken promise is the client checker's job, not the server's).
    pub fn update(&self) {
        let mut state = self.state.write();
        let str = state.pad.update();
        let sealed_epoch = str.epoch;
        debug!(epoch = sealed_epoch, "sealed new epoch");
        state.pending.retain(|_, tb| !tb.valid_for_epoch(sealed_epoch));
    }

    pub fn register(&self, username: &str, key: &[u8]) -> Response {
        if username.is_empty() || key.is_empty() {
            return Response::error_only(ServerErrorCode::MalformedClient);
        }

        let mut state = self.state.write();
        let vrf_key = state.pad.vrf_key().clone();
        let (index, vrf_proof) = match vrf_key.prove(username) {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "VRF proof generation failed");
                return Response::error_only(ServerErrorCode::Directory);
            }
        };

        let latest = state.pad.latest_snapshot();
        let tree_nonce = latest.apt.tree_nonce();
        let path = latest.apt.lookup(&index);
        let latest_str = latest.str.clone();

        if path.leaf.index == index && !path.leaf.empty {
            // Already bound in the tree.
            let ap = assemble_ap(tree_nonce, index, vrf_proof, path);
            return Response::proof(
                ServerErrorCode::NameExisted,
                DirectoryProof {
                    aps: vec![ap],
                    strs: vec![latest_str],
                    tb: None,
                },
            );
        }

        if let Some(existing_tb) = state.pending.get(username).cloned() {
            let ap = assemble_ap(tree_nonce, index, vrf_proof, path);
            return Response::proof(
                ServerErrorCode::NameExisted,
                DirectoryProof {
                    aps: vec![ap],
                    strs: vec![latest_str],
                    tb: Some(existing_tb),
                },
            );
        }

        if let Err(e) = state.pad.register_index(index, username, key.to_vec()) {
            warn!(error = %e, "failed to register index");
            return Response::error_only(ServerErrorCode::Directory);
        }
        let tb = state.pad.sign_tb(index, key.to_vec());
        state.pending.insert(username.to_string(), tb.clone());

        debug!(username, "registered new pending binding");

        let ap = assemble_ap(tree_nonce, index, vrf_proof, path);
        Response::proof(
            ServerErrorCode::Success,
            DirectoryProof {
                aps: vec![ap],
                strs: vec![latest_str],
                tb: Some(tb),
            },
        )
    }

    pub fn key_lookup(&self, username: &str) -> Response {
        if username.is_empty() {
            return Response::error_only(ServerErrorCode::MalformedClient);
        }

        let mut state = self.state.write();
        let vrf_key = state.pad.vrf_key().clone();
        let (index, vrf_proof) = match vrf_key.prove(username) {
            Ok(result) => result,
            Err(_) => return Response::error_only(ServerErrorCode::Directory),
        };

        let latest = state.pad.latest_snapshot();
        let tree_nonce = latest.apt.tree_nonce();
        let path = latest.apt.lookup(&index);
        let latest_str = latest.str.clone();
        let is_inclusion = path.leaf.index == index && !path.leaf.empty;

        if is_inclusion {
            state.pending.remove(username);
            let ap = assemble_ap(tree_nonce, index, vrf_proof, path);
            return Response::proof(
                ServerErrorCode::Success,
                DirectoryProof {
                    aps: vec![ap],
                    strs: vec![latest_str],
                    tb: None,
                },
            );
        }

        if let Some(tb) = state.pending.get(username).cloned() {
            let ap = assemble_ap(tree_nonce, index, vrf_proof, path);
            return Response::proof(
                ServerErrorCode::Success,
                DirectoryProof {
                    aps: vec![ap],
                    strs: vec![latest_str],
                    tb: Some(tb),
                },
            );
        }

        let ap = assemble_ap(tree_nonce, index, vrf_proof, path);
        Response::proof(
            ServerErrorCode::NameNotFound,
            DirectoryProof {
                aps: vec![ap],
                strs: vec![latest_str],
                tb: None,
            },
        )
    }

    pub fn key_lookup_in_epoch(&self, username: &str, epoch: u64) -> Response {
        if username.is_empty() {
            return Response::error_only(ServerErrorCode::MalformedClient);
        }

        let state = self.state.read();
        let latest_epoch = state.pad.latest_str().epoch;
        if epoch > latest_epoch || epoch < state.pad.earliest_retained_epoch() {
            return Response::error_only(ServerErrorCode::MalformedClient);
        }

        let vrf_key = state.pad.vrf_key().clone();
        let (index, vrf_proof) = match vrf_key.prove(username) {
            Ok(result) => result,
            Err(_) => return Response::error_only(ServerErrorCode::Directory),
        };

        let Some(snapshot) = state.pad.get_snapshot(epoch) else {
            return Response::error_only(ServerErrorCode::Directory);
        };
        let path = snapshot.apt.lookup(&index);
        let ap = assemble_ap(snapshot.apt.tree_nonce(), index, vrf_proof, path);

        let strs: Vec<_> = (epoch..=latest_epoch)
            .filter_map(|e| state.pad.get_str(e).cloned())
            .collect();

        Response::proof(
            ServerErrorCode::Success,
            DirectoryProof {
                aps: vec![ap],
                strs,
                tb: None,
            },
        )
    }

    pub fn monitor(&self, username: &str, start: u64, end: u64) -> Response {
        if username.is_empty() {
            return Response::error_only(ServerErrorCode::MalformedClient);
        }

        let state = self.state.read();
        let latest_epoch = state.pad.latest_str().epoch;
        if start > latest_epoch || start > end {
            return Response::error_only(ServerErrorCode::MalformedClient);
        }
        let effective_end = end.min(latest_epoch);

        let vrf_key = state.pad.vrf_key().clone();
        let (index, vrf_proof) = match vrf_key.prove(username) {
            Ok(result) => result,
            Err(_) => return Response::error_only(ServerErrorCode::Directory),
        };

        let mut aps = Vec::new();
        let mut strs = Vec::new();
        for epoch in start..=effective_end {
            let Some(snapshot) = state.pad.get_snapshot(epoch) else {
                return Response::error_only(ServerErrorCode::Directory);
            };
            let path = snapshot.apt.lookup(&index);
            aps.push(assemble_ap(snapshot.apt.tree_nonce(), index, vrf_proof.clone(), path));
            strs.push(snapshot.str.clone());
        }

        Response::proof(ServerErrorCode::Success, DirectoryProof { aps, strs, tb: None })
    }

    pub fn get_str_history(&self, start: u64, end: u64) -> Response {
        let state = self.state.read();
        let latest_epoch = state.pad.latest_str().epoch;

        if end == 0 {
            return Response::history(StrHistoryRange {
                strs: vec![state.pad.latest_str().clone()],
            });
        }

        if start > end || end > latest_epoch || start < state.pad.earliest_retained_epoch() {
            return Response::error_only(ServerErrorCode::MalformedAuditor);
        }

        let strs: Vec<_> = (start..=end).filter_map(|e| state.pad.get_str(e).cloned()).collect();
        Response::history(StrHistoryRange { strs })
    }
}

fn assemble_ap(
    tree_nonce: [u8; 32],
    index: crate::crypto::Index,
    vrf_proof: crate::crypto::VrfProof,
    path: crate::tree::TreePath,
) -> AuthenticationPath {
    AuthenticationPath {
        tree_nonce,
        lookup_index: index,
        vrf_proof,
        pruned_siblings: path.pruned_siblings,
        leaf: path.leaf,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::DirectoryResponseBody;

    fn fresh_directory() -> ConiksDirectory {
        let signing_key = Ed25519SigningKey::from_bytes([2u8; 32]);
        let vrf_key = VrfSigningKey::generate().unwrap();
        let policies = Policies::new(vrf_key.public_key().unwrap());
        ConiksDirectory::new(signing_key, vrf_key, policies, 16).unwrap()
    }

    fn unwrap_proof(resp: &Response) -> &DirectoryProof {
        match resp.directory_response.as_ref().unwrap() {
            DirectoryResponseBody::DirectoryProof(p) => p,
            _ => panic!("expected directory proof"),
        }
    }

    #[test]
    fn s1_register_then_lookup() {
        let dir = fresh_directory();
        let resp = dir.register("alice", b"k1");
        assert_eq!(resp.error, ServerErrorCode::Success);
        let proof = unwrap_proof(&resp);
        assert!(!proof.aps[0].is_inclusion());
        assert!(proof.tb.is_some());

        dir.update();

        let resp = dir.key_lookup("alice");
        assert_eq!(resp.error, ServerErrorCode::Success);
        let proof = unwrap_proof(&resp);
        assert!(proof.aps[0].is_inclusion());
        assert!(proof.tb.is_none());
    }

    #[test]
    fn s2_second_registration_name_existed() {
        let dir = fresh_directory();
        let first = dir.register("alice", b"k1");
        let first_tb = unwrap_proof(&first).tb.clone().unwrap();

        let second = dir.register("alice", b"k2");
        assert_eq!(second.error, ServerErrorCode::NameExisted);
        let proof = unwrap_proof(&second);
        assert!(!proof.aps[0].is_inclusion());
        assert_eq!(proof.tb.as_ref().unwrap().signature, first_tb.signature);
    }

    #[test]
    fn s6_lookup_in_epoch_beyond_latest_is_malformed() {
        let dir = fresh_directory();
        dir.register("alice", b"k1");
        dir.update();
        let resp = dir.key_lookup_in_epoch("alice", 12);
        assert_eq!(resp.error, ServerErrorCode::MalformedClient);
        assert!(resp.directory_response.is_none());
    }

    #[test]
    fn s5_monitor_clamps_end_and_tracks_inclusion() {
        let dir = fresh_directory();
        dir.register("alice", b"k1");
        for _ in 0..9 {
            dir.update();
        } // now at epoch 9, alice included since epoch 1

        let resp = dir.monitor("alice", 0, 50);
        assert_eq!(resp.error, ServerErrorCode::Success);
        let proof = unwrap_proof(&resp);
        assert_eq!(proof.aps.len(), 10); // epochs 0..=9
        assert!(!proof.aps[0].is_inclusion());
        assert!(proof.aps[9].is_inclusion());
    }

    #[test]
    fn name_not_found_for_unregistered_user() {
        let dir = fresh_directory();
        let resp = dir.key_lookup("ghost");
        assert_eq!(resp.error, ServerErrorCode::NameNotFound);
    }

    #[test]
    fn get_str_history_end_zero_returns_latest_only() {
        let dir = fresh_directory();
        dir.update();
        dir.update();
        let resp = dir.get_str_history(0, 0);
        match resp.directory_response.unwrap() {
            DirectoryResponseBody::StrHistoryRange(range) => {
                assert_eq!(range.strs.len(), 1);
                assert_eq!(range.strs[0].epoch, 2);
            }
            _ => panic!("expected history"),
        }
    }

    #[test]
    fn get_str_history_range_soundness() {
        let dir = fresh_directory();
        for _ in 0..10 {
            dir.update();
        }
        let resp = dir.get_str_history(3, 7);
        match resp.directory_response.unwrap() {
            DirectoryResponseBody::StrHistoryRange(range) => {
                assert_eq!(range.strs.len(), 5);
                for (i, str) in range.strs.iter().enumerate() {
                    assert_eq!(str.epoch, 3 + i as u64);
                }
            }
            _ => panic!("expected history"),
        }
    }
}
