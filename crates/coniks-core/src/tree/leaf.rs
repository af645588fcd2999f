//! Leaf and authentication-path types.

use crate::crypto::{Index, VrfProof};
use crate::tree::commitment::Commitment;
use serde::{Deserialize, Serialize};

/// A tree leaf. `empty` leaves carry no user data and exist where the tree
/// was pruned on an empty branch; `level` is the depth at which the leaf
/// sits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    pub index: Index,
    pub commitment: Commitment,
    pub level: u16,
    pub value: Vec<u8>,
    pub empty: bool,
}

impl Leaf {
    pub fn empty_at(index: Index, level: u16, tree_nonce: &[u8; 32]) -> Self {
        Self {
            index,
            commitment: Commitment::with_salt(*tree_nonce, "", &[]),
            level,
            value: Vec::new(),
            empty: true,
        }
    }

    pub fn user_leaf(
        index: Index,
        level: u16,
        commitment: Commitment,
        value: Vec<u8>,
    ) -> Self {
        Self {
            index,
            commitment,
            level,
            value,
            empty: false,
        }
    }
}

/// Proof of inclusion or absence for one index: the sibling hashes from the
/// root downward along `lookup_index`, plus the VRF proof binding the
/// username to that index.
///
/// - *Inclusion*: `leaf.index == lookup_index`.
/// - *Absence*: `leaf.index != lookup_index` (the leaf found at the shared
///   prefix belongs to a different user, or is an empty placeholder).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationPath {
    pub tree_nonce: [u8; 32],
    pub lookup_index: Index,
    pub vrf_proof: VrfProof,
    pub pruned_siblings: Vec<[u8; 32]>,
    pub leaf: Leaf,
}

impl AuthenticationPath {
    /// Whether this path proves inclusion of `lookup_index` (as opposed to
    /// absence).
    pub fn is_inclusion(&self) -> bool {
        self.leaf.index == self.lookup_index && !self.leaf.empty
    }
}
