//! Authenticated-prefix-tree node hashing.
//!
//! Mirrors the domain-separated, versioned commitment style used elsewhere
//! in this crate (tag bytes, little-endian numeric fields, a single
//! concatenated hash call) but over CONIKS tree-node semantics: a branch
//! commits to its level and both children, a leaf commits to its index,
//! level, and value commitment, and an empty subtree commits to the tree
//! nonce and its canonical prefix so that two empty subtrees reached by
//! different descents still hash identically.

use crate::crypto::{hash, Index};
use crate::tree::commitment::Commitment;

const BRANCH_TAG: &[u8] = b"APT-BRANCH";
const LEAF_TAG: &[u8] = b"APT-LEAF";
const EMPTY_TAG: &[u8] = b"APT-EMPTY";
const NODE_HASH_VERSION: u16 = 1;

/// Zero out every bit of `index` at or beyond `level`, leaving only the bits
/// that define the subtree rooted at `level`.
pub fn truncate_prefix(index: &Index, level: u16) -> [u8; 32] {
    let mut bytes = index.to_bytes();
    let level = level as usize;
    for (i, byte) in bytes.iter_mut().enumerate() {
        let bit_start = i * 8;
        if bit_start >= level {
            *byte = 0;
        } else if bit_start + 8 > level {
            let keep = level - bit_start;
            let mask = 0xFFu8.checked_shl(8 - keep as u32).unwrap_or(0);
            *byte &= mask;
        }
    }
    bytes
}

/// Hash of the distinguished empty subtree rooted at `level` along the
/// prefix shared with `index`.
pub fn empty_hash(tree_nonce: &[u8; 32], level: u16, index: &Index) -> [u8; 32] {
    let prefix = truncate_prefix(index, level);
    let mut h = hash::hasher();
    h.update(EMPTY_TAG);
    h.update(&NODE_HASH_VERSION.to_le_bytes());
    h.update(tree_nonce);
    h.update(&level.to_le_bytes());
    h.update(&prefix);
    h.finalize()
}

/// Hash of a leaf node.
pub fn leaf_hash(index: &Index, level: u16, commitment: &Commitment) -> [u8; 32] {
    let mut h = hash::hasher();
    h.update(LEAF_TAG);
    h.update(&NODE_HASH_VERSION.to_le_bytes());
    h.update(index.as_bytes());
    h.update(&level.to_le_bytes());
    h.update(&commitment.salt);
    h.update(&commitment.value_hash);
    h.finalize()
}

/// Hash of a branch node from its two children's hashes.
pub fn branch_hash(level: u16, left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut h = hash::hasher();
    h.update(BRANCH_TAG);
    h.update(&NODE_HASH_VERSION.to_le_bytes());
    h.update(&level.to_le_bytes());
    h.update(left);
    h.update(right);
    h.finalize()
}
