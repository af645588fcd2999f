//! Authenticated Prefix Tree: a sparse binary trie over 256-bit [`Index`]
//! values, indexed bit-by-bit from the most significant bit.
//!
//! Internal nodes store the Merkle hash of their two children; the empty
//! subtree has a distinguished hash derived from the tree nonce, node level,
//! and prefix (`hashing::empty_hash`). Nodes are `Arc`-shared so that
//! `clone_for_next_epoch` is O(1) and only paths touched by subsequent `set`
//! calls reallocate — the copy-on-write replacement for the pointer-graph
//! mutation described in the design notes.

use crate::crypto::Index;
use crate::errors::CoreError;
use crate::tree::commitment::Commitment;
use crate::tree::hashing::{branch_hash, empty_hash, leaf_hash};
use crate::tree::leaf::Leaf;
use std::sync::Arc;

#[derive(Clone)]
enum Node {
    Empty,
    Leaf(Arc<Leaf>),
    Interior(Arc<Interior>),
}

struct Interior {
    left: Node,
    right: Node,
    hash: [u8; 32],
}

fn node_hash(node: &Node, level: u16, index_hint: &Index, tree_nonce: &[u8; 32]) -> [u8; 32] {
    match node {
        Node::Empty => empty_hash(tree_nonce, level, index_hint),
        Node::Leaf(l) => leaf_hash(&l.index, l.level, &l.commitment),
        Node::Interior(i) => i.hash,
    }
}

fn make_interior(
    level: u16,
    left: Node,
    right: Node,
    tree_nonce: &[u8; 32],
    index_hint: &Index,
) -> Node {
    let lh = node_hash(&left, level + 1, index_hint, tree_nonce);
    let rh = node_hash(&right, level + 1, index_hint, tree_nonce);
    Node::Interior(Arc::new(Interior {
        left,
        right,
        hash: branch_hash(level, &lh, &rh),
    }))
}

#[derive(Clone)]
struct PendingLeaf {
    index: Index,
    commitment: Commitment,
    value: Vec<u8>,
}

fn insert(node: Node, level: u16, req: &PendingLeaf, tree_nonce: &[u8; 32]) -> Node {
    match node {
        Node::Empty => Node::Leaf(Arc::new(Leaf::user_leaf(
            req.index,
            level,
            req.commitment,
            req.value.clone(),
        ))),
        Node::Leaf(existing) => {
            if existing.index == req.index {
                // Username re-registration onto an identical index is not
                // supported (no user key change); the caller never reaches
                // this path because it checks the pending/registered table
                // first, so treat it as a no-op rather than corrupt state.
                Node::Leaf(existing)
            } else {
                split_leaves(existing, req, level, tree_nonce)
            }
        }
        Node::Interior(i) => {
            let bit = req.index.bit(level as usize);
            if bit {
                let new_right = insert(i.right.clone(), level + 1, req, tree_nonce);
                make_interior(level, i.left.clone(), new_right, tree_nonce, &req.index)
            } else {
                let new_left = insert(i.left.clone(), level + 1, req, tree_nonce);
                make_interior(level, new_left, i.right.clone(), tree_nonce, &req.index)
            }
        }
    }
}

fn split_leaves(
    existing: Arc<Leaf>,
    req: &PendingLeaf,
    level: u16,
    tree_nonce: &[u8; 32],
) -> Node {
    let existing_bit = existing.index.bit(level as usize);
    let new_bit = req.index.bit(level as usize);
    if existing_bit != new_bit {
        let existing_leaf = Leaf {
            level: level + 1,
            ..(*existing).clone()
        };
        let new_leaf = Leaf::user_leaf(req.index, level + 1, req.commitment, req.value.clone());
        let (left, right) = if new_bit {
            (Node::Leaf(Arc::new(existing_leaf)), Node::Leaf(Arc::new(new_leaf)))
        } else {
            (Node::Leaf(Arc::new(new_leaf)), Node::Leaf(Arc::new(existing_leaf)))
        };
        make_interior(level, left, right, tree_nonce, &req.index)
    } else {
        let child = split_leaves(existing, req, level + 1, tree_nonce);
        if new_bit {
            make_interior(level, Node::Empty, child, tree_nonce, &req.index)
        } else {
            make_interior(level, child, Node::Empty, tree_nonce, &req.index)
        }
    }
}

fn descend(node: &Node, level: u16, index: &Index, tree_nonce: &[u8; 32]) -> (Vec<[u8; 32]>, Leaf) {
    match node {
        Node::Empty => (Vec::new(), Leaf::empty_at(*index, level, tree_nonce)),
        Node::Leaf(l) => (Vec::new(), (**l).clone()),
        Node::Interior(i) => {
            let bit = index.bit(level as usize);
            let (chosen, sibling) = if bit {
                (&i.right, &i.left)
            } else {
                (&i.left, &i.right)
            };
            let sibling_hash = node_hash(sibling, level + 1, index, tree_nonce);
            let (mut siblings, leaf) = descend(chosen, level + 1, index, tree_nonce);
            siblings.insert(0, sibling_hash);
            (siblings, leaf)
        }
    }
}

/// Result of walking the tree along one index: the sibling hashes
/// encountered (root-downward) and the leaf the descent terminated at.
pub struct TreePath {
    pub pruned_siblings: Vec<[u8; 32]>,
    pub leaf: Leaf,
}

/// The authenticated prefix tree itself. VRF-agnostic: callers (the PAD)
/// compute the `Index` via the VRF and hand it to `set`/`lookup`.
#[derive(Clone)]
pub struct Apt {
    root: Node,
    tree_nonce: [u8; 32],
}

impl Apt {
    pub fn new(tree_nonce: [u8; 32]) -> Self {
        Self {
            root: Node::Empty,
            tree_nonce,
        }
    }

    pub fn tree_nonce(&self) -> [u8; 32] {
        self.tree_nonce
    }

    /// Insert a fresh leaf for `index`, committing to `(username, value)`
    /// with a fresh random salt. If two distinct indices collide up to some
    /// depth, they are pushed down one level at a time until they diverge,
    /// with an empty sibling filling the vacated slot.
    pub fn set(&mut self, index: Index, username: &str, value: Vec<u8>) -> Result<(), CoreError> {
        let commitment = Commitment::new_random(username, &value)?;
        let req = PendingLeaf {
            index,
            commitment,
            value,
        };
        self.root = insert(self.root.clone(), 0, &req, &self.tree_nonce);
        Ok(())
    }

    /// Descend to `index`, recording sibling hashes, and return whatever
    /// leaf terminates the descent (the requested leaf on inclusion, a
    /// different user's leaf or an empty placeholder on absence).
    pub fn lookup(&self, index: &Index) -> TreePath {
        let (pruned_siblings, leaf) = descend(&self.root, 0, index, &self.tree_nonce);
        TreePath {
            pruned_siblings,
            leaf,
        }
    }

    /// Copy-on-write clone used by the PAD at epoch boundaries. `Arc`
    /// sharing means this is O(1); only paths touched by later `set` calls
    /// reallocate.
    pub fn clone_for_next_epoch(&self) -> Apt {
        self.clone()
    }

    /// Cached hash of the root node.
    pub fn root_hash(&self) -> [u8; 32] {
        node_hash(&self.root, 0, &Index([0u8; 32]), &self.tree_nonce)
    }
}
