//! Authenticated prefix tree, commitments, leaves, policies, signed tree
//! roots, and temporary bindings.

pub mod apt;
pub mod commitment;
pub mod hashing;
pub mod leaf;
pub mod policy;
pub mod str;
pub mod tb;

pub use apt::{Apt, TreePath};
pub use commitment::Commitment;
pub use hashing::{branch_hash, empty_hash, leaf_hash};
pub use leaf::{AuthenticationPath, Leaf};
pub use policy::{Policies, CURRENT_HASH_ID, CURRENT_PROTOCOL_VERSION, DEFAULT_EPOCH_DEADLINE_SECS};
pub use str::{directory_identity, verify_hash_chain, SignedTreeRoot};
pub use tb::TemporaryBinding;
