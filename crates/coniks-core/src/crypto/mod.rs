//! Cryptographic primitives: digest, Ed25519 signing, and VRF.

pub mod ed25519;
pub mod hash;
pub mod serde_fixed_bytes;
pub mod vrf;

pub use ed25519::{
    ed25519_verify, ed25519_verifying_key, Ed25519Signature, Ed25519SigningKey, Ed25519VerifyingKey,
};
pub use hash::{hash, hasher, HashAlgorithm, Hasher, ALGORITHM};
pub use vrf::{Index, VrfProof, VrfPublicKey, VrfSigningKey};
