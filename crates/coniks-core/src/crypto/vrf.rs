//! Verifiable Random Function: derives the pseudonymous tree [`Index`] from
//! a username and proves/verifies that derivation.
//!
//! Built on `schnorrkel`'s Ristretto VRF (the construction used by the
//! Polkadot/Substrate stack), rather than a hand-rolled scheme: `prove`
//! drives `Keypair::vrf_sign` over a domain-separated transcript of the
//! username, and `verify` drives `PublicKey::vrf_verify` over the same
//! transcript. The VRF output bytes are the `Index` directly — `H` in the
//! data-model formulas never touches VRF output, only commitments and STR
//! hashing.

use crate::crypto::serde_fixed_bytes;
use crate::errors::CoreError;
use schnorrkel::vrf::{VRFPreOut, VRFProof as SchnorrkelVrfProof, VRF_PROOF_LENGTH};
use schnorrkel::{signing_context, Keypair, PublicKey, SecretKey, SECRET_KEY_LENGTH};
use serde::{Deserialize, Serialize};
use std::fmt;

const VRF_CONTEXT: &[u8] = b"coniks-core/vrf";

/// Fixed-width (256-bit) pseudonymous tree index: the output of the VRF over
/// a canonical username. Uniformly distributed and unlinkable without the
/// VRF public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Index(pub [u8; 32]);

impl Index {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::crypto("index must be exactly 32 bytes"))?;
        Ok(Self(arr))
    }

    /// Bit at `level` counting from the most significant bit (level 0 is the
    /// top bit of byte 0). Used to descend the authenticated prefix tree.
    pub fn bit(&self, level: usize) -> bool {
        let byte = self.0[level / 8];
        let shift = 7 - (level % 8);
        (byte >> shift) & 1 == 1
    }

    /// Number of leading bits `self` shares with `other`.
    pub fn shared_prefix_len(&self, other: &Index) -> usize {
        for level in 0..256 {
            if self.bit(level) != other.bit(level) {
                return level;
            }
        }
        256
    }
}

impl fmt::Debug for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Index({})", hex::encode(self.0))
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// VRF proof accompanying an [`Index`], verified against the directory's
/// `policies.vrf_public_key`.
#[derive(Clone, Serialize, Deserialize)]
pub struct VrfProof(#[serde(with = "serde_fixed_bytes")] pub [u8; VRF_PROOF_LENGTH]);

impl fmt::Debug for VrfProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VrfProof({})", hex::encode(self.0))
    }
}

impl PartialEq for VrfProof {
    fn eq(&self, other: &Self) -> bool {
        self.0[..] == other.0[..]
    }
}
impl Eq for VrfProof {}

impl VrfProof {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; VRF_PROOF_LENGTH] = bytes
            .try_into()
            .map_err(|_| CoreError::crypto("VRF proof must be exactly 64 bytes"))?;
        Ok(Self(arr))
    }
}

/// VRF signing key. Persisted form is the raw 64-byte `schnorrkel::SecretKey`
/// (32-byte scalar plus 32-byte nonce seed), matching the external layout of
/// the external wire layout.
#[derive(Clone, Serialize, Deserialize)]
pub struct VrfSigningKey(#[serde(with = "serde_fixed_bytes")] pub [u8; SECRET_KEY_LENGTH]);

impl fmt::Debug for VrfSigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VrfSigningKey(..)")
    }
}

impl VrfSigningKey {
    /// Generate a fresh VRF signing key. Fallible only on randomness
    /// exhaustion, the only fatal failure mode in steady-state key generation.
    pub fn generate() -> Result<Self, CoreError> {
        let mini = schnorrkel::MiniSecretKey::generate();
        let secret = mini.expand(schnorrkel::ExpansionMode::Uniform);
        Ok(Self(secret.to_bytes()))
    }

    pub fn to_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.0
    }

    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; SECRET_KEY_LENGTH] = bytes
            .try_into()
            .map_err(|_| CoreError::crypto("VRF signing key must be exactly 64 bytes"))?;
        SecretKey::from_bytes(&arr).map_err(|e| CoreError::crypto(e.to_string()))?;
        Ok(Self(arr))
    }

    fn keypair(&self) -> Result<Keypair, CoreError> {
        let secret =
            SecretKey::from_bytes(&self.0).map_err(|e| CoreError::crypto(e.to_string()))?;
        Ok(secret.to_keypair())
    }

    pub fn public_key(&self) -> Result<VrfPublicKey, CoreError> {
        Ok(VrfPublicKey(self.keypair()?.public.to_bytes()))
    }

    /// Prove the VRF over `username`, yielding the deterministic [`Index`]
    /// and the proof that lets anyone holding the public key check it.
    pub fn prove(&self, username: &str) -> Result<(Index, VrfProof), CoreError> {
        let keypair = self.keypair()?;
        let transcript = signing_context(VRF_CONTEXT).bytes(username.as_bytes());
        let (io, proof, _batchable) = keypair.vrf_sign(transcript);
        Ok((Index(*io.as_output_bytes()), VrfProof(proof.to_bytes())))
    }
}

/// VRF public key, carried in `Policies::vrf_public_key`.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrfPublicKey(pub [u8; 32]);

impl fmt::Debug for VrfPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VrfPublicKey({})", hex::encode(self.0))
    }
}

impl VrfPublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::crypto("VRF public key must be exactly 32 bytes"))?;
        PublicKey::from_bytes(&arr).map_err(|e| CoreError::crypto(e.to_string()))?;
        Ok(Self(arr))
    }

    /// Verify that `proof` attests `index = VRF(username)` under this key.
    /// This is the check required by invariant 6 and error `bad_vrf_proof`.
    pub fn verify(&self, username: &str, index: &Index, proof: &VrfProof) -> bool {
        let Ok(pk) = PublicKey::from_bytes(&self.0) else {
            return false;
        };
        let Ok(vrf_proof) = SchnorrkelVrfProof::from_bytes(&proof.0) else {
            return false;
        };
        let Ok(pre_out) = VRFPreOut::from_bytes(&index.0) else {
            return false;
        };
        let transcript = signing_context(VRF_CONTEXT).bytes(username.as_bytes());
        match pk.vrf_verify(transcript, &pre_out, &vrf_proof) {
            Ok((io, _batchable)) => io.as_output_bytes() == &index.0,
            Err(_) => false,
        }
    }
}
