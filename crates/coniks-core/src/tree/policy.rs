//! Directory policies: the only in-band configuration surface. Hashed and
//! signed as part of every STR. A policy change is scheduled — a new value
//! takes effect at the end of the current epoch, one epoch after it is set
//! (enforced by the PAD, not by this type).

use crate::crypto::VrfPublicKey;
use serde::{Deserialize, Serialize};

/// Current protocol version stamped into every STR's policies.
pub const CURRENT_PROTOCOL_VERSION: u64 = 1;

/// Tag identifying the hash algorithm (`crypto::hash::ALGORITHM`) in use.
/// `1` denotes SHA-256, the only algorithm this crate compiles in.
pub const CURRENT_HASH_ID: u64 = 1;

/// Default epoch length, in seconds, for newly constructed policies.
pub const DEFAULT_EPOCH_DEADLINE_SECS: u64 = 3600;

/// `{ protocol_version, hash_id, vrf_public_key, epoch_deadline }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policies {
    pub protocol_version: u64,
    pub hash_id: u64,
    pub vrf_public_key: VrfPublicKey,
    pub epoch_deadline: u64,
}

impl Policies {
    pub fn new(vrf_public_key: VrfPublicKey) -> Self {
        Self {
            protocol_version: CURRENT_PROTOCOL_VERSION,
            hash_id: CURRENT_HASH_ID,
            vrf_public_key,
            epoch_deadline: DEFAULT_EPOCH_DEADLINE_SECS,
        }
    }

    /// Serialize in the fixed field order required by STR signing:
    /// `version || hash_id || vrf_public_key || epoch_deadline`, numeric
    /// fields little-endian 64-bit.
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8 + 8 + 32 + 8);
        bytes.extend_from_slice(&self.protocol_version.to_le_bytes());
        bytes.extend_from_slice(&self.hash_id.to_le_bytes());
        bytes.extend_from_slice(self.vrf_public_key.as_bytes());
        bytes.extend_from_slice(&self.epoch_deadline.to_le_bytes());
        bytes
    }
}
