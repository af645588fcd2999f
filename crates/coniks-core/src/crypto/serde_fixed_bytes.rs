//! Serde support for fixed-size byte arrays wider than serde's built-in
//! array impls (0..=32 elements): Ed25519 signatures and VRF key/proof
//! material are 64 bytes. Encodes as a hex string, matching the
//! tag-discriminated JSON wire format the rest of the core uses.

use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer, const N: usize>(value: &[u8; N], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(value))
}

pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error> {
    let encoded = String::deserialize(deserializer)?;
    let bytes = hex::decode(&encoded).map_err(D::Error::custom)?;
    bytes
        .try_into()
        .map_err(|v: Vec<u8>| D::Error::custom(format!("expected {N} bytes, got {}", v.len())))
}
