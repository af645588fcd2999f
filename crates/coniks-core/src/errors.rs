//! Error taxonomies for the CONIKS core
//!
//! Three disjoint error types, one per failure domain, following the
//! thiserror-enum-with-constructors pattern rather than a single catch-all.

use serde::{Deserialize, Serialize};

/// Server-originated result codes, carried on the wire in every `Response`.
///
/// `Success` is a real variant (not folded into `Option<ServerErrorCode>`) so
/// that the response envelope always carries exactly one code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum ServerErrorCode {
    #[error("success")]
    Success,
    #[error("name already bound or pending")]
    NameExisted,
    #[error("name not found")]
    NameNotFound,
    #[error("malformed client request")]
    MalformedClient,
    #[error("malformed auditor request")]
    MalformedAuditor,
    #[error("internal directory error")]
    Directory,
    #[error("auditor does not track this directory")]
    UnknownDirectory,
}

impl ServerErrorCode {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Client-originated errors, raised by the consistency checker and the
/// auditor. Never serialized onto the wire; these are local verification
/// failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ClientError {
    /// Response shape did not match any accepted (code, proof-type) pair for
    /// the request type.
    #[error("malformed directory message: {reason}")]
    MalformedDirectoryMessage { reason: String },

    /// An STR or TB signature failed to verify.
    #[error("bad signature: {reason}")]
    BadSignature { reason: String },

    /// VRF verification of `(username, lookup_index, vrf_proof)` failed.
    #[error("bad VRF proof for username {username}")]
    BadVrfProof { username: String },

    /// Recomputed leaf commitment did not match the authentication path.
    #[error("bad commitment")]
    BadCommitment,

    /// VRF-derived index did not match the leaf returned in the path.
    #[error("bad lookup index")]
    BadLookupIndex,

    /// Recomputed tree root did not match `str.tree_hash`.
    #[error("bad authentication path")]
    BadAuthPath,

    /// Caller-supplied key did not match the key found in the directory.
    #[error("bindings differ for username {username}")]
    BindingsDiffer { username: String },

    /// Hash-chain or equality check against the verified STR failed.
    #[error("bad STR: {reason}")]
    BadStr { reason: String },

    /// A temporary binding was invalid or absent where one was required.
    #[error("bad promise: {reason}")]
    BadPromise { reason: String },

    /// A previously issued TB was not honoured by the snapshot that should
    /// have included it.
    #[error("broken promise for username {username}")]
    BrokenPromise { username: String },
}

impl ClientError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDirectoryMessage {
            reason: reason.into(),
        }
    }

    pub fn bad_signature(reason: impl Into<String>) -> Self {
        Self::BadSignature {
            reason: reason.into(),
        }
    }

    pub fn bad_str(reason: impl Into<String>) -> Self {
        Self::BadStr {
            reason: reason.into(),
        }
    }

    pub fn bad_promise(reason: impl Into<String>) -> Self {
        Self::BadPromise {
            reason: reason.into(),
        }
    }
}

/// Standard result type for client-side verification.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Fatal, init-only failures: randomness exhaustion while generating signing
/// or VRF keys. Never returned by steady-state directory/checker operations.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum CoreError {
    #[error("cryptographic error: {message}")]
    Crypto { message: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Standard result type for fatal core initialization failures.
pub type CoreResult<T> = std::result::Result<T, CoreError>;
