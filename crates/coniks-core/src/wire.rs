//! External interfaces: request/response envelopes and the
//! directory-proof payload shapes. Tag-discriminated JSON; payload field
//! names match the struct fields defined in the data model, unrenamed.
//!
//! Transports (UNIX/TCP sockets, TLS), persistence of these bytes, and CLI
//! wiring are external collaborators — this module only defines the shapes
//! the core emits and consumes.

use crate::errors::ServerErrorCode;
use crate::tree::{AuthenticationPath, SignedTreeRoot, TemporaryBinding};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub key: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyLookupRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyLookupInEpochRequest {
    pub username: String,
    pub epoch: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorRequest {
    pub username: String,
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrHistoryRequest {
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRequest {
    pub strs: Vec<SignedTreeRoot>,
}

/// `{ type: enum{register, key_lookup, key_lookup_in_epoch, monitor, audit, str}, request: payload }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "request", rename_all = "snake_case")]
pub enum Request {
    Register(RegisterRequest),
    KeyLookup(KeyLookupRequest),
    KeyLookupInEpoch(KeyLookupInEpochRequest),
    Monitor(MonitorRequest),
    Audit(AuditRequest),
    Str(StrHistoryRequest),
}

/// `DirectoryProof{ ap(s), str(s), tb? }`, shared by register/lookup/
/// lookup-in-epoch/monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryProof {
    pub aps: Vec<AuthenticationPath>,
    pub strs: Vec<SignedTreeRoot>,
    pub tb: Option<TemporaryBinding>,
}

/// `STRHistoryRange{ str[start..=end] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrHistoryRange {
    pub strs: Vec<SignedTreeRoot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DirectoryResponseBody {
    DirectoryProof(DirectoryProof),
    StrHistoryRange(StrHistoryRange),
}

/// `{ error: ErrorCode, directory_response: DirectoryProof | STRHistoryRange | null }`.
///
/// `directory_response` is omitted when `error` is one of `malformed_client`,
/// `directory`, `malformed_auditor`, or any other non-success code with no
/// proof body to carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub error: ServerErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory_response: Option<DirectoryResponseBody>,
}

impl Response {
    pub fn proof(error: ServerErrorCode, proof: DirectoryProof) -> Self {
        Self {
            error,
            directory_response: Some(DirectoryResponseBody::DirectoryProof(proof)),
        }
    }

    pub fn history(range: StrHistoryRange) -> Self {
        Self {
            error: ServerErrorCode::Success,
            directory_response: Some(DirectoryResponseBody::StrHistoryRange(range)),
        }
    }

    pub fn error_only(error: ServerErrorCode) -> Self {
        Self {
            error,
            directory_response: None,
        }
    }
}
