//! Core cryptographic engine for a CONIKS-style key-transparency directory:
//! the authenticated prefix tree, persistent authenticated directory,
//! directory service, auditor, auditor log, and client consistency checker.
//!
//! Network transports, TOML configuration, file-backed key stores, and
//! bot/proxy integrations are external collaborators and out of scope for
//! this crate.

pub mod auditor;
pub mod auditor_log;
pub mod checker;
pub mod crypto;
pub mod directory;
pub mod errors;
pub mod pad;
pub mod tree;
pub mod wire;

pub use auditor::Auditor;
pub use auditor_log::{AuditorLog, DirectoryHistory};
pub use checker::{ConsistencyChecker, RequestKind};
pub use directory::ConiksDirectory;
pub use errors::{ClientError, ClientResult, CoreError, CoreResult, ServerErrorCode};
pub use pad::{Pad, Snapshot};
