//! Upload pipeline: sizing, archiving, transfer with fallback, verification.
//!
//! This crate holds the **business logic** of moving local files and
//! folders to a remote host over one authenticated connection. It has no
//! SSH dependency of its own; the app supplies a [`SessionConnector`]
//! that opens [`RemoteShell`] connections on top of a concrete client.
//!
//! # Modes
//!
//! - **Single path**: size, connect, ensure the remote directory, send the
//!   file (or mirror the directory tree), verify, dispose.
//! - **Batch archive**: one connection for all folders; each folder is
//!   compressed, sent with a plain put (chunked streaming on failure),
//!   verified by size and cleaned up. A failing folder does not stop the
//!   batch.

pub mod error;
pub mod options;
pub mod orchestrator;
pub mod remote;
pub mod session;
pub mod transferor;
pub mod types;
pub mod verifier;

#[cfg(test)]
mod mock;

use std::path::Path;

pub use error::{TransportError, UploadError};
pub use options::UploadOptions;
pub use orchestrator::UploadOrchestrator;
pub use remote::{RemoteFuture, RemoteShell, RemoteWriter, SessionConnector, StepCallback};
pub use session::ConnectionSession;
pub use transferor::Transferor;
pub use types::{BatchResult, ExecOutput, TransferMethod, TreeReport, UnitFailure, UploadEvent};
pub use verifier::Verifier;

/// Whether `path` exists locally. Errors while checking count as absent.
pub fn check_local_path_exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(false)
}
