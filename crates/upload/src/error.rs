//! Upload error types.

use std::path::PathBuf;

use pushdeck_archive::ArchiveError;
use pushdeck_protocol::RequestError;
use pushdeck_transfer::TransferError;

/// Failure reported by a [`RemoteShell`](crate::RemoteShell) implementation.
///
/// Carries only the transport's message; callers decide which
/// [`UploadError`] stage it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors produced by the upload pipeline.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid request: {0}")]
    Request(#[from] RequestError),

    #[error("local path not found: {}", .0.display())]
    LocalPathNotFound(PathBuf),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("cannot create remote directory {path}: {message}")]
    RemoteDirectory { path: String, message: String },

    #[error("archive failed: {0}")]
    Archive(ArchiveError),

    #[error("archive validation failed: {0}")]
    ArchiveValidation(String),

    #[error("transfer failed: {0}")]
    Transfer(String),

    #[error("fallback transfer failed: {0}")]
    TransferFallback(String),

    #[error("verification failed for {path}: {reason}")]
    Verification { path: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Task(String),
}

impl From<ArchiveError> for UploadError {
    fn from(e: ArchiveError) -> Self {
        match e {
            ArchiveError::EmptyArchive(_) => UploadError::ArchiveValidation(e.to_string()),
            ArchiveError::SourceMissing(path) => UploadError::LocalPathNotFound(path),
            other => UploadError::Archive(other),
        }
    }
}

impl From<TransferError> for UploadError {
    fn from(e: TransferError) -> Self {
        UploadError::Transfer(e.to_string())
    }
}

impl From<tokio::task::JoinError> for UploadError {
    fn from(e: tokio::task::JoinError) -> Self {
        UploadError::Task(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_archive_maps_to_validation() {
        let e: UploadError = ArchiveError::EmptyArchive(PathBuf::from("/tmp/a.zip")).into();
        assert!(matches!(e, UploadError::ArchiveValidation(_)));
    }

    #[test]
    fn missing_archive_source_maps_to_local_path() {
        let e: UploadError = ArchiveError::SourceMissing(PathBuf::from("/data/a")).into();
        assert!(matches!(e, UploadError::LocalPathNotFound(p) if p == PathBuf::from("/data/a")));
    }

    #[test]
    fn verification_message_names_path() {
        let e = UploadError::Verification {
            path: "/srv/drop/b.zip".into(),
            reason: "size mismatch".into(),
        };
        assert_eq!(
            e.to_string(),
            "verification failed for /srv/drop/b.zip: size mismatch"
        );
    }
}
