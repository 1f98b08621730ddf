//! Archive error types.

use std::path::PathBuf;

/// Errors produced while packaging or validating an archive.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("source directory does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("source is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("archive is empty: {}", .0.display())]
    EmptyArchive(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("walkdir error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("transfer error: {0}")]
    Transfer(#[from] pushdeck_transfer::TransferError),

    #[error("packaging task failed: {0}")]
    Task(String),
}
