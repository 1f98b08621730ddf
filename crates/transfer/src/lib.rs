//! Byte-moving building blocks for the upload pipeline: size estimation,
//! progress aggregation, the chunked fallback pipe and directory-tree
//! planning.

mod chunked;
mod progress;
mod remote_path;
mod size;
mod tree;
mod types;
mod validation;

pub use chunked::{ChunkReader, PipeSummary, pipe_chunked};
pub use progress::{ProgressAggregator, ProgressCallback};
pub use remote_path::{join_remote, local_file_name, shell_quote};
pub use size::estimate_size;
pub use tree::{TreeFile, TreePlan, plan_tree};
pub use types::{Chunk, TransferUnit, UnitKind};
pub use validation::{is_excluded, sanitize_entry_name, validate_relative_path};

/// Chunk size of the fallback streaming transfer: 64 KiB.
pub const FALLBACK_CHUNK_SIZE: usize = 64 * 1024;

/// Buffer size used by the high-throughput whole-file put: 256 KiB.
pub const FAST_PUT_BUFFER_SIZE: usize = 256 * 1024;

/// Maximum simultaneous file transfers inside one directory tree.
pub const MAX_TREE_CONCURRENCY: usize = 4;

/// Version-control metadata directories skipped by tree transfers.
pub const DEFAULT_EXCLUSIONS: &[&str] = &[".git"];

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("walkdir error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("short transfer: read {read} bytes but wrote {written}")]
    ShortTransfer { read: u64, written: u64 },

    #[error("write side closed before the read side finished")]
    PipeClosed,
}
