use std::path::PathBuf;
use std::time::Duration;

use pushdeck_transfer::{DEFAULT_EXCLUSIONS, FALLBACK_CHUNK_SIZE, MAX_TREE_CONCURRENCY};

/// Tuning passed explicitly to the orchestrator for each run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Where batch archives are staged before transfer.
    pub temp_dir: PathBuf,
    /// Chunk size of the fallback streaming transfer.
    pub chunk_size: usize,
    /// Simultaneous file transfers inside one directory tree, capped at
    /// [`MAX_TREE_CONCURRENCY`].
    pub tree_concurrency: usize,
    /// Upper bound on establishing the connection.
    pub connect_timeout: Duration,
    /// Path components skipped by directory-tree transfers.
    pub exclusions: Vec<String>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
            chunk_size: FALLBACK_CHUNK_SIZE,
            tree_concurrency: MAX_TREE_CONCURRENCY,
            connect_timeout: Duration::from_secs(30),
            exclusions: DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl UploadOptions {
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = UploadOptions::default();
        assert_eq!(opts.chunk_size, 64 * 1024);
        assert_eq!(opts.tree_concurrency, 4);
        assert_eq!(opts.connect_timeout, Duration::from_secs(30));
        assert_eq!(opts.exclusions, vec![".git".to_string()]);
    }
}
