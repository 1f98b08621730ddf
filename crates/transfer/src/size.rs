//! Recursive byte-size estimation.
//!
//! This is the only size computation in the workspace; every caller that
//! needs a local byte total goes through [`estimate_size`].

use std::path::Path;

use tracing::warn;
use walkdir::WalkDir;

/// Returns the total byte size of a file or directory tree.
///
/// A file contributes its length. A directory contributes the sum of every
/// regular file reachable below it; symlinks are followed and count as their
/// target. Unreadable entries are logged and contribute 0, so this never
/// fails the caller.
pub fn estimate_size(path: &Path) -> u64 {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot stat path, counting as 0 bytes");
            return 0;
        }
    };

    if metadata.is_file() {
        return metadata.len();
    }
    if !metadata.is_dir() {
        return 0;
    }

    let mut total: u64 = 0;
    for entry in WalkDir::new(path).follow_links(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match entry.metadata() {
            Ok(m) => total += m.len(),
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "cannot stat file, counting as 0 bytes");
            }
        }
    }
    total
}
