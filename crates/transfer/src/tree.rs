//! Directory-tree planning for recursive uploads.
//!
//! Walks a local directory and produces the remote directories to create
//! and the files to send, with relative paths normalized to forward
//! slashes. Excluded components (VCS metadata) are pruned during the walk.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::TransferError;
use crate::remote_path::local_file_name;
use crate::validation::{is_excluded, validate_relative_path};

/// One regular file inside a planned tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFile {
    /// Absolute local path.
    pub local: PathBuf,
    /// Path relative to the tree root, `/`-separated.
    pub relative: String,
    pub size: u64,
}

/// Everything needed to mirror a local directory remotely.
#[derive(Debug, Clone, Default)]
pub struct TreePlan {
    /// Base name of the local root; the remote destination gains a
    /// subdirectory with this name.
    pub root_name: String,
    /// Subdirectories relative to the root, parents before children.
    pub directories: Vec<String>,
    pub files: Vec<TreeFile>,
}

impl TreePlan {
    /// Sum of all planned file sizes.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// Plans the upload of the directory at `root`.
///
/// Entries with a path component in `exclusions` are skipped along with
/// everything below them.
pub fn plan_tree(root: &Path, exclusions: &[&str]) -> Result<TreePlan, TransferError> {
    let mut plan = TreePlan {
        root_name: local_file_name(root)?,
        ..Default::default()
    };

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .map(|rel| !is_excluded(rel, exclusions))
                .unwrap_or(true)
        });

    for entry in walker {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| TransferError::InvalidPath(e.to_string()))?;
        validate_relative_path(rel)?;
        let rel_str = normalize(rel);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            plan.directories.push(rel_str);
        } else if file_type.is_file() {
            let size = entry.metadata()?.len();
            plan.files.push(TreeFile {
                local: entry.path().to_path_buf(),
                relative: rel_str,
                size,
            });
        }
    }

    Ok(plan)
}

fn normalize(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
