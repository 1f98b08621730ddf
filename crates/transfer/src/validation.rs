use std::path::{Component, Path};

use crate::TransferError;

/// Validates that a path relative to a tree root stays inside that root.
///
/// Rejects:
/// - Empty paths
/// - Absolute paths (Unix `/` or Windows `C:\`)
/// - Parent directory traversal (`..`)
/// - Windows prefix components (`C:`, `\\server`)
pub fn validate_relative_path(relative: &Path) -> Result<(), TransferError> {
    let shown = relative.display();
    if relative.as_os_str().is_empty() {
        return Err(TransferError::InvalidPath("empty path".into()));
    }

    if relative.is_absolute() {
        return Err(TransferError::InvalidPath(format!(
            "absolute path not allowed: {shown}"
        )));
    }

    for component in relative.components() {
        match component {
            Component::ParentDir => {
                return Err(TransferError::InvalidPath(format!(
                    "parent directory traversal not allowed: {shown}"
                )));
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(TransferError::InvalidPath(format!(
                    "absolute path not allowed: {shown}"
                )));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    Ok(())
}

/// Returns true if any component of `path` equals one of `exclusions`.
///
/// Matching is by whole component, so `.git` excludes `repo/.git/HEAD` but
/// not `notes.gitignore` or `.github/`.
pub fn is_excluded(path: &Path, exclusions: &[&str]) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => exclusions.iter().any(|ex| name == *ex),
        _ => false,
    })
}

/// Makes a name safe for use as an archive entry.
///
/// Every character outside `[A-Za-z0-9_.-]` becomes `_`.
pub fn sanitize_entry_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
