//! Remote (POSIX) path helpers.
//!
//! Remote paths are always `/`-separated strings, independent of the local
//! platform's separator.

use std::path::Path;

use crate::TransferError;

/// Joins a remote directory and a child name with exactly one `/`.
pub fn join_remote(dir: &str, child: &str) -> String {
    let child = child.trim_start_matches('/');
    if dir.is_empty() {
        return child.to_string();
    }
    if dir.ends_with('/') {
        format!("{dir}{child}")
    } else {
        format!("{dir}/{child}")
    }
}

/// Returns the final component of a local path as UTF-8.
///
/// Fails for paths without a final component (`/`, `..`) or with a
/// non-UTF-8 name, since such names cannot be mapped onto a remote path.
pub fn local_file_name(path: &Path) -> Result<String, TransferError> {
    let name = path.file_name().ok_or_else(|| {
        TransferError::InvalidPath(format!("no file name in {}", path.display()))
    })?;
    name.to_str().map(str::to_string).ok_or_else(|| {
        TransferError::InvalidPath(format!("non UTF-8 file name in {}", path.display()))
    })
}

/// Quotes `value` for a POSIX shell with single quotes.
pub fn shell_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}
