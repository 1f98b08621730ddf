//! Lenient structural validation of produced archives.
//!
//! Packaging libraries do not always place the end-of-central-directory
//! record in the last 22 bytes, so the whole read window is searched and a
//! missing record is only a warning. The one fatal condition is a zero-byte
//! file.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, warn};

use crate::ArchiveError;

/// `PK\x03\x04`
const LOCAL_HEADER_SIGNATURE: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];
/// `PK\x05\x06`
const END_RECORD_SIGNATURE: [u8; 4] = [0x50, 0x4b, 0x05, 0x06];

/// Files below this size are read whole.
const FULL_READ_LIMIT: u64 = 1024 * 1024;
/// Trailing bytes read from larger files.
const TAIL_WINDOW: u64 = 50 * 1024;

/// Outcome of a lenient archive check. Every variant is an accepted archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveCheck {
    /// End-of-central-directory signature found at this file offset.
    EndRecordFound { offset: u64 },
    /// Starts with a local file header but no end record in the read window.
    HeaderOnly,
    /// Neither signature matched; accepted because the file is non-empty.
    Unrecognized,
}

/// Checks the archive at `path`.
///
/// Fails only when the file cannot be read or is zero bytes long.
pub fn validate_archive(path: &Path) -> Result<ArchiveCheck, ArchiveError> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    if size == 0 {
        return Err(ArchiveError::EmptyArchive(path.to_path_buf()));
    }

    let mut head = [0u8; 4];
    let head_len = read_up_to(&mut file, &mut head)?;
    let header_ok = head_len == 4 && head == LOCAL_HEADER_SIGNATURE;

    let window_start = if size < FULL_READ_LIMIT {
        0
    } else {
        size.saturating_sub(TAIL_WINDOW)
    };
    file.seek(SeekFrom::Start(window_start))?;
    let mut window = Vec::with_capacity((size - window_start) as usize);
    file.read_to_end(&mut window)?;

    if let Some(pos) = window
        .windows(END_RECORD_SIGNATURE.len())
        .rposition(|w| w == END_RECORD_SIGNATURE)
    {
        let offset = window_start + pos as u64;
        debug!(path = %path.display(), size, offset, "archive end record found");
        if !header_ok {
            warn!(path = %path.display(), "archive has an end record but an unexpected header");
        }
        return Ok(ArchiveCheck::EndRecordFound { offset });
    }

    if header_ok {
        warn!(path = %path.display(), size, "archive end record not found, accepting on header");
        Ok(ArchiveCheck::HeaderOnly)
    } else {
        warn!(path = %path.display(), size, "archive signatures not recognized, accepting non-empty file");
        Ok(ArchiveCheck::Unrecognized)
    }
}

fn read_up_to(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
