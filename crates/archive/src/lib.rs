//! Directory packaging for batch uploads.
//!
//! A directory is packed into a deflate-compressed zip archive in a
//! temporary location, validated leniently, transferred, then removed.

mod archiver;
mod error;
mod job;
mod validation;

pub use archiver::{ArchiveSummary, create_archive, create_archive_blocking};
pub use error::ArchiveError;
pub use job::ArchiveJob;
pub use validation::{ArchiveCheck, validate_archive};

/// Extension of produced archives.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Deflate level for non-empty archives.
pub const COMPRESSION_LEVEL: i32 = 6;

/// Comment stored in every regular archive.
pub const ARCHIVE_COMMENT: &str = "Created by pushdeck";

/// Comment stored in the placeholder archive of an empty directory.
pub const EMPTY_ARCHIVE_COMMENT: &str = "Created by pushdeck - Empty Folder";

/// Entry written when the source directory has no entries.
pub const PLACEHOLDER_NAME: &str = "README_EMPTY_FOLDER.txt";

/// Contents of [`PLACEHOLDER_NAME`].
pub const PLACEHOLDER_CONTENTS: &str = "This is an empty folder.";
