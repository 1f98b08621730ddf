use std::io;
use std::path::{Path, PathBuf};

use pushdeck_transfer::local_file_name;
use tracing::{debug, warn};

use crate::archiver::{ArchiveSummary, create_archive};
use crate::{ARCHIVE_EXTENSION, ArchiveError};

/// One directory packaged into a temporary archive for a single unit.
///
/// The temporary file is removed by [`ArchiveJob::cleanup`] and again when
/// the job is dropped, so it never outlives the unit that created it.
#[derive(Debug)]
pub struct ArchiveJob {
    name: String,
    source: PathBuf,
    target: PathBuf,
    size: Option<u64>,
}

impl ArchiveJob {
    /// Prepares a job writing `<temp_dir>/<base name>.zip`.
    pub fn new(source: &Path, temp_dir: &Path) -> Result<Self, ArchiveError> {
        let name = local_file_name(source)?;
        let target = temp_dir.join(format!("{name}.{ARCHIVE_EXTENSION}"));
        Ok(Self {
            name,
            source: source.to_path_buf(),
            target,
            size: None,
        })
    }

    /// Base name of the source directory.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name of the produced archive (`<name>.zip`).
    pub fn archive_name(&self) -> String {
        format!("{}.{ARCHIVE_EXTENSION}", self.name)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Temporary archive location.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Archive size, once packaged.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Packages the source directory. `on_progress` receives compressed
    /// bytes written so far.
    pub async fn run<F>(&mut self, on_progress: F) -> Result<ArchiveSummary, ArchiveError>
    where
        F: FnMut(u64) + Send + 'static,
    {
        let summary = create_archive(self.source.clone(), self.target.clone(), on_progress).await?;
        self.size = Some(summary.size);
        Ok(summary)
    }

    /// Removes the temporary archive if it exists.
    pub fn cleanup(&self) {
        match std::fs::remove_file(&self.target) {
            Ok(()) => debug!(target = %self.target.display(), "temporary archive removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(target = %self.target.display(), error = %e, "cannot remove temporary archive")
            }
        }
    }
}

impl Drop for ArchiveJob {
    fn drop(&mut self) {
        self.cleanup();
    }
}
