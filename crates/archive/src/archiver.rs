use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use pushdeck_transfer::{local_file_name, sanitize_entry_name};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::validation::{ArchiveCheck, validate_archive};
use crate::{
    ARCHIVE_COMMENT, ArchiveError, COMPRESSION_LEVEL, EMPTY_ARCHIVE_COMMENT, PLACEHOLDER_CONTENTS,
    PLACEHOLDER_NAME,
};

/// Minimum growth of the output between two progress callbacks.
const PROGRESS_STEP: u64 = 64 * 1024;

/// Result of a completed, validated packaging run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    /// Final archive size in bytes.
    pub size: u64,
    /// Number of entries written, directories included.
    pub entries: usize,
    /// True when the source had no entries and a placeholder was written.
    pub placeholder: bool,
    pub check: ArchiveCheck,
}

/// Packages `source` into `target` on a blocking worker thread.
///
/// `on_progress` receives the number of compressed bytes written so far.
pub async fn create_archive<F>(
    source: PathBuf,
    target: PathBuf,
    mut on_progress: F,
) -> Result<ArchiveSummary, ArchiveError>
where
    F: FnMut(u64) + Send + 'static,
{
    tokio::task::spawn_blocking(move || create_archive_blocking(&source, &target, &mut on_progress))
        .await
        .map_err(|e| ArchiveError::Task(e.to_string()))?
}

/// Packages `source` into `target`.
///
/// The call returns only after the archive has been finalized, flushed to
/// disk and validated. On any failure the target file is removed.
pub fn create_archive_blocking(
    source: &Path,
    target: &Path,
    on_progress: &mut dyn FnMut(u64),
) -> Result<ArchiveSummary, ArchiveError> {
    preflight(source, target)?;

    info!(source = %source.display(), target = %target.display(), "packaging directory");

    let result = package(source, target, on_progress).and_then(|(entries, placeholder)| {
        let size = fs::metadata(target)?.len();
        let check = validate_archive(target)?;
        Ok(ArchiveSummary {
            path: target.to_path_buf(),
            size,
            entries,
            placeholder,
            check,
        })
    });

    match result {
        Ok(summary) => {
            on_progress(summary.size);
            info!(
                target = %target.display(),
                bytes = summary.size,
                entries = summary.entries,
                "archive ready"
            );
            Ok(summary)
        }
        Err(e) => {
            remove_partial(target);
            Err(e)
        }
    }
}

fn preflight(source: &Path, target: &Path) -> Result<(), ArchiveError> {
    let metadata = match fs::metadata(source) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ArchiveError::SourceMissing(source.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    if !metadata.is_dir() {
        return Err(ArchiveError::NotADirectory(source.to_path_buf()));
    }

    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    if target.exists() {
        debug!(target = %target.display(), "removing stale archive");
        fs::remove_file(target)?;
    }
    Ok(())
}

/// Writes the archive; returns the entry count and whether it is a placeholder.
fn package(
    source: &Path,
    target: &Path,
    on_progress: &mut dyn FnMut(u64),
) -> Result<(usize, bool), ArchiveError> {
    let is_empty = fs::read_dir(source)?.next().is_none();

    let file = File::create(target)?;
    let writer = ProgressWriter::new(BufWriter::new(file), on_progress);
    let mut zip = ZipWriter::new(writer);

    let entries = if is_empty {
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);
        zip.start_file(PLACEHOLDER_NAME, options)?;
        zip.write_all(PLACEHOLDER_CONTENTS.as_bytes())?;
        zip.set_comment(EMPTY_ARCHIVE_COMMENT);
        1
    } else {
        let root = sanitize_entry_name(&local_file_name(source)?);
        let count = add_tree(&mut zip, source, &root)?;
        zip.set_comment(ARCHIVE_COMMENT);
        count
    };

    let writer = zip.finish()?;
    let file = writer.into_inner().into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;

    Ok((entries, is_empty))
}

fn add_tree<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    source: &Path,
    root: &str,
) -> Result<usize, ArchiveError> {
    let base = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));

    zip.add_directory(format!("{root}/"), base)?;
    let mut entries = 1;

    for entry in WalkDir::new(source)
        .follow_links(true)
        .sort_by_file_name()
        .min_depth(1)
    {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let name = format!("{root}/{rel}");

        let file_type = entry.file_type();
        if file_type.is_dir() {
            zip.add_directory(format!("{name}/"), base)?;
        } else if file_type.is_file() {
            let len = entry.metadata()?.len();
            let options = base.large_file(len > u64::from(u32::MAX));
            zip.start_file(name, options)?;
            let mut input = File::open(entry.path())?;
            io::copy(&mut input, &mut *zip)?;
        } else {
            debug!(path = %entry.path().display(), "skipping special file");
            continue;
        }
        entries += 1;
    }

    Ok(entries)
}

fn remove_partial(target: &Path) {
    match fs::remove_file(target) {
        Ok(()) => debug!(target = %target.display(), "removed partial archive"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(target = %target.display(), error = %e, "cannot remove partial archive"),
    }
}

// ---------------------------------------------------------------------------
// ProgressWriter
// ---------------------------------------------------------------------------

/// Tracks the high-water mark of bytes written through a seekable writer.
///
/// The zip writer seeks back to patch local headers, so the reported value
/// is the furthest position ever reached rather than the current one.
struct ProgressWriter<'a, W> {
    inner: W,
    position: u64,
    high_water: u64,
    last_reported: u64,
    on_progress: &'a mut dyn FnMut(u64),
}

impl<'a, W> ProgressWriter<'a, W> {
    fn new(inner: W, on_progress: &'a mut dyn FnMut(u64)) -> Self {
        Self {
            inner,
            position: 0,
            high_water: 0,
            last_reported: 0,
            on_progress,
        }
    }

    fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for ProgressWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        if self.position > self.high_water {
            self.high_water = self.position;
            if self.high_water - self.last_reported >= PROGRESS_STEP {
                self.last_reported = self.high_water;
                (self.on_progress)(self.high_water);
            }
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Seek> Seek for ProgressWriter<'_, W> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.position = self.inner.seek(pos)?;
        Ok(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn entry_names(path: &Path) -> Vec<String> {
        let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[test]
    fn empty_directory_gets_placeholder() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a");
        fs::create_dir(&source).unwrap();
        let target = dir.path().join("out").join("a.zip");

        let summary = create_archive_blocking(&source, &target, &mut |_| {}).unwrap();

        assert!(summary.placeholder);
        assert!(summary.size > 0);
        assert!(matches!(summary.check, ArchiveCheck::EndRecordFound { .. }));

        let mut archive = ZipArchive::new(File::open(&target).unwrap()).unwrap();
        assert_eq!(archive.comment(), EMPTY_ARCHIVE_COMMENT.as_bytes());
        let mut entry = archive.by_name(PLACEHOLDER_NAME).unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Stored);
        let mut text = String::new();
        entry.read_to_string(&mut text).unwrap();
        assert_eq!(text, PLACEHOLDER_CONTENTS);
    }

    #[test]
    fn contents_live_under_sanitized_root() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("my photos");
        fs::create_dir_all(source.join("2024")).unwrap();
        fs::write(source.join("cover.jpg"), vec![1u8; 2048]).unwrap();
        fs::write(source.join("2024").join("beach.jpg"), vec![2u8; 4096]).unwrap();
        let target = dir.path().join("my photos.zip");

        let summary = create_archive_blocking(&source, &target, &mut |_| {}).unwrap();

        assert!(!summary.placeholder);
        assert_eq!(summary.entries, 4);
        assert_eq!(
            entry_names(&target),
            vec![
                "my_photos/",
                "my_photos/2024/",
                "my_photos/2024/beach.jpg",
                "my_photos/cover.jpg"
            ]
        );

        let mut archive = ZipArchive::new(File::open(&target).unwrap()).unwrap();
        assert_eq!(archive.comment(), ARCHIVE_COMMENT.as_bytes());
        let mut beach = archive.by_name("my_photos/2024/beach.jpg").unwrap();
        assert_eq!(beach.compression(), CompressionMethod::Deflated);
        let mut data = Vec::new();
        beach.read_to_end(&mut data).unwrap();
        assert_eq!(data, vec![2u8; 4096]);
    }

    #[test]
    fn only_empty_subdirectories_is_not_a_placeholder() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("shell");
        fs::create_dir_all(source.join("inner")).unwrap();
        let target = dir.path().join("shell.zip");

        let summary = create_archive_blocking(&source, &target, &mut |_| {}).unwrap();
        assert!(!summary.placeholder);
        assert_eq!(entry_names(&target), vec!["shell/", "shell/inner/"]);
    }

    #[test]
    fn missing_source_fails_without_output() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("gone.zip");
        let result = create_archive_blocking(&dir.path().join("gone"), &target, &mut |_| {});
        assert!(matches!(result, Err(ArchiveError::SourceMissing(_))));
        assert!(!target.exists());
    }

    #[test]
    fn file_source_is_rejected() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("file.txt");
        fs::write(&source, b"x").unwrap();
        let result = create_archive_blocking(&source, &dir.path().join("f.zip"), &mut |_| {});
        assert!(matches!(result, Err(ArchiveError::NotADirectory(_))));
    }

    #[test]
    fn stale_target_is_replaced() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("b");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("data.bin"), vec![9u8; 100]).unwrap();
        let target = dir.path().join("b.zip");
        fs::write(&target, b"stale garbage from an earlier run").unwrap();

        create_archive_blocking(&source, &target, &mut |_| {}).unwrap();
        assert_eq!(entry_names(&target), vec!["b/", "b/data.bin"]);
    }

    #[test]
    fn progress_is_monotonic_and_ends_at_size() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("noise");
        fs::create_dir(&source).unwrap();
        // Pseudo-random bytes so deflate cannot shrink them much.
        let mut state: u32 = 0x1234_5678;
        let data: Vec<u8> = (0..600_000)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 24) as u8
            })
            .collect();
        fs::write(source.join("noise.bin"), &data).unwrap();
        let target = dir.path().join("noise.zip");

        let mut seen = Vec::new();
        let summary = create_archive_blocking(&source, &target, &mut |n| seen.push(n)).unwrap();

        assert!(seen.len() > 2);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*seen.last().unwrap(), summary.size);
    }

    #[tokio::test]
    async fn async_wrapper_runs_on_blocking_pool() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("c");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("x.txt"), b"hello").unwrap();
        let target = dir.path().join("c.zip");

        let summary = create_archive(source, target.clone(), |_| {}).await.unwrap();
        assert_eq!(summary.path, target);
        assert_eq!(summary.size, fs::metadata(&target).unwrap().len());
    }
}
