//! Byte movement for one unit: single file, directory tree, or archive
//! with fallback.

use std::path::Path;

use futures_util::stream::{self, TryStreamExt};
use pushdeck_protocol::percentage;
use pushdeck_transfer::{
    ChunkReader, MAX_TREE_CONCURRENCY, PipeSummary, ProgressAggregator, join_remote, pipe_chunked,
    plan_tree,
};
use tracing::{debug, info, warn};

use crate::error::UploadError;
use crate::options::UploadOptions;
use crate::session::ConnectionSession;
use crate::types::{TransferMethod, TreeReport};

/// Moves local bytes through a borrowed [`ConnectionSession`].
pub struct Transferor<'a> {
    session: &'a ConnectionSession,
    options: &'a UploadOptions,
}

impl<'a> Transferor<'a> {
    pub fn new(session: &'a ConnectionSession, options: &'a UploadOptions) -> Self {
        Self { session, options }
    }

    /// Sends one file with the whole-file primitive, reporting each step.
    ///
    /// There is no fallback here; a failure is returned as
    /// [`UploadError::Transfer`].
    pub async fn send_file(
        &self,
        local: &Path,
        remote: &str,
        progress: &ProgressAggregator,
    ) -> Result<u64, UploadError> {
        let step = |transferred: u64, _total: u64| {
            progress.observe_partial(transferred);
        };
        let sent = self
            .session
            .shell()
            .fast_put(local, remote, &step)
            .await
            .map_err(|e| UploadError::Transfer(format!("{}: {e}", local.display())))?;

        progress.advance(sent);
        info!(remote, bytes = sent, "file transferred");
        Ok(sent)
    }

    /// Mirrors `local_dir` under `remote_dir/<base name of local_dir>`.
    ///
    /// Up to `tree_concurrency` files are in flight at once; each completed
    /// file advances progress by its size. The first failing file aborts
    /// the tree once in-flight transfers settle.
    pub async fn send_tree(
        &self,
        local_dir: &Path,
        remote_dir: &str,
        progress: &ProgressAggregator,
    ) -> Result<TreeReport, UploadError> {
        let plan = tokio::task::spawn_blocking({
            let root = local_dir.to_path_buf();
            let exclusions = self.options.exclusions.clone();
            move || {
                let refs: Vec<&str> = exclusions.iter().map(String::as_str).collect();
                plan_tree(&root, &refs)
            }
        })
        .await??;

        let remote_root = join_remote(remote_dir, &plan.root_name);
        let mut directories = Vec::with_capacity(plan.directories.len() + 1);
        directories.push(remote_root.clone());
        directories.extend(plan.directories.iter().map(|d| join_remote(&remote_root, d)));
        self.session.ensure_remote_directories(&directories).await?;

        debug!(
            root = %remote_root,
            files = plan.files.len(),
            directories = plan.directories.len(),
            "tree planned"
        );

        let shell = self.session.shell();
        let root = remote_root.as_str();
        let limit = self.options.tree_concurrency.clamp(1, MAX_TREE_CONCURRENCY);
        stream::iter(plan.files.iter().map(Ok::<_, UploadError>))
            .try_for_each_concurrent(limit, move |file| {
                async move {
                    let remote = join_remote(root, &file.relative);
                    let noop = |_: u64, _: u64| {};
                    shell
                        .fast_put(&file.local, &remote, &noop)
                        .await
                        .map_err(|e| UploadError::Transfer(format!("{}: {e}", file.relative)))?;
                    progress.advance(file.size);
                    debug!(file = %file.relative, bytes = file.size, "tree file transferred");
                    Ok::<(), UploadError>(())
                }
            })
            .await?;

        let report = TreeReport {
            remote_root,
            files: plan.files.len(),
            bytes: plan.total_bytes(),
        };
        info!(root = %report.remote_root, files = report.files, bytes = report.bytes, "tree transferred");
        Ok(report)
    }

    /// Sends an archive with the plain put, falling back to chunked
    /// streaming if the put fails for any reason.
    pub async fn send_with_fallback(
        &self,
        local: &Path,
        remote: &str,
        size: u64,
        progress: &ProgressAggregator,
    ) -> Result<TransferMethod, UploadError> {
        match self.session.shell().put_file(local, remote).await {
            Ok(sent) => {
                progress.advance(size);
                info!(remote, bytes = sent, "archive transferred");
                Ok(TransferMethod::Primary)
            }
            Err(e) => {
                warn!(remote, error = %e, "primary transfer failed, streaming in chunks");
                let summary = self.stream_chunks(local, remote, size, progress).await?;
                info!(
                    remote,
                    bytes = summary.bytes_written,
                    chunks = summary.chunks,
                    "archive transferred by fallback"
                );
                Ok(TransferMethod::Fallback)
            }
        }
    }

    async fn stream_chunks(
        &self,
        local: &Path,
        remote: &str,
        size: u64,
        progress: &ProgressAggregator,
    ) -> Result<PipeSummary, UploadError> {
        let reader = ChunkReader::open(local, self.options.chunk_size)
            .await
            .map_err(|e| fallback_error(remote, e))?;
        let writer = self
            .session
            .shell()
            .open_write(remote)
            .await
            .map_err(|e| fallback_error(remote, e))?;

        let mut unit_bytes: u64 = 0;
        pipe_chunked(reader, writer, |n| {
            unit_bytes += n;
            progress.advance(n);
            debug!(
                remote,
                percent = percentage(unit_bytes, size),
                sent = unit_bytes,
                total = size,
                "chunk written"
            );
        })
        .await
        .map_err(|e| fallback_error(remote, e))
    }
}

fn fallback_error(remote: &str, e: impl std::fmt::Display) -> UploadError {
    UploadError::TransferFallback(format!("{remote}: {e}"))
}
