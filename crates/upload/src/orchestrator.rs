//! Upload orchestrator.
//!
//! Drives a single-path upload or a sequential batch of archived
//! directories through one connection, emitting progress, stage and
//! per-unit events on a bounded channel.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pushdeck_archive::ArchiveJob;
use pushdeck_protocol::{
    BatchUploadRequest, ConnectionCredentials, ProgressEvent, UnitErrorEvent, UploadOutcome,
    UploadRequest, UploadStage,
};
use pushdeck_transfer::{
    ProgressAggregator, TransferUnit, UnitKind, estimate_size, join_remote, local_file_name,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::error::UploadError;
use crate::options::UploadOptions;
use crate::remote::SessionConnector;
use crate::session::ConnectionSession;
use crate::transferor::Transferor;
use crate::types::{BatchResult, UnitFailure, UploadEvent};
use crate::verifier::Verifier;

/// Message of a successful single-path upload.
const SINGLE_SUCCESS_MESSAGE: &str = "upload succeeded";

/// Orchestrates uploads over connections opened by a [`SessionConnector`].
///
/// Events must be consumed concurrently with a running upload: progress
/// and stage events are dropped when the channel is full, while unit
/// results and the final progress event wait for room.
pub struct UploadOrchestrator {
    connector: Arc<dyn SessionConnector>,
    options: UploadOptions,
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
}

impl UploadOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(connector: Arc<dyn SessionConnector>, options: UploadOptions) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            connector,
            options,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    // -----------------------------------------------------------------------
    // Caller-facing operations
    // -----------------------------------------------------------------------

    /// Uploads one file or directory and reports `{success, message}`.
    pub async fn estimate_and_upload(&self, request: &UploadRequest) -> UploadOutcome {
        match self.upload(request).await {
            Ok(_) => UploadOutcome::succeeded(SINGLE_SUCCESS_MESSAGE),
            Err(e) => UploadOutcome::failed(e.to_string()),
        }
    }

    /// Archives and uploads each directory, isolating unit failures.
    pub async fn upload_batch_archived(&self, request: &BatchUploadRequest) -> UploadOutcome {
        match self.upload_batch(request).await {
            Ok(result) => result.into(),
            Err(e) => UploadOutcome::failed(e.to_string()),
        }
    }

    // -----------------------------------------------------------------------
    // Single-path mode
    // -----------------------------------------------------------------------

    /// Single-path mode: size, connect, ensure the remote directory,
    /// transfer, verify (files only), dispose.
    ///
    /// The first fatal error is returned as is.
    pub async fn upload(&self, request: &UploadRequest) -> Result<TransferUnit, UploadError> {
        request.validate()?;
        let local = PathBuf::from(&request.local_path);
        let label = unit_label(&local);

        let result = self.upload_single(&local, &label, request).await;
        match &result {
            Ok(unit) => {
                self.stage(&label, UploadStage::Done);
                info!(unit = %label, bytes = unit.size(), "upload finished");
            }
            Err(e) => {
                self.stage(&label, UploadStage::Failed);
                error!(unit = %label, error = %e, "upload failed");
            }
        }
        result
    }

    async fn upload_single(
        &self,
        local: &Path,
        label: &str,
        request: &UploadRequest,
    ) -> Result<TransferUnit, UploadError> {
        self.stage(label, UploadStage::Sizing);
        let metadata = match tokio::fs::metadata(local).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(UploadError::LocalPathNotFound(local.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        let name = local_file_name(local)?;
        let kind = if metadata.is_dir() {
            UnitKind::Directory
        } else {
            UnitKind::File
        };
        let total = size_of(local).await?;
        let remote = join_remote(&request.remote_path, &name);
        let mut unit = TransferUnit::new(&name, local, kind, total, remote);
        debug!(unit = %name, ?kind, bytes = total, "sized");

        let progress = self.aggregator(total);

        self.stage(label, UploadStage::Connecting);
        let session = self.connect(&request.credentials).await?;
        unit.start();
        let body = self
            .single_body(&session, &unit, &request.remote_path, &progress)
            .await;
        session.dispose().await;

        if let Err(e) = body {
            unit.fail(&e.to_string());
            return Err(e);
        }
        unit.verify();
        self.emit(UploadEvent::Progress(progress.finish())).await;
        Ok(unit)
    }

    async fn single_body(
        &self,
        session: &ConnectionSession,
        unit: &TransferUnit,
        remote_dir: &str,
        progress: &ProgressAggregator,
    ) -> Result<(), UploadError> {
        session.ensure_remote_directory(remote_dir).await?;

        let transferor = Transferor::new(session, &self.options);
        let label = unit.name().to_string();
        self.stage(&label, UploadStage::Transferring);

        match unit.kind() {
            UnitKind::File | UnitKind::Archive => {
                transferor
                    .send_file(unit.source(), unit.remote_path(), progress)
                    .await?;
                self.stage(&label, UploadStage::Verifying);
                Verifier::new(session)
                    .verify(unit.remote_path(), unit.size())
                    .await?;
            }
            UnitKind::Directory => {
                let report = transferor
                    .send_tree(unit.source(), remote_dir, progress)
                    .await?;
                debug!(unit = %label, root = %report.remote_root, files = report.files, "tree done");
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Batch archive mode
    // -----------------------------------------------------------------------

    /// Batch archive mode: one shared connection, units strictly in order.
    ///
    /// A unit failure is recorded and the batch moves on. Only request
    /// validation, connection and shared remote-directory failures abort
    /// the batch. The connection is disposed exactly once.
    pub async fn upload_batch(
        &self,
        request: &BatchUploadRequest,
    ) -> Result<BatchResult, UploadError> {
        request.validate()?;
        let sources: Vec<PathBuf> = request.folder_paths.iter().map(PathBuf::from).collect();

        let mut total: u64 = 0;
        for source in &sources {
            self.stage(&unit_label(source), UploadStage::Sizing);
            total += size_of(source).await?;
        }
        info!(units = sources.len(), bytes = total, "batch sized");
        let progress = self.aggregator(total);

        for source in &sources {
            self.stage(&unit_label(source), UploadStage::Connecting);
        }
        let session = self.connect(&request.credentials).await?;
        let body = self
            .batch_body(&session, &sources, &request.remote_path, &progress)
            .await;
        session.dispose().await;
        let result = body?;

        self.emit(UploadEvent::Progress(progress.finish())).await;
        info!(
            succeeded = result.successful.len(),
            failed = result.failures.len(),
            "batch finished"
        );
        Ok(result)
    }

    async fn batch_body(
        &self,
        session: &ConnectionSession,
        sources: &[PathBuf],
        remote_dir: &str,
        progress: &Arc<ProgressAggregator>,
    ) -> Result<BatchResult, UploadError> {
        session.ensure_remote_directory(remote_dir).await?;

        let mut result = BatchResult::default();
        for source in sources {
            let label = unit_label(source);
            match self.batch_unit(session, source, &label, remote_dir, progress).await {
                Ok(()) => {
                    self.stage(&label, UploadStage::Done);
                    self.emit(UploadEvent::UnitCompleted {
                        unit: label.clone(),
                    })
                    .await;
                    result.successful.push(label);
                }
                Err(e) => {
                    let reason = e.to_string();
                    error!(unit = %label, error = %reason, "batch unit failed");
                    self.stage(&label, UploadStage::Failed);
                    self.emit(UploadEvent::UnitFailed(UnitErrorEvent {
                        unit: label.clone(),
                        message: reason.clone(),
                    }))
                    .await;
                    result.failures.push(UnitFailure {
                        unit: label,
                        reason,
                    });
                }
            }
        }
        Ok(result)
    }

    /// Compress, transfer (primary then fallback), verify, clean up.
    ///
    /// The temporary archive is owned by the job and removed on every
    /// path out of this function.
    async fn batch_unit(
        &self,
        session: &ConnectionSession,
        source: &Path,
        label: &str,
        remote_dir: &str,
        progress: &Arc<ProgressAggregator>,
    ) -> Result<(), UploadError> {
        self.stage(label, UploadStage::Compressing);
        let mut job = ArchiveJob::new(source, &self.options.temp_dir)?;
        let summary = job
            .run({
                let progress = Arc::clone(progress);
                move |compressed| {
                    progress.observe_partial(compressed);
                }
            })
            .await?;

        let remote = join_remote(remote_dir, &job.archive_name());
        let mut unit = TransferUnit::new(
            job.name(),
            job.target(),
            UnitKind::Archive,
            summary.size,
            remote.as_str(),
        );
        unit.start();

        self.stage(label, UploadStage::Transferring);
        let method = Transferor::new(session, &self.options)
            .send_with_fallback(job.target(), &remote, summary.size, progress)
            .await?;

        self.stage(label, UploadStage::Verifying);
        Verifier::new(session).verify(&remote, summary.size).await?;
        unit.verify();

        self.stage(label, UploadStage::Cleanup);
        job.cleanup();
        debug!(unit = %label, ?method, elapsed = ?unit.elapsed(), "unit verified");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn connect(
        &self,
        credentials: &ConnectionCredentials,
    ) -> Result<ConnectionSession, UploadError> {
        ConnectionSession::connect(
            self.connector.as_ref(),
            credentials,
            self.options.connect_timeout,
        )
        .await
    }

    /// Aggregator whose events go to the channel without blocking.
    fn aggregator(&self, total: u64) -> Arc<ProgressAggregator> {
        let tx = self.events_tx.clone();
        Arc::new(ProgressAggregator::new(
            total,
            Box::new(move |event: ProgressEvent| {
                let _ = tx.try_send(UploadEvent::Progress(event));
            }),
        ))
    }

    fn stage(&self, unit: &str, stage: UploadStage) {
        debug!(unit, %stage, "stage");
        let _ = self.events_tx.try_send(UploadEvent::Stage {
            unit: unit.to_string(),
            stage,
        });
    }

    async fn emit(&self, event: UploadEvent) {
        let _ = self.events_tx.send(event).await;
    }
}

/// Byte size of a local path, computed off the async runtime.
async fn size_of(path: &Path) -> Result<u64, UploadError> {
    let path = path.to_path_buf();
    Ok(tokio::task::spawn_blocking(move || estimate_size(&path)).await?)
}

/// Display name of a unit: its base name, or the whole path if it has none.
fn unit_label(path: &Path) -> String {
    local_file_name(path).unwrap_or_else(|_| path.display().to_string())
}
