//! Data types for the upload flow.

use pushdeck_protocol::{ProgressEvent, UnitErrorEvent, UploadOutcome, UploadStage};

/// Event emitted while an upload runs.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// Cumulative byte progress.
    Progress(ProgressEvent),
    /// A unit entered a new stage.
    Stage { unit: String, stage: UploadStage },
    /// A batch unit was transferred and verified.
    UnitCompleted { unit: String },
    /// A batch unit failed; the batch continues.
    UnitFailed(UnitErrorEvent),
}

/// Output of a remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: Option<u32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Which strategy moved an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMethod {
    /// Whole-file put.
    Primary,
    /// Chunked streaming after the put failed.
    Fallback,
}

/// Summary of a directory-tree transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeReport {
    /// Remote directory that mirrors the local root.
    pub remote_root: String,
    pub files: usize,
    pub bytes: u64,
}

/// A batch unit that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    pub unit: String,
    pub reason: String,
}

/// Aggregate result of a batch upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    /// Completed units, in processing order.
    pub successful: Vec<String>,
    pub failures: Vec<UnitFailure>,
}

impl BatchResult {
    /// True when at least one unit completed.
    pub fn success(&self) -> bool {
        !self.successful.is_empty()
    }

    pub fn total(&self) -> usize {
        self.successful.len() + self.failures.len()
    }

    /// Operator-facing summary listing every failed unit.
    pub fn message(&self) -> String {
        let failed = self
            .failures
            .iter()
            .map(|f| format!("{} ({})", f.unit, f.reason))
            .collect::<Vec<_>>()
            .join(", ");

        if !self.success() {
            return format!("all {} folder(s) failed: {failed}", self.total());
        }

        let mut message = format!(
            "uploaded {} folder(s): {}",
            self.successful.len(),
            self.successful.join(", ")
        );
        if !self.failures.is_empty() {
            message.push_str(&format!("; failed: {failed}"));
        }
        message
    }
}

impl From<BatchResult> for UploadOutcome {
    fn from(result: BatchResult) -> Self {
        UploadOutcome {
            success: result.success(),
            message: result.message(),
            successful_units: result.successful,
        }
    }
}
