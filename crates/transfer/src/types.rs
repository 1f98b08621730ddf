use std::path::PathBuf;
use std::time::{Duration, Instant};

use pushdeck_protocol::UnitStatus;

/// A chunk of file data read by the fallback transfer.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Byte offset within the file.
    pub offset: u64,
    /// Raw chunk data.
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// What a transfer unit moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// One regular file, sent as-is.
    File,
    /// A directory tree uploaded file by file.
    Directory,
    /// A directory packaged into an archive before transfer.
    Archive,
}

/// One file or directory moved and verified as an atomic step.
#[derive(Debug, Clone)]
pub struct TransferUnit {
    name: String,
    source: PathBuf,
    kind: UnitKind,
    size: u64,
    remote_path: String,
    status: UnitStatus,
    error: Option<String>,
    started_at: Option<Instant>,
    completed_at: Option<Instant>,
}

impl TransferUnit {
    /// Creates a pending unit.
    pub fn new(
        name: impl Into<String>,
        source: impl Into<PathBuf>,
        kind: UnitKind,
        size: u64,
        remote_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            kind,
            size,
            remote_path: remote_path.into(),
            status: UnitStatus::Pending,
            error: None,
            started_at: None,
            completed_at: None,
        }
    }

    /// Marks the unit as in progress.
    pub fn start(&mut self) {
        self.status = UnitStatus::InProgress;
        self.started_at = Some(Instant::now());
    }

    /// Marks the unit as verified on the remote side.
    pub fn verify(&mut self) {
        self.status = UnitStatus::Verified;
        self.completed_at = Some(Instant::now());
    }

    /// Marks the unit as failed with a reason.
    pub fn fail(&mut self, err: &str) {
        self.status = UnitStatus::Failed;
        self.error = Some(err.to_string());
        self.completed_at = Some(Instant::now());
    }

    /// Replaces the byte size once it is known (archives are sized after packaging).
    pub fn set_size(&mut self, size: u64) {
        self.size = size;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &PathBuf {
        &self.source
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    pub fn status(&self) -> UnitStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Time between `start` and the terminal state, if both happened.
    pub fn elapsed(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> TransferUnit {
        TransferUnit::new("b", "/tmp/b.zip", UnitKind::Archive, 0, "/srv/drop/b.zip")
    }

    #[test]
    fn starts_pending() {
        let u = unit();
        assert_eq!(u.status(), UnitStatus::Pending);
        assert!(u.elapsed().is_none());
    }

    #[test]
    fn lifecycle_to_verified() {
        let mut u = unit();
        u.start();
        assert_eq!(u.status(), UnitStatus::InProgress);
        u.set_size(40_960);
        u.verify();
        assert_eq!(u.status(), UnitStatus::Verified);
        assert_eq!(u.size(), 40_960);
        assert!(u.elapsed().is_some());
    }

    #[test]
    fn failure_keeps_reason() {
        let mut u = unit();
        u.start();
        u.fail("size mismatch");
        assert_eq!(u.status(), UnitStatus::Failed);
        assert_eq!(u.error(), Some("size mismatch"));
    }
}
