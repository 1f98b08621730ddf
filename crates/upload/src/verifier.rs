use tracing::debug;

use crate::error::UploadError;
use crate::session::ConnectionSession;

/// Confirms a transferred artifact exists remotely with the expected size.
pub struct Verifier<'a> {
    session: &'a ConnectionSession,
}

impl<'a> Verifier<'a> {
    pub fn new(session: &'a ConnectionSession) -> Self {
        Self { session }
    }

    /// Stats `remote_path` and compares it with `local_size`.
    ///
    /// A zero-byte local source is accepted whatever the remote reports.
    /// Returns the remote size.
    pub async fn verify(&self, remote_path: &str, local_size: u64) -> Result<u64, UploadError> {
        let remote_size = self
            .session
            .shell()
            .stat_size(remote_path)
            .await
            .map_err(|e| UploadError::Verification {
                path: remote_path.to_string(),
                reason: format!("cannot confirm remote artifact: {e}"),
            })?
            .ok_or_else(|| UploadError::Verification {
                path: remote_path.to_string(),
                reason: "cannot confirm remote artifact".into(),
            })?;

        if local_size == 0 {
            debug!(remote = remote_path, remote_size, "zero-byte source, size check skipped");
            return Ok(remote_size);
        }

        if remote_size != local_size {
            return Err(UploadError::Verification {
                path: remote_path.to_string(),
                reason: format!("size mismatch: local {local_size} bytes, remote {remote_size} bytes"),
            });
        }

        debug!(remote = remote_path, bytes = remote_size, "remote artifact verified");
        Ok(remote_size)
    }
}
