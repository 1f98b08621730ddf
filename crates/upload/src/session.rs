//! Connection lifecycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use pushdeck_protocol::ConnectionCredentials;
use pushdeck_transfer::shell_quote;
use tracing::{debug, info, warn};

use crate::error::{TransportError, UploadError};
use crate::remote::{RemoteShell, SessionConnector};
use crate::types::ExecOutput;

/// Directories created per `mkdir -p` invocation.
const MKDIR_BATCH: usize = 64;

/// Owns one authenticated connection for the duration of a request.
///
/// [`dispose`](Self::dispose) must be awaited on every exit path. It is
/// idempotent and closes the transport exactly once.
pub struct ConnectionSession {
    shell: Box<dyn RemoteShell>,
    host: String,
    disposed: AtomicBool,
}

impl ConnectionSession {
    /// Establishes a session within `timeout`.
    pub async fn connect(
        connector: &dyn SessionConnector,
        credentials: &ConnectionCredentials,
        timeout: Duration,
    ) -> Result<Self, UploadError> {
        let shell = tokio::time::timeout(timeout, connector.connect(credentials))
            .await
            .map_err(|_| {
                UploadError::Connection(format!(
                    "{} did not respond within {}s",
                    credentials.address(),
                    timeout.as_secs()
                ))
            })?
            .map_err(|e| UploadError::Connection(e.to_string()))?;

        info!(host = %credentials.host, user = %credentials.username, "connection established");
        Ok(Self::from_shell(shell, credentials.host.clone()))
    }

    /// Wraps an already-connected transport.
    pub fn from_shell(shell: Box<dyn RemoteShell>, host: impl Into<String>) -> Self {
        Self {
            shell,
            host: host.into(),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn shell(&self) -> &dyn RemoteShell {
        self.shell.as_ref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Runs a remote command.
    pub async fn exec(&self, command: &str) -> Result<ExecOutput, TransportError> {
        self.shell.exec(command).await
    }

    /// Creates `path` and its parents on the remote host (`mkdir -p`).
    pub async fn ensure_remote_directory(&self, path: &str) -> Result<(), UploadError> {
        self.ensure_remote_directories(&[path.to_string()]).await
    }

    /// Creates several remote directories, batching them into as few
    /// commands as possible. Parents must precede children.
    pub async fn ensure_remote_directories(&self, paths: &[String]) -> Result<(), UploadError> {
        for batch in paths.chunks(MKDIR_BATCH) {
            let quoted: Vec<String> = batch.iter().map(|p| shell_quote(p)).collect();
            let command = format!("mkdir -p {}", quoted.join(" "));
            let first = batch.first().cloned().unwrap_or_default();

            let output = self
                .shell
                .exec(&command)
                .await
                .map_err(|e| UploadError::RemoteDirectory {
                    path: first.clone(),
                    message: e.to_string(),
                })?;

            if !output.success() {
                let stderr = output.stderr.trim();
                let message = match output.exit_code {
                    Some(code) if stderr.is_empty() => format!("mkdir exited with code {code}"),
                    Some(code) => format!("mkdir exited with code {code}: {stderr}"),
                    None => "mkdir reported no exit status".to_string(),
                };
                return Err(UploadError::RemoteDirectory {
                    path: first,
                    message,
                });
            }
            debug!(count = batch.len(), first = %first, "remote directories ensured");
        }
        Ok(())
    }

    /// Closes the connection. Only the first call reaches the transport.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        match self.shell.close().await {
            Ok(()) => info!(host = %self.host, "connection disposed"),
            Err(e) => warn!(host = %self.host, error = %e, "error while closing connection"),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl Drop for ConnectionSession {
    fn drop(&mut self) {
        if !self.is_disposed() {
            warn!(host = %self.host, "connection session dropped without dispose");
        }
    }
}
