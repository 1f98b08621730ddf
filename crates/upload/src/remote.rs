//! Transport traits.
//!
//! `RemoteShell` is implemented by the app on top of a concrete SSH/SFTP
//! client. Keeping the pipeline behind a trait decouples it from the
//! transport and makes it testable with in-memory mocks.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use pushdeck_protocol::ConnectionCredentials;
use tokio::io::AsyncWrite;

use crate::error::TransportError;
use crate::types::ExecOutput;

/// Boxed future returned by transport methods.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Writable remote file handle used by the fallback transfer.
pub type RemoteWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Step callback of the whole-file put: `(transferred, total)`.
pub type StepCallback<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// One authenticated remote-shell connection.
pub trait RemoteShell: Send + Sync {
    /// Runs a command and collects its output and exit status.
    fn exec<'a>(&'a self, command: &'a str) -> RemoteFuture<'a, ExecOutput>;

    /// High-throughput whole-file transfer reporting each step.
    fn fast_put<'a>(
        &'a self,
        local: &'a Path,
        remote: &'a str,
        step: StepCallback<'a>,
    ) -> RemoteFuture<'a, u64>;

    /// Plain whole-file transfer without progress.
    fn put_file<'a>(&'a self, local: &'a Path, remote: &'a str) -> RemoteFuture<'a, u64>;

    /// Creates or truncates `remote` and opens it for streaming writes.
    fn open_write<'a>(&'a self, remote: &'a str) -> RemoteFuture<'a, RemoteWriter>;

    /// Size of `remote`, or `None` if it does not exist.
    fn stat_size<'a>(&'a self, remote: &'a str) -> RemoteFuture<'a, Option<u64>>;

    /// Closes the connection.
    fn close(&self) -> RemoteFuture<'_, ()>;
}

/// Opens [`RemoteShell`] connections.
pub trait SessionConnector: Send + Sync {
    fn connect<'a>(
        &'a self,
        credentials: &'a ConnectionCredentials,
    ) -> RemoteFuture<'a, Box<dyn RemoteShell>>;
}
