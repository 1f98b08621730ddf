//! Adapter implementing the upload transport traits on top of
//! `pushdeck_ssh::SshConnection`.

use std::path::Path;

use pushdeck_protocol::ConnectionCredentials;
use pushdeck_ssh::{SshConfig, SshConnection, SshError};
use pushdeck_transfer::FAST_PUT_BUFFER_SIZE;
use pushdeck_upload::{
    ExecOutput, RemoteFuture, RemoteShell, RemoteWriter, SessionConnector, StepCallback,
    TransportError,
};

/// Read buffer of the plain put used for batch archives.
const PLAIN_PUT_BUFFER_SIZE: usize = 32 * 1024;

fn transport(e: SshError) -> TransportError {
    TransportError::new(e.to_string())
}

// ---------------------------------------------------------------------------
// Connector
// ---------------------------------------------------------------------------

/// Opens a fresh SSH connection per request.
pub struct SshConnector {
    config: SshConfig,
}

impl SshConnector {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }
}

impl SessionConnector for SshConnector {
    fn connect<'a>(
        &'a self,
        credentials: &'a ConnectionCredentials,
    ) -> RemoteFuture<'a, Box<dyn RemoteShell>> {
        Box::pin(async move {
            let conn = SshConnection::connect(credentials, &self.config)
                .await
                .map_err(transport)?;
            let shell: Box<dyn RemoteShell> = Box::new(SshShell { conn });
            Ok(shell)
        })
    }
}

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

struct SshShell {
    conn: SshConnection,
}

impl RemoteShell for SshShell {
    fn exec<'a>(&'a self, command: &'a str) -> RemoteFuture<'a, ExecOutput> {
        Box::pin(async move {
            let output = self.conn.exec(command).await.map_err(transport)?;
            Ok(ExecOutput {
                exit_code: output.exit_code,
                stdout: output.stdout_lossy(),
                stderr: output.stderr_lossy(),
            })
        })
    }

    fn fast_put<'a>(
        &'a self,
        local: &'a Path,
        remote: &'a str,
        step: StepCallback<'a>,
    ) -> RemoteFuture<'a, u64> {
        Box::pin(async move {
            self.conn
                .upload_file(local, remote, FAST_PUT_BUFFER_SIZE, |sent, total| {
                    step(sent, total)
                })
                .await
                .map_err(transport)
        })
    }

    fn put_file<'a>(&'a self, local: &'a Path, remote: &'a str) -> RemoteFuture<'a, u64> {
        Box::pin(async move {
            self.conn
                .upload_file(local, remote, PLAIN_PUT_BUFFER_SIZE, |_, _| {})
                .await
                .map_err(transport)
        })
    }

    fn open_write<'a>(&'a self, remote: &'a str) -> RemoteFuture<'a, RemoteWriter> {
        Box::pin(async move {
            let file = self.conn.create_writer(remote).await.map_err(transport)?;
            let writer: RemoteWriter = Box::new(file);
            Ok(writer)
        })
    }

    fn stat_size<'a>(&'a self, remote: &'a str) -> RemoteFuture<'a, Option<u64>> {
        Box::pin(async move { self.conn.file_size(remote).await.map_err(transport) })
    }

    fn close(&self) -> RemoteFuture<'_, ()> {
        Box::pin(async move { self.conn.disconnect().await.map_err(transport) })
    }
}
