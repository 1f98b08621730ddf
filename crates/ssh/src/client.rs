//! Password-authenticated SSH session with an SFTP subsystem.

use std::path::Path;
use std::sync::Arc;

use pushdeck_protocol::ConnectionCredentials;
use russh::client;
use russh_sftp::client::SftpSession;
use russh_sftp::client::fs::File as RemoteFile;
use russh_sftp::protocol::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::config::SshConfig;
use crate::error::SshError;
use crate::exec::{CommandOutput, OutputCollector};

/// Host-key policy handler.
struct SessionHandler {
    accept_unknown_host_keys: bool,
}

#[async_trait::async_trait]
impl client::Handler for SessionHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        if self.accept_unknown_host_keys {
            warn!("host key verification not implemented, accepting key");
            Ok(true)
        } else {
            warn!("rejecting unverifiable host key");
            Ok(false)
        }
    }
}

/// One authenticated SSH connection plus its SFTP session.
pub struct SshConnection {
    handle: client::Handle<SessionHandler>,
    sftp: SftpSession,
    addr: String,
}

impl SshConnection {
    /// Connects, authenticates with a password and opens SFTP.
    pub async fn connect(
        credentials: &ConnectionCredentials,
        config: &SshConfig,
    ) -> Result<Self, SshError> {
        let addr = credentials.address();
        info!(addr = %addr, user = %credentials.username, "connecting");

        let handler = SessionHandler {
            accept_unknown_host_keys: config.accept_unknown_host_keys,
        };
        let client_config = Arc::new(config.to_client_config());

        let mut handle = tokio::time::timeout(
            config.connect_timeout,
            client::connect(client_config, &addr, handler),
        )
        .await
        .map_err(|_| SshError::Timeout {
            addr: addr.clone(),
            timeout: config.connect_timeout,
        })?
        .map_err(|e| SshError::Connect {
            addr: addr.clone(),
            message: e.to_string(),
        })?;

        let authenticated = handle
            .authenticate_password(credentials.username.as_str(), credentials.password.as_str())
            .await
            .map_err(|e| SshError::Connect {
                addr: addr.clone(),
                message: e.to_string(),
            })?;
        if !authenticated {
            return Err(SshError::AuthenticationFailed {
                user: credentials.username.clone(),
            });
        }
        debug!(addr = %addr, "authenticated");

        let channel = handle.channel_open_session().await?;
        channel.request_subsystem(true, "sftp").await?;
        let sftp = SftpSession::new(channel.into_stream()).await?;

        info!(addr = %addr, "session established");
        Ok(Self { handle, sftp, addr })
    }

    /// `host:port` of the peer.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Runs `command` on a fresh channel and waits for it to close.
    pub async fn exec(&self, command: &str) -> Result<CommandOutput, SshError> {
        debug!(command, "exec");
        let mut channel = self.handle.channel_open_session().await?;
        channel.exec(true, command).await?;

        let mut collector = OutputCollector::default();
        while collector.push(channel.wait().await) {}
        let output = collector.finish();

        debug!(command, exit_code = ?output.exit_code, "exec finished");
        Ok(output)
    }

    /// Copies a local file to `remote` with a `buffer_size` read buffer.
    ///
    /// `step` is called after every write with `(transferred, total)`.
    pub async fn upload_file<F>(
        &self,
        local: &Path,
        remote: &str,
        buffer_size: usize,
        mut step: F,
    ) -> Result<u64, SshError>
    where
        F: FnMut(u64, u64) + Send,
    {
        let mut input = tokio::fs::File::open(local).await?;
        let total = input.metadata().await?.len();
        let mut output = self.sftp.create(remote).await?;

        let mut buf = vec![0u8; buffer_size.max(1)];
        let mut transferred: u64 = 0;
        loop {
            let n = input.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            output.write_all(&buf[..n]).await?;
            transferred += n as u64;
            step(transferred, total);
        }
        output.shutdown().await?;

        debug!(remote, bytes = transferred, "file uploaded");
        Ok(transferred)
    }

    /// Creates (or truncates) `remote` and returns a writable handle.
    pub async fn create_writer(&self, remote: &str) -> Result<RemoteFile, SshError> {
        Ok(self.sftp.create(remote).await?)
    }

    /// Size of `remote`, or `None` when it does not exist.
    pub async fn file_size(&self, remote: &str) -> Result<Option<u64>, SshError> {
        match self.sftp.metadata(remote).await {
            Ok(attrs) => Ok(Some(attrs.size.unwrap_or(0))),
            Err(russh_sftp::client::error::Error::Status(status))
                if status.status_code == StatusCode::NoSuchFile =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Disconnects; open channels, SFTP included, close with the session.
    pub async fn disconnect(&self) -> Result<(), SshError> {
        self.handle
            .disconnect(russh::Disconnect::ByApplication, "", "")
            .await?;
        info!(addr = %self.addr, "disconnected");
        Ok(())
    }
}
