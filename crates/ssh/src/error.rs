//! SSH error types.

use std::time::Duration;

/// Errors produced by the SSH/SFTP client.
#[derive(Debug, thiserror::Error)]
pub enum SshError {
    #[error("connection to {addr} failed: {message}")]
    Connect { addr: String, message: String },

    #[error("connection to {addr} timed out after {timeout:?}")]
    Timeout { addr: String, timeout: Duration },

    #[error("authentication failed for user {user}")]
    AuthenticationFailed { user: String },

    #[error("channel error: {0}")]
    Channel(String),

    #[error("SFTP error: {0}")]
    Sftp(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<russh::Error> for SshError {
    fn from(e: russh::Error) -> Self {
        SshError::Channel(e.to_string())
    }
}

impl From<russh_sftp::client::error::Error> for SshError {
    fn from(e: russh_sftp::client::error::Error) -> Self {
        SshError::Sftp(e.to_string())
    }
}
