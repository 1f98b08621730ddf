//! SSH/SFTP client used to reach the upload destination.
//!
//! Password authentication only. Remote commands run on their own channel;
//! file transfers share one SFTP session per connection.

mod client;
mod config;
mod error;
mod exec;

pub use client::SshConnection;
pub use config::SshConfig;
pub use error::SshError;
pub use exec::CommandOutput;
pub use russh_sftp::client::fs::File as RemoteFile;
