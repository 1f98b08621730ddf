use std::fmt;

use serde::{Deserialize, Serialize};

/// Default SSH port.
pub const DEFAULT_SSH_PORT: u16 = 22;

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

/// Credentials for one remote-shell session.
///
/// Owned by the caller for the duration of a single request; never persisted
/// by the pipeline.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCredentials {
    pub host: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ConnectionCredentials {
    /// Creates credentials on the default port.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            port: DEFAULT_SSH_PORT,
        }
    }

    /// Returns `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Passwords must never end up in logs.
impl fmt::Debug for ConnectionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCredentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .finish()
    }
}

/// Lifecycle of a single transfer unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "verified")]
    Verified,
    #[serde(rename = "failed")]
    Failed,
}

/// Stage of the per-unit state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStage {
    Sizing,
    Compressing,
    Connecting,
    Transferring,
    Verifying,
    Cleanup,
    Done,
    Failed,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Sizing => "sizing",
            Self::Compressing => "compressing",
            Self::Connecting => "connecting",
            Self::Transferring => "transferring",
            Self::Verifying => "verifying",
            Self::Cleanup => "cleanup",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Cumulative upload progress as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub uploaded: u64,
    pub total: u64,
    pub percentage: u8,
}

impl ProgressEvent {
    /// Builds an event, deriving the clamped percentage from the byte counts.
    pub fn new(uploaded: u64, total: u64) -> Self {
        Self {
            uploaded,
            total,
            percentage: percentage(uploaded, total),
        }
    }

    /// The terminal event of a request: everything accounted for.
    pub fn complete(total: u64) -> Self {
        Self {
            uploaded: total,
            total,
            percentage: 100,
        }
    }
}

/// `min(100, round(uploaded / total * 100))`; a zero total reports 0.
pub fn percentage(uploaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (uploaded as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}
