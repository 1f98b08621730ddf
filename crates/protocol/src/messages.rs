use serde::{Deserialize, Serialize};

use crate::types::ConnectionCredentials;

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Uploads one local file or directory (`estimateAndUpload`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub local_path: String,
    pub remote_path: String,
    #[serde(flatten)]
    pub credentials: ConnectionCredentials,
}

/// Archives and uploads several directories (`uploadBatchArchived`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUploadRequest {
    pub folder_paths: Vec<String>,
    pub remote_path: String,
    #[serde(flatten)]
    pub credentials: ConnectionCredentials,
}

/// Request validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("at least one local path is required")]
    NoSources,

    #[error("local path must not be empty")]
    EmptySource,

    #[error("remote path must not be empty")]
    EmptyRemotePath,

    #[error("host must not be empty")]
    EmptyHost,
}

fn validate_common(
    remote_path: &str,
    credentials: &ConnectionCredentials,
) -> Result<(), RequestError> {
    if remote_path.trim().is_empty() {
        return Err(RequestError::EmptyRemotePath);
    }
    if credentials.host.trim().is_empty() {
        return Err(RequestError::EmptyHost);
    }
    Ok(())
}

impl UploadRequest {
    /// Checks the request invariants before any work starts.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.local_path.trim().is_empty() {
            return Err(RequestError::EmptySource);
        }
        validate_common(&self.remote_path, &self.credentials)
    }
}

impl BatchUploadRequest {
    /// Checks the request invariants before any work starts.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.folder_paths.is_empty() {
            return Err(RequestError::NoSources);
        }
        if self.folder_paths.iter().any(|p| p.trim().is_empty()) {
            return Err(RequestError::EmptySource);
        }
        validate_common(&self.remote_path, &self.credentials)
    }
}

// ---------------------------------------------------------------------------
// Responses and events
// ---------------------------------------------------------------------------

/// Final result of an upload request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub successful_units: Vec<String>,
}

impl UploadOutcome {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            successful_units: Vec::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            successful_units: Vec::new(),
        }
    }
}

/// A batch unit failed; the batch continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitErrorEvent {
    pub unit: String,
    pub message: String,
}
